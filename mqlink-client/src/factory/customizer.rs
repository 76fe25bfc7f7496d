// Copyright 2023 The mqlink Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use super::BrokerConnectionFactory;

/// Callback that adjusts the broker connection factory before it is wrapped.
///
/// Customizers run in registration order, after the factory has been configured from
/// properties. Nothing arbitrates between them: when two customizers set the same attribute,
/// the later one wins.
///
/// Any `Fn(&mut BrokerConnectionFactory) + Send + Sync` closure is a customizer.
pub trait ConnectionFactoryCustomizer: Send + Sync {
    fn customize(&self, factory: &mut BrokerConnectionFactory);
}

impl<F> ConnectionFactoryCustomizer for F
where
    F: Fn(&mut BrokerConnectionFactory) + Send + Sync,
{
    fn customize(&self, factory: &mut BrokerConnectionFactory) {
        self(factory)
    }
}

pub type ArcConnectionFactoryCustomizer = Arc<dyn ConnectionFactoryCustomizer + 'static>;
