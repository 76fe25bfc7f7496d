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

pub mod broker_connection_factory;
pub mod broker_url;
pub mod caching_connection_factory;
pub mod customizer;
pub mod pooled_connection_factory;

use mqlink_error::MqLinkResult;

pub use self::broker_connection_factory::BrokerConnectionFactory;
pub use self::broker_connection_factory::BrokerConnectionFactoryBuilder;
pub use self::broker_url::BrokerUrl;
pub use self::caching_connection_factory::CachingConnectionFactory;
pub use self::customizer::ArcConnectionFactoryCustomizer;
pub use self::customizer::ConnectionFactoryCustomizer;
pub use self::pooled_connection_factory::PooledConnectionFactory;
use crate::connection::Connection;

/// Source of broker connections.
///
/// Implementations are shared across threads for the lifetime of the application.
pub trait ConnectionFactory: Send + Sync {
    /// Creates a connection handle. No network I/O happens here; the transport is
    /// established lazily.
    fn create_connection(&self) -> MqLinkResult<Connection>;
}
