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

use cheetah_string::CheetahString;

use super::destination::Destination;

/// Producer handle bound to a destination.
///
/// Anonymous producers share one id across destinations; the destination is carried per handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageProducer {
    id: CheetahString,
    destination: Destination,
    anonymous: bool,
}

impl MessageProducer {
    pub(crate) fn new(id: CheetahString, destination: Destination, anonymous: bool) -> Self {
        Self {
            id,
            destination,
            anonymous,
        }
    }

    #[inline]
    pub fn id(&self) -> &CheetahString {
        &self.id
    }

    #[inline]
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageConsumer {
    id: CheetahString,
    destination: Destination,
}

impl MessageConsumer {
    pub(crate) fn new(id: CheetahString, destination: Destination) -> Self {
        Self { id, destination }
    }

    #[inline]
    pub fn id(&self) -> &CheetahString {
        &self.id
    }

    #[inline]
    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}
