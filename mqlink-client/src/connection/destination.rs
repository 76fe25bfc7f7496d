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

use std::fmt;

use cheetah_string::CheetahString;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    Queue(CheetahString),
    Topic(CheetahString),
}

impl Destination {
    pub fn queue(name: impl Into<CheetahString>) -> Self {
        Destination::Queue(name.into())
    }

    pub fn topic(name: impl Into<CheetahString>) -> Self {
        Destination::Topic(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Destination::Queue(name) | Destination::Topic(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Queue(name) => write!(f, "queue://{name}"),
            Destination::Topic(name) => write!(f, "topic://{name}"),
        }
    }
}

/// How a session acknowledges consumed messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AcknowledgeMode {
    #[default]
    Auto,
    Client,
    DupsOk,
    Transacted,
}

impl AcknowledgeMode {
    pub fn is_transacted(&self) -> bool {
        matches!(self, AcknowledgeMode::Transacted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_display() {
        assert_eq!(Destination::queue("orders").to_string(), "queue://orders");
        assert_eq!(Destination::topic("prices").to_string(), "topic://prices");
        assert_eq!(Destination::topic("prices").name(), "prices");
        assert_ne!(Destination::queue("a"), Destination::topic("a"));
    }
}
