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

//! # mqlink Error Handling
//!
//! Unified error types shared by every mqlink crate.
//!
//! Errors fall into two groups:
//! - [`ConfigurationError`]: invalid or contradictory settings, or a capability the runtime does
//!   not provide. These are raised while provisioning a connection factory and are fatal to
//!   application startup.
//! - [`ConnectionError`]: misuse of connections, sessions and pools after provisioning.
//!
//! ### Usage
//!
//! ```rust
//! use mqlink_error::MqLinkError;
//! use mqlink_error::MqLinkResult;
//!
//! fn resolve_broker_url(url: Option<&str>) -> MqLinkResult<&str> {
//!     url.ok_or(MqLinkError::config_missing("brokerUrl"))
//! }
//! # assert!(resolve_broker_url(None).is_err());
//! ```

pub mod unified;

pub use unified::ConfigurationError;
pub use unified::ConnectionError;
pub use unified::MqLinkError;
pub use unified::MqLinkResult;
