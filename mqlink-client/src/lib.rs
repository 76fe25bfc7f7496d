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

//! Connection-factory provisioning for message broker clients.
//!
//! Given [`ConnectionProperties`] and an ordered list of
//! [`ConnectionFactoryCustomizer`](factory::ConnectionFactoryCustomizer)s, the
//! [`ConnectionFactoryProvisioner`] builds exactly one connection factory:
//!
//! - a [`PooledConnectionFactory`](factory::PooledConnectionFactory) when `pool.enabled` is set,
//! - a [`CachingConnectionFactory`](factory::CachingConnectionFactory) when `cache.enabled` is
//!   set (the default),
//! - the plain [`BrokerConnectionFactory`](factory::BrokerConnectionFactory) otherwise.
//!
//! ```no_run
//! use mqlink_client::ConnectionFactory;
//! use mqlink_client::ConnectionFactoryProvisioner;
//! use mqlink_client::ConnectionProperties;
//!
//! # fn main() -> mqlink_error::MqLinkResult<()> {
//! let properties = ConnectionProperties::builder()
//!     .broker_url("tcp://localhost:61616")
//!     .build()?;
//! let factory = ConnectionFactoryProvisioner::new().provision(&properties, &[])?;
//! let connection = factory.create_connection()?;
//! connection.close();
//! factory.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod factory;
pub mod lifecycle;
pub mod log;
pub mod properties;
pub mod provisioner;

pub use connection::AcknowledgeMode;
pub use connection::Connection;
pub use connection::Destination;
pub use connection::Session;
pub use factory::ArcConnectionFactoryCustomizer;
pub use factory::ConnectionFactory;
pub use properties::ConnectionProperties;
pub use provisioner::ConnectionFactoryHandle;
pub use provisioner::ConnectionFactoryKind;
pub use provisioner::ConnectionFactoryProvisioner;
pub use provisioner::PoolingCapability;
