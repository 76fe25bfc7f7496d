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
use std::path::Path;
use std::time::Duration;

use cheetah_string::CheetahString;
use config::Config;
use config::FileFormat;
use mqlink_error::MqLinkResult;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::connection_properties_builder::ConnectionPropertiesBuilder;
use super::CacheProperties;
use super::PoolProperties;

/// Broker connection settings.
///
/// Loaded once at startup and treated as immutable afterwards. Keys are snake_case, camelCase
/// aliases are accepted (`brokerUrl`, `cache.sessionCacheSize`, ...). Timeouts are in
/// milliseconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionProperties {
    /// Broker address, e.g. `tcp://localhost:61616`.
    #[serde(alias = "brokerUrl")]
    pub broker_url: Option<CheetahString>,

    /// Use the embedded in-memory broker when no URL is set.
    #[serde(alias = "inMemory")]
    pub in_memory: bool,

    pub user: Option<CheetahString>,

    pub password: Option<CheetahString>,

    #[serde(alias = "closeTimeout")]
    pub close_timeout: u64,

    /// Redeliver rolled back messages without stopping the consumer.
    #[serde(alias = "nonBlockingRedelivery")]
    pub non_blocking_redelivery: bool,

    /// `0` waits forever.
    #[serde(alias = "sendTimeout")]
    pub send_timeout: u64,

    pub packages: PackagesProperties,

    pub pool: PoolProperties,

    pub cache: CacheProperties,
}

/// Object-message payload packages that may be deserialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagesProperties {
    /// Unset leaves the factory default untouched.
    #[serde(alias = "trustAll")]
    pub trust_all: Option<bool>,

    pub trusted: Vec<CheetahString>,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        ConnectionProperties {
            broker_url: None,
            in_memory: false,
            user: None,
            password: None,
            close_timeout: Duration::from_secs(15).as_millis() as u64,
            non_blocking_redelivery: false,
            send_timeout: 0,
            packages: PackagesProperties::default(),
            pool: PoolProperties::default(),
            cache: CacheProperties::default(),
        }
    }
}

impl ConnectionProperties {
    /// Address of the embedded broker used by `in_memory`.
    pub const EMBEDDED_BROKER_URL: &'static str = "vm://localhost?broker.persistent=false";

    /// Creates a builder for fluent, validated construction.
    pub fn builder() -> ConnectionPropertiesBuilder {
        ConnectionPropertiesBuilder::new()
    }

    /// Loads properties from a file. The format follows the file extension (toml, yaml, json,
    /// ini, ...). Keys that are absent keep their defaults. No validation is performed here.
    pub fn from_file(path: impl AsRef<Path>) -> MqLinkResult<Self> {
        let path = path.as_ref();
        let cfg = Config::builder().add_source(config::File::from(path)).build()?;
        let properties = cfg.try_deserialize::<ConnectionProperties>()?;
        debug!("connection properties loaded from {}: {:?}", path.display(), properties);
        Ok(properties)
    }

    /// Loads properties from TOML text.
    pub fn from_toml_str(content: &str) -> MqLinkResult<Self> {
        let cfg = Config::builder()
            .add_source(config::File::from_str(content, FileFormat::Toml))
            .build()?;
        Ok(cfg.try_deserialize::<ConnectionProperties>()?)
    }

    /// The broker URL to connect to: the configured one, else the embedded broker when
    /// `in_memory` is set.
    pub fn resolved_broker_url(&self) -> Option<&str> {
        match &self.broker_url {
            Some(url) => Some(url.as_str()),
            None if self.in_memory => Some(Self::EMBEDDED_BROKER_URL),
            None => None,
        }
    }
}

impl fmt::Debug for ConnectionProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProperties")
            .field("broker_url", &self.broker_url)
            .field("in_memory", &self.in_memory)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "******"))
            .field("close_timeout", &self.close_timeout)
            .field("non_blocking_redelivery", &self.non_blocking_redelivery)
            .field("send_timeout", &self.send_timeout)
            .field("packages", &self.packages)
            .field("pool", &self.pool)
            .field("cache", &self.cache)
            .finish()
    }
}
