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

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Connection pool settings, read from the `pool` table.
///
/// All timeouts are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolProperties {
    /// Provision a pooled connection factory instead of a caching or plain one.
    pub enabled: bool,

    /// Block when a connection has no free session slot instead of failing.
    #[serde(alias = "blockIfFull")]
    pub block_if_full: bool,

    /// How long to block when full, `-1` blocks forever.
    #[serde(alias = "blockIfFullTimeout")]
    pub block_if_full_timeout: i64,

    /// Open one connection when the pool is created.
    #[serde(alias = "createConnectionOnStartup")]
    pub create_connection_on_startup: bool,

    /// Maximum connection lifetime, `0` disables expiry.
    #[serde(alias = "expiryTimeout")]
    pub expiry_timeout: u64,

    /// Unused connections idle longer than this are closed, `0` disables it.
    #[serde(alias = "idleTimeout")]
    pub idle_timeout: u64,

    #[serde(alias = "maxConnections")]
    pub max_connections: usize,

    #[serde(alias = "maximumActiveSessionPerConnection")]
    pub maximum_active_session_per_connection: usize,

    /// Evict connections that reported a failure.
    #[serde(alias = "reconnectOnException")]
    pub reconnect_on_exception: bool,

    /// Period of the background eviction run, values `<= 0` disable it.
    #[serde(alias = "timeBetweenExpirationCheck")]
    pub time_between_expiration_check: i64,

    /// Share a single anonymous producer per pooled session.
    #[serde(alias = "useAnonymousProducers")]
    pub use_anonymous_producers: bool,
}

impl Default for PoolProperties {
    fn default() -> Self {
        PoolProperties {
            enabled: false,
            block_if_full: true,
            block_if_full_timeout: -1,
            create_connection_on_startup: true,
            expiry_timeout: 0,
            idle_timeout: Duration::from_secs(30).as_millis() as u64,
            max_connections: 1,
            maximum_active_session_per_connection: 500,
            reconnect_on_exception: true,
            time_between_expiration_check: -1,
            use_anonymous_producers: true,
        }
    }
}

impl PoolProperties {
    /// Blocking timeout, `None` when blocking forever.
    pub fn block_if_full_timeout(&self) -> Option<Duration> {
        u64::try_from(self.block_if_full_timeout).ok().map(Duration::from_millis)
    }

    /// Idle timeout, `None` when disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout > 0).then(|| Duration::from_millis(self.idle_timeout))
    }

    /// Expiry timeout, `None` when disabled.
    pub fn expiry_timeout(&self) -> Option<Duration> {
        (self.expiry_timeout > 0).then(|| Duration::from_millis(self.expiry_timeout))
    }

    /// Background eviction period, `None` when disabled.
    pub fn time_between_expiration_check(&self) -> Option<Duration> {
        u64::try_from(self.time_between_expiration_check)
            .ok()
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }
}
