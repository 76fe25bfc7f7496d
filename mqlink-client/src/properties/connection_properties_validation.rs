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

//! Connection properties validation module
//!
//! Validation runs before any factory is built, so a bad setting fails provisioning with the
//! offending key and value instead of surfacing later as a connection error.

use mqlink_error::MqLinkError;
use mqlink_error::MqLinkResult;

use super::CacheProperties;
use super::ConnectionProperties;
use super::PoolProperties;
use crate::factory::broker_url::BrokerUrl;

/// Validator for [`ConnectionProperties`] fields
pub struct ConnectionPropertiesValidator;

impl ConnectionPropertiesValidator {
    /// Minimum cached sessions per acknowledge mode
    pub const MIN_SESSION_CACHE_SIZE: usize = 1;

    /// Minimum pooled connections
    pub const MIN_MAX_CONNECTIONS: usize = 1;

    /// Minimum active sessions per pooled connection
    pub const MIN_ACTIVE_SESSIONS_PER_CONNECTION: usize = 1;

    /// Validates every field and returns the resolved broker URL.
    pub fn validate(properties: &ConnectionProperties) -> MqLinkResult<BrokerUrl> {
        let broker_url = Self::validate_broker_url(properties)?;
        Self::validate_credentials(properties)?;
        Self::validate_cache(&properties.cache)?;
        Self::validate_pool(&properties.pool)?;
        Ok(broker_url)
    }

    /// Requires a well-formed broker URL, or `in_memory` when none is configured.
    pub fn validate_broker_url(properties: &ConnectionProperties) -> MqLinkResult<BrokerUrl> {
        match properties.resolved_broker_url() {
            Some(url) => url.parse::<BrokerUrl>(),
            None => Err(MqLinkError::config_missing("brokerUrl")),
        }
    }

    pub fn validate_credentials(properties: &ConnectionProperties) -> MqLinkResult<()> {
        if properties.password.is_some() && properties.user.is_none() {
            return Err(MqLinkError::config_invalid_value(
                "password",
                "******",
                "a password requires 'user' to be set",
            ));
        }
        if let Some(user) = properties.user.as_deref() {
            if user.trim().is_empty() {
                return Err(MqLinkError::config_invalid_value("user", user, "must not be blank"));
            }
        }
        Ok(())
    }

    pub fn validate_cache(cache: &CacheProperties) -> MqLinkResult<()> {
        if cache.session_cache_size < Self::MIN_SESSION_CACHE_SIZE {
            return Err(MqLinkError::config_invalid_value(
                "cache.sessionCacheSize",
                cache.session_cache_size,
                format!("must be at least {}", Self::MIN_SESSION_CACHE_SIZE),
            ));
        }
        Ok(())
    }

    pub fn validate_pool(pool: &PoolProperties) -> MqLinkResult<()> {
        if pool.max_connections < Self::MIN_MAX_CONNECTIONS {
            return Err(MqLinkError::config_invalid_value(
                "pool.maxConnections",
                pool.max_connections,
                format!("must be at least {}", Self::MIN_MAX_CONNECTIONS),
            ));
        }
        if pool.maximum_active_session_per_connection < Self::MIN_ACTIVE_SESSIONS_PER_CONNECTION {
            return Err(MqLinkError::config_invalid_value(
                "pool.maximumActiveSessionPerConnection",
                pool.maximum_active_session_per_connection,
                format!("must be at least {}", Self::MIN_ACTIVE_SESSIONS_PER_CONNECTION),
            ));
        }
        if pool.block_if_full_timeout < -1 {
            return Err(MqLinkError::config_invalid_value(
                "pool.blockIfFullTimeout",
                pool.block_if_full_timeout,
                "must be -1 (wait forever) or a non-negative number of milliseconds",
            ));
        }
        Ok(())
    }
}
