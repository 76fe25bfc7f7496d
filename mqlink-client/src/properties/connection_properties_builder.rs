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

//! ConnectionProperties builder module
//!
//! Fluent construction of [`ConnectionProperties`], validated on `build()`.

use cheetah_string::CheetahString;
use mqlink_error::MqLinkResult;

use super::ConnectionProperties;
use super::ConnectionPropertiesValidator;

/// Builder for creating [`ConnectionProperties`] instances with a fluent API
///
/// # Example
///
/// ```rust
/// use mqlink_client::properties::ConnectionProperties;
///
/// let properties = ConnectionProperties::builder()
///     .broker_url("tcp://localhost:61616")
///     .cache_enabled(true)
///     .session_cache_size(5)
///     .build()
///     .unwrap();
/// assert_eq!(properties.cache.session_cache_size, 5);
/// ```
pub struct ConnectionPropertiesBuilder {
    properties: ConnectionProperties,
}

impl Default for ConnectionPropertiesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionPropertiesBuilder {
    /// Creates a new builder with default properties
    pub fn new() -> Self {
        Self {
            properties: ConnectionProperties::default(),
        }
    }

    // ========================================================================
    // Broker connection
    // ========================================================================

    pub fn broker_url(mut self, url: impl Into<CheetahString>) -> Self {
        self.properties.broker_url = Some(url.into());
        self
    }

    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.properties.in_memory = in_memory;
        self
    }

    pub fn credentials(mut self, user: impl Into<CheetahString>, password: impl Into<CheetahString>) -> Self {
        self.properties.user = Some(user.into());
        self.properties.password = Some(password.into());
        self
    }

    pub fn user(mut self, user: impl Into<CheetahString>) -> Self {
        self.properties.user = Some(user.into());
        self
    }

    /// Sets the close timeout in milliseconds
    pub fn close_timeout(mut self, millis: u64) -> Self {
        self.properties.close_timeout = millis;
        self
    }

    /// Sets the send timeout in milliseconds
    pub fn send_timeout(mut self, millis: u64) -> Self {
        self.properties.send_timeout = millis;
        self
    }

    pub fn non_blocking_redelivery(mut self, enabled: bool) -> Self {
        self.properties.non_blocking_redelivery = enabled;
        self
    }

    pub fn trust_all_packages(mut self, trust_all: bool) -> Self {
        self.properties.packages.trust_all = Some(trust_all);
        self
    }

    pub fn trusted_package(mut self, package: impl Into<CheetahString>) -> Self {
        self.properties.packages.trusted.push(package.into());
        self
    }

    // ========================================================================
    // Pool
    // ========================================================================

    pub fn pool_enabled(mut self, enabled: bool) -> Self {
        self.properties.pool.enabled = enabled;
        self
    }

    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.properties.pool.max_connections = max_connections;
        self
    }

    pub fn maximum_active_session_per_connection(mut self, max_sessions: usize) -> Self {
        self.properties.pool.maximum_active_session_per_connection = max_sessions;
        self
    }

    /// Sets blocking behaviour when a pooled connection is full; `timeout_millis` of `-1`
    /// blocks forever
    pub fn block_if_full(mut self, block: bool, timeout_millis: i64) -> Self {
        self.properties.pool.block_if_full = block;
        self.properties.pool.block_if_full_timeout = timeout_millis;
        self
    }

    /// Sets the pool idle timeout in milliseconds
    pub fn idle_timeout(mut self, millis: u64) -> Self {
        self.properties.pool.idle_timeout = millis;
        self
    }

    /// Sets the pool expiry timeout in milliseconds
    pub fn expiry_timeout(mut self, millis: u64) -> Self {
        self.properties.pool.expiry_timeout = millis;
        self
    }

    /// Sets the background eviction period in milliseconds
    pub fn time_between_expiration_check(mut self, millis: i64) -> Self {
        self.properties.pool.time_between_expiration_check = millis;
        self
    }

    pub fn create_connection_on_startup(mut self, enabled: bool) -> Self {
        self.properties.pool.create_connection_on_startup = enabled;
        self
    }

    pub fn reconnect_on_exception(mut self, enabled: bool) -> Self {
        self.properties.pool.reconnect_on_exception = enabled;
        self
    }

    pub fn use_anonymous_producers(mut self, enabled: bool) -> Self {
        self.properties.pool.use_anonymous_producers = enabled;
        self
    }

    // ========================================================================
    // Cache
    // ========================================================================

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.properties.cache.enabled = enabled;
        self
    }

    pub fn cache_consumers(mut self, enabled: bool) -> Self {
        self.properties.cache.consumers = enabled;
        self
    }

    pub fn cache_producers(mut self, enabled: bool) -> Self {
        self.properties.cache.producers = enabled;
        self
    }

    pub fn session_cache_size(mut self, size: usize) -> Self {
        self.properties.cache.session_cache_size = size;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Builds the properties, validating all fields
    pub fn build(self) -> MqLinkResult<ConnectionProperties> {
        ConnectionPropertiesValidator::validate(&self.properties)?;
        Ok(self.properties)
    }

    /// Builds the properties without validation
    pub fn build_unvalidated(self) -> ConnectionProperties {
        self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let properties = ConnectionProperties::builder()
            .broker_url("tcp://localhost:61616")
            .credentials("admin", "admin")
            .build()
            .unwrap();

        assert_eq!(properties.broker_url.as_deref(), Some("tcp://localhost:61616"));
        assert_eq!(properties.user.as_deref(), Some("admin"));
        assert!(properties.cache.enabled);
    }

    #[test]
    fn test_builder_with_pool_options() {
        let properties = ConnectionProperties::builder()
            .broker_url("tcp://localhost:61616")
            .pool_enabled(true)
            .max_connections(8)
            .maximum_active_session_per_connection(16)
            .block_if_full(false, 0)
            .idle_timeout(5_000)
            .expiry_timeout(60_000)
            .use_anonymous_producers(false)
            .build()
            .unwrap();

        assert!(properties.pool.enabled);
        assert_eq!(properties.pool.max_connections, 8);
        assert_eq!(properties.pool.maximum_active_session_per_connection, 16);
        assert!(!properties.pool.block_if_full);
        assert_eq!(properties.pool.idle_timeout, 5_000);
        assert_eq!(properties.pool.expiry_timeout, 60_000);
        assert!(!properties.pool.use_anonymous_producers);
    }

    #[test]
    fn test_builder_validation_missing_url() {
        let result = ConnectionProperties::builder().session_cache_size(5).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_validation_invalid_session_cache_size() {
        let result = ConnectionProperties::builder()
            .broker_url("tcp://localhost:61616")
            .session_cache_size(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_unvalidated() {
        let properties = ConnectionProperties::builder().session_cache_size(0).build_unvalidated();
        assert_eq!(properties.cache.session_cache_size, 0);
        assert_eq!(properties.broker_url, None);
    }
}
