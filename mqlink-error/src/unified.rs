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

//! Unified error system for mqlink.
//!
//! Every fallible mqlink operation returns [`MqLinkResult`]. The top-level
//! [`MqLinkError`] wraps one error category per concern and converts from each
//! of them through `From`, so `?` works across module boundaries.

mod configuration;
mod connection;

pub use configuration::ConfigurationError;
pub use connection::ConnectionError;
use thiserror::Error;

/// Main error type for all mqlink operations
///
/// # Examples
///
/// ```rust
/// use mqlink_error::MqLinkError;
/// use mqlink_error::MqLinkResult;
///
/// fn check_session_cache_size(size: usize) -> MqLinkResult<()> {
///     if size == 0 {
///         return Err(MqLinkError::config_invalid_value(
///             "cache.sessionCacheSize",
///             size,
///             "must be at least 1",
///         ));
///     }
///     Ok(())
/// }
/// # assert!(check_session_cache_size(0).is_err());
/// ```
#[derive(Debug, Error)]
pub enum MqLinkError {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Invalid, missing or unsupported configuration
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    // ============================================================================
    // Connection Errors
    // ============================================================================
    /// Connection, session and pool usage errors
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl MqLinkError {
    /// Create a missing configuration error
    #[inline]
    pub fn config_missing(key: &'static str) -> Self {
        Self::Configuration(ConfigurationError::Missing { key })
    }

    /// Create an invalid configuration value error
    #[inline]
    pub fn config_invalid_value(key: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::InvalidValue {
            key,
            value: value.to_string(),
            reason: reason.into(),
        })
    }

    /// Create a capability unavailable error
    #[inline]
    pub fn capability_unavailable(capability: &'static str, key: &'static str) -> Self {
        Self::Configuration(ConfigurationError::CapabilityUnavailable { capability, key })
    }

    /// Returns `true` for errors raised while validating or loading configuration
    #[inline]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// The configuration key this error refers to, if any
    pub fn config_key(&self) -> Option<&'static str> {
        match self {
            Self::Configuration(e) => Some(e.key()),
            Self::Connection(_) => None,
        }
    }
}

#[cfg(feature = "with_config")]
impl From<config::ConfigError> for MqLinkError {
    fn from(e: config::ConfigError) -> Self {
        Self::Configuration(ConfigurationError::from(e))
    }
}

/// Result type alias for mqlink operations
pub type MqLinkResult<T> = std::result::Result<T, MqLinkError>;
