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

//! Configuration errors raised while loading properties or provisioning a factory

use thiserror::Error;

/// Configuration errors
///
/// Every variant names the offending configuration key so that startup failures
/// can be traced back to a single setting.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Required configuration missing
    #[error("Required configuration '{key}' is missing")]
    Missing { key: &'static str },

    /// Invalid configuration value
    #[error("Invalid configuration for '{key}': value='{value}', reason={reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// Configuration source could not be read or deserialized
    #[error("Configuration parse error for '{key}': {reason}")]
    ParseFailed { key: &'static str, reason: String },

    /// A setting asks for a capability this runtime was built without
    #[error("Configuration '{key}' requires '{capability}', which is not available in this runtime")]
    CapabilityUnavailable {
        capability: &'static str,
        key: &'static str,
    },
}

impl ConfigurationError {
    /// The configuration key this error refers to
    pub fn key(&self) -> &'static str {
        match self {
            Self::Missing { key }
            | Self::InvalidValue { key, .. }
            | Self::ParseFailed { key, .. }
            | Self::CapabilityUnavailable { key, .. } => *key,
        }
    }
}

#[cfg(feature = "with_config")]
impl From<config::ConfigError> for ConfigurationError {
    fn from(e: config::ConfigError) -> Self {
        Self::ParseFailed {
            key: "unknown",
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_of_every_variant() {
        assert_eq!(ConfigurationError::Missing { key: "brokerUrl" }.key(), "brokerUrl");
        assert_eq!(
            ConfigurationError::CapabilityUnavailable {
                capability: "pooled-connection-factory",
                key: "pool.enabled",
            }
            .key(),
            "pool.enabled"
        );
        assert_eq!(
            ConfigurationError::ParseFailed {
                key: "unknown",
                reason: "eof".to_string(),
            }
            .key(),
            "unknown"
        );
    }

    #[test]
    fn test_capability_unavailable_message() {
        let err = ConfigurationError::CapabilityUnavailable {
            capability: "pooled-connection-factory",
            key: "pool.enabled",
        };
        assert_eq!(
            err.to_string(),
            "Configuration 'pool.enabled' requires 'pooled-connection-factory', which is not available in this \
             runtime"
        );
    }
}
