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

//! Connection-related errors for mqlink operations

use thiserror::Error;

/// Connection, session and pool errors
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Connection was already closed
    #[error("Connection closed: {id}")]
    Closed { id: String },

    /// Session was already closed
    #[error("Session closed: {id}")]
    SessionClosed { id: String },

    /// The pooled factory has been stopped
    #[error("Pooled connection factory has been stopped")]
    PoolStopped,

    /// No session slot became available on a pooled connection
    #[error("Pool exhausted: {max_sessions} active sessions per connection, waited {timeout_ms}ms")]
    PoolExhausted { max_sessions: usize, timeout_ms: u64 },
}

impl ConnectionError {
    /// Create a connection closed error
    #[inline]
    pub fn closed(id: impl Into<String>) -> Self {
        Self::Closed { id: id.into() }
    }

    /// Create a session closed error
    #[inline]
    pub fn session_closed(id: impl Into<String>) -> Self {
        Self::SessionClosed { id: id.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_creation() {
        let err = ConnectionError::closed("conn-1");
        assert_eq!(err.to_string(), "Connection closed: conn-1");

        let err = ConnectionError::PoolExhausted {
            max_sessions: 500,
            timeout_ms: 0,
        };
        assert!(err.to_string().contains("500 active sessions"));
    }
}
