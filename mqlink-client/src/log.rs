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

use std::str::FromStr;

/// Initializes the logger.
///
/// Reads the log level from the `RUST_LOG` environment variable, defaulting to `INFO` when it is
/// unset or not a plain level name. Output includes thread names, thread ids, levels and line
/// numbers.
pub fn init_logger() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| tracing::Level::from_str(level.as_str()).ok())
        .unwrap_or(tracing::Level::INFO);
    init_subscriber(level);
}

pub fn init_logger_with_level(level: Level) {
    init_subscriber(level.as_tracing_level());
}

fn init_subscriber(level: tracing::Level) {
    // A subscriber installed earlier (tests, embedding applications) wins.
    let _ = tracing_subscriber::fmt()
        .with_thread_names(true)
        .with_level(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_max_level(level)
        .try_init();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Level(&'static str);

impl Level {
    pub const ERROR: Level = Level("ERROR");

    pub const WARN: Level = Level("WARN");

    pub const INFO: Level = Level("INFO");

    pub const DEBUG: Level = Level("DEBUG");

    pub const TRACE: Level = Level("TRACE");

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    fn as_tracing_level(&self) -> tracing::Level {
        match self.0 {
            "ERROR" => tracing::Level::ERROR,
            "WARN" => tracing::Level::WARN,
            "DEBUG" => tracing::Level::DEBUG,
            "TRACE" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(level: &str) -> Result<Self, Self::Err> {
        match level.to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Level::ERROR),
            "WARN" => Ok(Level::WARN),
            "INFO" => Ok(Level::INFO),
            "DEBUG" => Ok(Level::DEBUG),
            "TRACE" => Ok(Level::TRACE),
            _ => Err(format!("Invalid log level: {level}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_from_str_is_case_insensitive() {
        assert_eq!("debug".parse::<Level>().unwrap(), Level::DEBUG);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::WARN);
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn level_maps_to_tracing_level() {
        assert_eq!(Level::ERROR.as_tracing_level(), tracing::Level::ERROR);
        assert_eq!(Level::TRACE.as_tracing_level(), tracing::Level::TRACE);
        assert_eq!(Level::INFO.as_str(), "INFO");
    }
}
