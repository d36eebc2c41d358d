//! Logging configuration.
//!
//! Consumed by `eventsim-telemetry` when the global subscriber is installed.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where log lines are written.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Default level filter (`trace`, `debug`, `info`, `warn`, `error`).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// `stdout`, `stderr` or a file path. Defaults to `stderr` so logs stay
    /// out of a stdout event stream.
    pub file: String,

    /// Line format.
    pub format: LogFormat,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: "stderr".into(),
            format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_default_to_stderr() {
        assert_eq!(LoggingConfig::default().file, "stderr");
    }
}
