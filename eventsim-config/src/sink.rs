//! Publish sink selection.
//!
//! The concrete sink is built by `eventsim-sink`; this only carries what the
//! operator asked for.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// JSON lines on standard output.
    #[default]
    Stdout,
    /// JSON lines on standard error.
    Stderr,
    /// JSON lines appended to `path`.
    File,
    /// Messages are only traced at debug level.
    Log,
    /// Kafka producer (requires the `kafka` feature of `eventsim-sink`).
    Kafka,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SinkConfig {
    pub kind: SinkKind,

    /// Bootstrap broker address.
    #[validate(length(min = 1))]
    pub broker: String,

    /// Destination topic.
    #[validate(length(min = 1))]
    pub topic: String,

    /// Output file for [`SinkKind::File`].
    pub path: Option<String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Stdout,
            broker: "localhost:9092".into(),
            topic: "test_sessions".into(),
            path: None,
        }
    }
}
