//! Sink that only traces what it would have sent.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use eventsim_core::sink::{PublishSink, SinkError};

#[derive(Debug, Clone)]
pub struct LogSink {
    topic: String,
}

impl LogSink {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl PublishSink for LogSink {
    async fn publish(&self, payload: Bytes) -> Result<(), SinkError> {
        debug!(
            topic = %self.topic,
            message = %String::from_utf8_lossy(&payload),
            "sending message"
        );
        Ok(())
    }
}
