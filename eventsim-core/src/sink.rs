//! ## eventsim-core::sink
//! **Publish contract between sessions and the message broker**
//!
//! A single sink handle is shared by every worker, so implementations must
//! accept concurrent `publish` calls. Sessions treat each call as
//! fire-and-forget: a failure is logged and counted, never retried.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;

use crate::event::Event;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink rejected message: {0}")]
    Rejected(String),

    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait PublishSink: Send + Sync {
    /// Hands one serialized event to the broker.
    async fn publish(&self, payload: Bytes) -> Result<(), SinkError>;

    /// Waits for outstanding deliveries. Called once after all workers finish.
    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A message as the in-memory sink saw it.
#[derive(Debug, Clone)]
pub struct Published {
    /// Runtime clock at publish time (virtual under a paused test runtime).
    pub at: Instant,
    pub payload: Bytes,
}

impl Published {
    pub fn event(&self) -> Result<Event, serde_json::Error> {
        Event::from_slice(&self.payload)
    }
}

/// Records every publish; used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    published: Mutex<Vec<Published>>,
    reject: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records each attempt and then fails it.
    pub fn rejecting() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.published.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.lock().is_empty()
    }

    /// Decodes everything received so far, skipping anything that is not an event.
    pub fn events(&self) -> Vec<Event> {
        self.published
            .lock()
            .iter()
            .filter_map(|p| p.event().ok())
            .collect()
    }
}

#[async_trait]
impl PublishSink for MemorySink {
    async fn publish(&self, payload: Bytes) -> Result<(), SinkError> {
        self.published.lock().push(Published {
            at: Instant::now(),
            payload,
        });
        if self.reject {
            return Err(SinkError::Rejected("memory sink is rejecting".into()));
        }
        Ok(())
    }
}
