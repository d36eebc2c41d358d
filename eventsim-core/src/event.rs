//! Event records emitted by a session.

use std::fmt;

use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rand_pool::RandomPool;

/// Client class of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Desktop,
    Mobile,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Desktop => f.write_str("desktop"),
            SessionKind::Mobile => f.write_str("mobile"),
        }
    }
}

/// Synthetic measurement carried by every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Main reading, in `10..=99`.
    pub value: u32,
    /// Zero unless the event carries an error, then about a tenth of `value`.
    pub error: u32,
}

impl Payload {
    pub const MIN_VALUE: u32 = 10;
    pub const VALUE_SPAN: u64 = 90;
    const ERROR_DIVISOR: u32 = 10;

    /// Always consumes exactly two uniform draws.
    pub fn synthesize(pool: &mut RandomPool, error_ratio: f64) -> Self {
        let value = Self::MIN_VALUE + pool.next_int(Self::VALUE_SPAN) as u32;
        let error = if pool.chance(error_ratio) {
            value.div_ceil(Self::ERROR_DIVISOR)
        } else {
            0
        };
        Self { value, error }
    }
}

/// One record on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub session_id: Uuid,
    /// Ordinal of the session that produced the event.
    pub client_id: u64,
    /// 1-based position within the session.
    pub event_index: u64,
    /// Capture time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Capture time, RFC 3339.
    pub timestring: String,
    /// Send time, milliseconds since the Unix epoch; set when published.
    pub sent_timestamp: Option<i64>,
    pub kind: SessionKind,
    pub payload: Payload,
}

impl Event {
    /// Stamps the capture time.
    pub fn capture(
        session_id: Uuid,
        client_id: u64,
        event_index: u64,
        kind: SessionKind,
        payload: Payload,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            client_id,
            event_index,
            timestamp: now.timestamp_millis(),
            timestring: now.to_rfc3339(),
            sent_timestamp: None,
            kind,
            payload,
        }
    }

    pub fn mark_sent(&mut self) {
        self.sent_timestamp = Some(Utc::now().timestamp_millis());
    }

    pub fn to_bytes(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
