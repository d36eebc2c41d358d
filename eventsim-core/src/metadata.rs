//! Per-session parameters drawn once when a session starts.

use std::ops::RangeInclusive;
use std::time::Duration;

use eventsim_config::ModelConfig;
use serde::{Deserialize, Serialize};

use crate::event::SessionKind;
use crate::rand_pool::RandomPool;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub kind: SessionKind,
    pub network_delay_ms: u64,
    pub event_count: u64,
    pub avg_event_interval_ms: u64,
    pub event_interval_stddev_ms: u64,
    /// Only ever true for mobile sessions with at least one event.
    pub buffered: bool,
    /// 1-based index of the first withheld event; 0 when not buffered.
    pub buffer_start_index: u64,
    pub buffered_event_count: u64,
}

/// What the session does with event `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sleep the network delay, then publish.
    Immediate,
    /// Withhold until the end of the buffered range.
    Hold,
    /// Last index of the buffered range: release everything withheld.
    Flush,
}

impl SessionMetadata {
    /// Draws a session's parameters in a fixed order so the same pool always
    /// yields the same metadata.
    pub fn derive(model: &ModelConfig, pool: &mut RandomPool) -> Self {
        let kind = if pool.chance(model.mobile_ratio) {
            SessionKind::Mobile
        } else {
            SessionKind::Desktop
        };

        let network_delay_ms = match model.avg_network_delay_ms {
            0 => 0,
            avg => 1 + pool.next_int(avg),
        };

        let event_count = model.min_events_per_session + pool.next_int(model.max_events_per_session);

        let buffered =
            kind == SessionKind::Mobile && pool.chance(model.buffered_ratio) && event_count > 0;

        let (buffer_start_index, buffered_event_count) = if buffered {
            let start = 1 + (event_count as f64 * pool.next_uniform()) as u64;
            let start = start.min(event_count);
            let remaining = event_count - start + 1;
            (start, 1 + pool.next_int(remaining))
        } else {
            (0, 0)
        };

        Self {
            kind,
            network_delay_ms,
            event_count,
            avg_event_interval_ms: model.avg_event_interval_ms,
            event_interval_stddev_ms: model.event_interval_stddev_ms,
            buffered,
            buffer_start_index,
            buffered_event_count,
        }
    }

    /// Indices withheld while the client is offline, the last one included.
    pub fn buffer_range(&self) -> Option<RangeInclusive<u64>> {
        if !self.buffered || self.buffered_event_count == 0 {
            return None;
        }
        let last = self.buffer_start_index + self.buffered_event_count - 1;
        Some(self.buffer_start_index..=last)
    }

    pub fn delivery(&self, event_index: u64) -> Delivery {
        match self.buffer_range() {
            Some(range) if event_index == *range.end() => Delivery::Flush,
            Some(range) if range.contains(&event_index) => Delivery::Hold,
            _ => Delivery::Immediate,
        }
    }

    pub fn network_delay(&self) -> Duration {
        Duration::from_millis(self.network_delay_ms)
    }

    /// Think-time for one normal draw: `round(normal * stddev) + avg`,
    /// clamped at zero.
    pub fn think_time(&self, normal: f64) -> Duration {
        let ms = (normal * self.event_interval_stddev_ms as f64).round()
            + self.avg_event_interval_ms as f64;
        Duration::from_millis(ms.max(0.0) as u64)
    }
}
