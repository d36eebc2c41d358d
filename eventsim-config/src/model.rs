//! Session generation model.
//!
//! Parameters that shape every simulated session: how many events it emits,
//! how long clients think between events, how slow their network is and how
//! often a mobile client drops offline and buffers.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// Width of the event-count range: a session emits
    /// `[minEventsPerSession, minEventsPerSession + maxEventsPerSession)` events.
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_events_per_session: u64,

    /// Lower bound of events per session.
    pub min_events_per_session: u64,

    /// Mean think-time between two events of a session.
    pub avg_event_interval_ms: u64,

    /// Standard deviation of the think-time.
    pub event_interval_stddev_ms: u64,

    /// Upper bound of the simulated per-session network latency.
    pub avg_network_delay_ms: u64,

    /// Probability that a session is a mobile client.
    #[validate(range(min = 0.0, max = 1.0, message = "must be a probability"))]
    pub mobile_ratio: f64,

    /// Probability that a mobile session goes offline and buffers events.
    #[validate(range(min = 0.0, max = 1.0, message = "must be a probability"))]
    pub buffered_ratio: f64,

    /// Pause before a buffered burst is released.
    pub reconnect_delay_ms: u64,

    /// Probability that an event payload carries a non-zero error value.
    #[validate(range(min = 0.0, max = 1.0, message = "must be a probability"))]
    pub error_ratio: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_events_per_session: 50,
            min_events_per_session: 5,
            avg_event_interval_ms: 5000,
            event_interval_stddev_ms: 5000,
            avg_network_delay_ms: 10,
            mobile_ratio: 0.75,
            buffered_ratio: 0.1,
            reconnect_delay_ms: 0,
            error_ratio: 0.05,
        }
    }
}

impl ModelConfig {
    /// Largest event count any session can draw.
    pub fn event_count_ceiling(&self) -> u64 {
        self.min_events_per_session
            .saturating_add(self.max_events_per_session)
            .saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_width_event_range() {
        let model = ModelConfig {
            max_events_per_session: 0,
            ..ModelConfig::default()
        };
        let errors = model.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("max_events_per_session"));
    }

    #[test]
    fn rejects_ratio_above_one() {
        let model = ModelConfig {
            mobile_ratio: 1.5,
            ..ModelConfig::default()
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn max_below_min_is_a_valid_width() {
        let model = ModelConfig {
            min_events_per_session: 3,
            max_events_per_session: 1,
            ..ModelConfig::default()
        };
        assert!(model.validate().is_ok());
        assert_eq!(model.event_count_ceiling(), 3);
    }
}
