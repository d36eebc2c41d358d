use std::fmt;
use std::time::Duration;

use eventsim_core::session::SessionOutcome;

use crate::error::EngineError;

/// What a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Sessions requested.
    pub sessions: usize,
    /// Hex digest of the session plans.
    pub digest: String,
    /// One entry per session that ran to completion, in completion order.
    pub outcomes: Vec<SessionOutcome>,
    /// Ordinals of sessions whose task panicked.
    pub failed_sessions: Vec<u64>,
    /// Worker tasks that did not exit cleanly.
    pub workers_failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn sessions_completed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn events_published(&self) -> u64 {
        self.outcomes.iter().map(|o| o.published).sum()
    }

    pub fn publish_failures(&self) -> u64 {
        self.outcomes.iter().map(|o| o.failed).sum()
    }

    pub fn events_dropped(&self) -> u64 {
        self.outcomes.iter().map(|o| o.dropped).sum()
    }

    pub fn events_buffered(&self) -> u64 {
        self.outcomes.iter().map(|o| o.buffered).sum()
    }

    pub fn pool_wraps(&self) -> u64 {
        self.outcomes.iter().map(|o| o.pool_wraps).sum()
    }

    /// Errors unless every requested session completed.
    pub fn ensure_complete(&self) -> Result<(), EngineError> {
        let failed = self.sessions.saturating_sub(self.sessions_completed());
        if failed == 0 && self.workers_failed == 0 {
            Ok(())
        } else {
            Err(EngineError::Incomplete {
                failed,
                total: self.sessions,
            })
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} sessions, {} published, {} publish failures, {} dropped, {} buffered in {:.3}s",
            self.sessions_completed(),
            self.sessions,
            self.events_published(),
            self.publish_failures(),
            self.events_dropped(),
            self.events_buffered(),
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sessions_make_the_run_incomplete() {
        let summary = RunSummary {
            sessions: 3,
            failed_sessions: vec![1],
            ..RunSummary::default()
        };
        assert!(matches!(
            summary.ensure_complete(),
            Err(EngineError::Incomplete {
                failed: 3,
                total: 3
            })
        ));
    }

    #[test]
    fn empty_run_is_complete() {
        assert!(RunSummary::default().ensure_complete().is_ok());
    }
}
