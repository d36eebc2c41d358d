//! Seed-determined session plans and their digest.
//!
//! A plan is everything about a run that the seed fixes: start delays and
//! each session's metadata. Hashing it gives a short fingerprint that can be
//! compared across runs and machines.

use blake3::Hasher;
use serde::Serialize;

use eventsim_config::SimulationConfig;
use eventsim_core::event::SessionKind;
use eventsim_core::metadata::SessionMetadata;

use crate::scheduler::{Job, Scheduler};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlan {
    pub ordinal: u64,
    pub start_delay_ms: u64,
    pub metadata: SessionMetadata,
}

/// Derives the plan of every session without running any of them.
pub fn plan_sessions(config: &SimulationConfig) -> Vec<SessionPlan> {
    plan_jobs(&Scheduler::prepare(config), config)
}

/// Derives plans from prepared jobs, leaving their pools untouched.
pub fn plan_jobs(jobs: &[Job], config: &SimulationConfig) -> Vec<SessionPlan> {
    jobs.iter()
        .map(|job| {
            let mut pool = job.pool.clone();
            SessionPlan {
                ordinal: job.ordinal,
                start_delay_ms: job.start_delay.as_millis() as u64,
                metadata: SessionMetadata::derive(&config.model, &mut pool),
            }
        })
        .collect()
}

/// BLAKE3 over the plan, hex encoded.
pub fn plan_digest(plans: &[SessionPlan]) -> String {
    let mut hasher = Hasher::new();
    for plan in plans {
        let m = &plan.metadata;
        hasher.update(&plan.ordinal.to_le_bytes());
        hasher.update(&plan.start_delay_ms.to_le_bytes());
        hasher.update(&[match m.kind {
            SessionKind::Desktop => 0,
            SessionKind::Mobile => 1,
        }]);
        hasher.update(&m.network_delay_ms.to_le_bytes());
        hasher.update(&m.event_count.to_le_bytes());
        hasher.update(&m.avg_event_interval_ms.to_le_bytes());
        hasher.update(&m.event_interval_stddev_ms.to_le_bytes());
        hasher.update(&[m.buffered as u8]);
        hasher.update(&m.buffer_start_index.to_le_bytes());
        hasher.update(&m.buffered_event_count.to_le_bytes());
    }
    hex::encode(hasher.finalize().as_bytes())
}
