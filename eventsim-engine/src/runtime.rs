//! Entry points shared by every frontend.

use std::sync::Arc;

use tracing::{error, info, instrument};

use eventsim_config::SimulationConfig;
use eventsim_core::sink::PublishSink;
use eventsim_telemetry::MetricsRecorder;

use crate::error::EngineError;
use crate::plan::{plan_digest, plan_jobs};
use crate::scheduler::Scheduler;
use crate::summary::RunSummary;

/// Prepares and runs a whole simulation.
///
/// When `validate_digest` is given, the plan digest is checked before any
/// session starts and a mismatch aborts the run.
#[instrument(level = "info", name = "run_simulation", skip_all, fields(seed = config.seed))]
pub async fn run_simulation(
    config: SimulationConfig,
    sink: Arc<dyn PublishSink>,
    metrics: MetricsRecorder,
    validate_digest: Option<&str>,
) -> Result<RunSummary, EngineError> {
    let jobs = Scheduler::prepare(&config);
    let digest = plan_digest(&plan_jobs(&jobs, &config));
    info!(sessions = jobs.len(), %digest, "session plans prepared");

    if let Some(expected) = validate_digest {
        if !expected.eq_ignore_ascii_case(&digest) {
            error!(expected, actual = %digest, "plan digest mismatch");
            return Err(EngineError::DigestMismatch {
                expected: expected.to_owned(),
                actual: digest,
            });
        }
    }

    let mut summary = Scheduler::new(config, sink, metrics).run(jobs).await;
    summary.digest = digest;
    info!(%summary, "simulation complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan_sessions;
    use eventsim_config::ModelConfig;
    use eventsim_core::sink::MemorySink;

    fn config() -> SimulationConfig {
        SimulationConfig {
            workers: 2,
            sessions: 4,
            session_start_jitter_ms: 0,
            seed: 99,
            model: ModelConfig {
                min_events_per_session: 2,
                max_events_per_session: 3,
                ..ModelConfig::default()
            },
            ..SimulationConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_the_plan_digest() {
        let config = config();
        let expected = plan_digest(&plan_sessions(&config));
        let summary = run_simulation(
            config,
            Arc::new(MemorySink::new()),
            MetricsRecorder::new().unwrap(),
            Some(&expected),
        )
        .await
        .unwrap();
        assert_eq!(summary.digest, expected);
        assert_eq!(summary.sessions_completed(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn digest_mismatch_publishes_nothing() {
        let sink = Arc::new(MemorySink::new());
        let result = run_simulation(
            config(),
            sink.clone(),
            MetricsRecorder::new().unwrap(),
            Some("00"),
        )
        .await;
        assert!(matches!(result, Err(EngineError::DigestMismatch { .. })));
        assert!(sink.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn metrics_track_the_summary() {
        let metrics = MetricsRecorder::new().unwrap();
        let summary = run_simulation(
            config(),
            Arc::new(MemorySink::new()),
            metrics.clone(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(metrics.sessions_completed.get(), 4);
        assert_eq!(metrics.events_published.get(), summary.events_published());
        assert_eq!(metrics.events_buffered.get(), summary.events_buffered());
    }
}
