//! Two-phase session scheduling.
//!
//! [`Scheduler::prepare`] walks every session in ordinal order on one thread
//! and fills its random pool from the seeded generator. [`Scheduler::run`]
//! then hands the prepared jobs to a fixed set of workers. All randomness is
//! consumed in the first phase, so interleaving in the second can reorder
//! output but never changes what a session does.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use eventsim_config::SimulationConfig;
use eventsim_core::rand_pool::RandomPool;
use eventsim_core::session::{Session, SessionOutcome};
use eventsim_core::sink::PublishSink;
use eventsim_telemetry::MetricsRecorder;

use crate::summary::RunSummary;

/// A session that is ready to run.
#[derive(Debug, Clone)]
pub struct Job {
    pub ordinal: u64,
    pub start_delay: Duration,
    pub pool: RandomPool,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

#[derive(Debug, Default)]
struct WorkerReport {
    outcomes: Vec<SessionOutcome>,
    failed: Vec<u64>,
}

pub struct Scheduler {
    config: Arc<SimulationConfig>,
    sink: Arc<dyn PublishSink>,
    metrics: MetricsRecorder,
}

impl Scheduler {
    pub fn new(
        config: SimulationConfig,
        sink: Arc<dyn PublishSink>,
        metrics: MetricsRecorder,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sink,
            metrics,
        }
    }

    /// Builds one job per session from the configured seed.
    pub fn prepare(config: &SimulationConfig) -> Vec<Job> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        (0..config.sessions as u64)
            .map(|ordinal| {
                let start_delay = match config.session_start_jitter_ms {
                    0 => Duration::ZERO,
                    jitter => Duration::from_millis(rng.random_range(0..jitter)),
                };
                let pool = RandomPool::for_model(&mut rng, &config.model);
                Job {
                    ordinal,
                    start_delay,
                    pool,
                }
            })
            .collect()
    }

    /// Runs `jobs` on the configured number of workers and waits for all of
    /// them. A panicking session is counted and does not stop its worker.
    #[instrument(level = "info", skip_all, fields(workers = self.config.workers, sessions = jobs.len()))]
    pub async fn run(&self, jobs: Vec<Job>) -> RunSummary {
        let started = Instant::now();
        let sessions = jobs.len();
        let (tx, rx) = mpsc::channel::<Job>(self.config.workers);
        let queue: JobQueue = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for id in 0..self.config.workers {
            workers.spawn(worker(
                id,
                queue.clone(),
                self.config.clone(),
                self.sink.clone(),
                self.metrics.clone(),
            ));
        }

        for job in jobs {
            if tx.send(job).await.is_err() {
                error!("all workers exited before the queue was drained");
                break;
            }
        }
        drop(tx);

        let mut summary = RunSummary {
            sessions,
            ..RunSummary::default()
        };
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => {
                    summary.outcomes.extend(report.outcomes);
                    summary.failed_sessions.extend(report.failed);
                }
                Err(err) => {
                    error!(%err, "worker task failed");
                    summary.workers_failed += 1;
                }
            }
        }

        if let Err(err) = self.sink.flush().await {
            warn!(%err, "sink flush failed");
        }

        summary.elapsed = started.elapsed();
        info!(
            completed = summary.sessions_completed(),
            failed = summary.failed_sessions.len(),
            "done"
        );
        summary
    }
}

async fn worker(
    id: usize,
    queue: JobQueue,
    config: Arc<SimulationConfig>,
    sink: Arc<dyn PublishSink>,
    metrics: MetricsRecorder,
) -> WorkerReport {
    let mut report = WorkerReport::default();

    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else { break };
        let ordinal = job.ordinal;

        if !job.start_delay.is_zero() {
            tokio::time::sleep(job.start_delay).await;
        }

        let started = Instant::now();
        let config = config.clone();
        let sink = sink.clone();
        let task = tokio::spawn(async move {
            Session::start(job.ordinal, &config.model, job.pool)
                .run(sink.as_ref())
                .await
        });

        match task.await {
            Ok(outcome) => {
                record(&metrics, &outcome, started.elapsed());
                report.outcomes.push(outcome);
            }
            Err(err) => {
                error!(worker = id, ordinal, %err, "session aborted");
                metrics.sessions_failed.inc();
                report.failed.push(ordinal);
            }
        }
    }

    debug!(worker = id, "queue closed, worker exiting");
    report
}

fn record(metrics: &MetricsRecorder, outcome: &SessionOutcome, elapsed: Duration) {
    metrics.sessions_completed.inc();
    metrics.events_published.inc_by(outcome.published);
    metrics.publish_failures.inc_by(outcome.failed);
    metrics.events_dropped.inc_by(outcome.dropped);
    metrics.events_buffered.inc_by(outcome.buffered);
    metrics.pool_wraps.inc_by(outcome.pool_wraps);
    metrics.session_duration.observe(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use eventsim_config::ModelConfig;
    use eventsim_core::sink::{MemorySink, SinkError};

    use crate::plan::plan_sessions;

    fn config(sessions: usize, workers: usize, model: ModelConfig) -> SimulationConfig {
        SimulationConfig {
            workers,
            sessions,
            session_start_jitter_ms: 0,
            seed: 1234,
            model,
            ..SimulationConfig::default()
        }
    }

    fn quick_model() -> ModelConfig {
        ModelConfig {
            max_events_per_session: 1,
            min_events_per_session: 1,
            avg_event_interval_ms: 100,
            event_interval_stddev_ms: 0,
            avg_network_delay_ms: 0,
            mobile_ratio: 0.0,
            ..ModelConfig::default()
        }
    }

    fn scheduler(config: &SimulationConfig, sink: Arc<dyn PublishSink>) -> Scheduler {
        Scheduler::new(config.clone(), sink, MetricsRecorder::new().unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn single_session_publishes_every_event_in_order() {
        let model = ModelConfig {
            max_events_per_session: 1,
            min_events_per_session: 3,
            mobile_ratio: 0.0,
            ..ModelConfig::default()
        };
        let config = config(1, 1, model);
        let sink = Arc::new(MemorySink::new());

        let summary = scheduler(&config, sink.clone())
            .run(Scheduler::prepare(&config))
            .await;

        assert!(summary.ensure_complete().is_ok());
        let indices: Vec<u64> = sink.events().iter().map(|e| e.event_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn many_sessions_across_workers_are_all_accounted_for() {
        let config = config(50, 5, ModelConfig::default());
        let sink = Arc::new(MemorySink::new());

        let summary = scheduler(&config, sink.clone())
            .run(Scheduler::prepare(&config))
            .await;

        assert!(summary.ensure_complete().is_ok());
        assert_eq!(summary.sessions_completed(), 50);

        let expected: u64 = summary.outcomes.iter().map(|o| o.metadata.event_count).sum();
        assert_eq!(summary.events_published(), expected);
        assert_eq!(sink.len() as u64, expected);

        let ids: HashSet<_> = summary.outcomes.iter().map(|o| o.session_id).collect();
        assert_eq!(ids.len(), 50);

        let mut per_session: HashMap<_, Vec<u64>> = HashMap::new();
        for event in sink.events() {
            per_session
                .entry(event.session_id)
                .or_default()
                .push(event.event_index);
        }
        for outcome in &summary.outcomes {
            let seen = per_session.remove(&outcome.session_id).unwrap_or_default();
            let want: Vec<u64> = (1..=outcome.metadata.event_count).collect();
            assert_eq!(seen, want);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn worker_count_bounds_concurrency() {
        let config = config(4, 2, quick_model());
        let sink = Arc::new(MemorySink::new());
        let origin = tokio::time::Instant::now();

        scheduler(&config, sink.clone())
            .run(Scheduler::prepare(&config))
            .await;

        let mut offsets: Vec<u128> = sink
            .published()
            .iter()
            .map(|p| (p.at - origin).as_millis())
            .collect();
        offsets.sort_unstable();
        assert_eq!(offsets, vec![0, 0, 100, 100]);
        assert!(origin.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn start_jitter_staggers_sessions() {
        let config = SimulationConfig {
            session_start_jitter_ms: 1000,
            ..config(3, 3, quick_model())
        };
        let jobs = Scheduler::prepare(&config);
        let mut delays: Vec<u128> = jobs.iter().map(|j| j.start_delay.as_millis()).collect();
        delays.sort_unstable();

        let sink = Arc::new(MemorySink::new());
        let origin = tokio::time::Instant::now();
        scheduler(&config, sink.clone()).run(jobs).await;

        let mut offsets: Vec<u128> = sink
            .published()
            .iter()
            .map(|p| (p.at - origin).as_millis())
            .collect();
        offsets.sort_unstable();
        assert_eq!(offsets, delays);
    }

    struct PanicsOnFirstPublish {
        calls: AtomicUsize,
        inner: MemorySink,
    }

    #[async_trait]
    impl PublishSink for PanicsOnFirstPublish {
        async fn publish(&self, payload: Bytes) -> Result<(), SinkError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("sink exploded");
            }
            self.inner.publish(payload).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_session_does_not_stop_the_worker() {
        let config = config(3, 1, quick_model());
        let sink = Arc::new(PanicsOnFirstPublish {
            calls: AtomicUsize::new(0),
            inner: MemorySink::new(),
        });
        let metrics = MetricsRecorder::new().unwrap();

        let summary = Scheduler::new(config.clone(), sink.clone(), metrics.clone())
            .run(Scheduler::prepare(&config))
            .await;

        assert_eq!(summary.failed_sessions, vec![0]);
        assert_eq!(summary.sessions_completed(), 2);
        assert_eq!(sink.inner.len(), 2);
        assert_eq!(metrics.sessions_failed.get(), 1);
        assert_eq!(metrics.sessions_completed.get(), 2);
        assert!(summary.ensure_complete().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_sessions_is_an_empty_run() {
        let config = config(0, 3, ModelConfig::default());
        let sink = Arc::new(MemorySink::new());

        let summary = scheduler(&config, sink.clone())
            .run(Scheduler::prepare(&config))
            .await;

        assert!(summary.ensure_complete().is_ok());
        assert!(sink.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_runs_reproduce_the_planned_sessions() {
        let config = SimulationConfig {
            seed: 9,
            session_start_jitter_ms: 500,
            ..config(50, 5, ModelConfig::default())
        };

        let mut runs = Vec::new();
        for _ in 0..2 {
            let summary = scheduler(&config, Arc::new(MemorySink::new()))
                .run(Scheduler::prepare(&config))
                .await;
            let mut outcomes = summary.outcomes;
            outcomes.sort_by_key(|o| o.ordinal);
            runs.push(
                outcomes
                    .into_iter()
                    .map(|o| (o.ordinal, o.metadata))
                    .collect::<Vec<_>>(),
            );
        }
        let planned: Vec<_> = plan_sessions(&config)
            .into_iter()
            .map(|p| (p.ordinal, p.metadata))
            .collect();

        assert_eq!(runs[0].len(), 50);
        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[0], planned);
    }

    #[test]
    fn prepare_is_deterministic() {
        let config = config(20, 4, ModelConfig::default());
        let first = Scheduler::prepare(&config);
        let second = Scheduler::prepare(&config);
        assert_eq!(first.len(), 20);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.ordinal, b.ordinal);
            assert_eq!(a.start_delay, b.start_delay);
        }
    }
}
