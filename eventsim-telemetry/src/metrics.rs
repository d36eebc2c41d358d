//! ## eventsim-telemetry::metrics
//! **Prometheus counters for a simulation run**
//!
//! Every recorder owns its registry, so independent runs (and tests) never
//! collide on metric names.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub sessions_completed: IntCounter,
    pub sessions_failed: IntCounter,
    pub events_published: IntCounter,
    pub publish_failures: IntCounter,
    pub events_dropped: IntCounter,
    pub events_buffered: IntCounter,
    pub pool_wraps: IntCounter,
    pub session_duration: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let sessions_completed = IntCounter::new(
            "eventsim_sessions_completed_total",
            "Sessions that ran to their final event",
        )?;
        let sessions_failed = IntCounter::new(
            "eventsim_sessions_failed_total",
            "Sessions whose task panicked or was cancelled",
        )?;
        let events_published = IntCounter::new(
            "eventsim_events_published_total",
            "Events accepted by the sink",
        )?;
        let publish_failures = IntCounter::new(
            "eventsim_publish_failures_total",
            "Events the sink rejected",
        )?;
        let events_dropped = IntCounter::new(
            "eventsim_events_dropped_total",
            "Events that could not be serialized",
        )?;
        let events_buffered = IntCounter::new(
            "eventsim_events_buffered_total",
            "Events withheld while a mobile session was offline",
        )?;
        let pool_wraps = IntCounter::new(
            "eventsim_pool_wraps_total",
            "Times a random pool was exhausted and restarted from the beginning",
        )?;
        let session_duration = Histogram::with_opts(
            HistogramOpts::new(
                "eventsim_session_duration_seconds",
                "Wall time from session start to completion",
            )
            .buckets(vec![0.1, 1.0, 10.0, 60.0, 300.0, 1800.0]),
        )?;

        registry.register(Box::new(sessions_completed.clone()))?;
        registry.register(Box::new(sessions_failed.clone()))?;
        registry.register(Box::new(events_published.clone()))?;
        registry.register(Box::new(publish_failures.clone()))?;
        registry.register(Box::new(events_dropped.clone()))?;
        registry.register(Box::new(events_buffered.clone()))?;
        registry.register(Box::new(pool_wraps.clone()))?;
        registry.register(Box::new(session_duration.clone()))?;

        Ok(Self {
            registry,
            sessions_completed,
            sessions_failed,
            events_published,
            publish_failures,
            events_dropped,
            events_buffered,
            pool_wraps,
            session_duration,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}
