//! ## eventsim-core::session
//! **One simulated client, from first to last event**
//!
//! `Start -> Running(i) -> Complete`. Each iteration emits event `i`, draws
//! its think-time and then, depending on the buffered range, publishes it
//! after the network delay, withholds it, or releases the withheld burst.
//! Publish failures are counted and the loop carries on; a session always
//! emits exactly `event_count` events.

use std::time::Duration;

use eventsim_config::ModelConfig;
use tokio::time::sleep;
use tracing::{debug, error, instrument, trace, warn};
use uuid::Uuid;

use crate::buffer::SessionBuffer;
use crate::event::{Event, Payload};
use crate::metadata::{Delivery, SessionMetadata};
use crate::rand_pool::RandomPool;
use crate::sink::PublishSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Start,
    Running(u64),
    Complete,
}

/// What a finished session reports back to the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub ordinal: u64,
    pub session_id: Uuid,
    pub metadata: SessionMetadata,
    /// Index of the last emitted event; equals `metadata.event_count`.
    pub last_event_index: u64,
    pub published: u64,
    pub failed: u64,
    pub dropped: u64,
    pub buffered: u64,
    pub pool_wraps: u64,
}

pub struct Session {
    ordinal: u64,
    id: Uuid,
    metadata: SessionMetadata,
    pool: RandomPool,
    error_ratio: f64,
    reconnect_delay: Duration,
    state: SessionState,
    event_index: u64,
}

impl Session {
    /// Enters `Start`: draws the metadata from `pool` and allocates an id.
    pub fn start(ordinal: u64, model: &ModelConfig, mut pool: RandomPool) -> Self {
        let metadata = SessionMetadata::derive(model, &mut pool);
        Self::with_metadata(ordinal, model, metadata, pool)
    }

    /// Enters `Start` with metadata chosen by the caller.
    pub fn with_metadata(
        ordinal: u64,
        model: &ModelConfig,
        metadata: SessionMetadata,
        pool: RandomPool,
    ) -> Self {
        Self {
            ordinal,
            id: Uuid::new_v4(),
            metadata,
            pool,
            error_ratio: model.error_ratio,
            reconnect_delay: Duration::from_millis(model.reconnect_delay_ms),
            state: SessionState::Start,
            event_index: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Captures the next event.
    pub fn emit(&mut self) -> Event {
        self.event_index += 1;
        self.state = SessionState::Running(self.event_index);
        let payload = Payload::synthesize(&mut self.pool, self.error_ratio);
        Event::capture(
            self.id,
            self.ordinal,
            self.event_index,
            self.metadata.kind,
            payload,
        )
    }

    /// Draws the pause that follows the current event.
    pub fn think_time(&mut self) -> Duration {
        let normal = self.pool.next_normal();
        self.metadata.think_time(normal)
    }

    /// Runs every event of the session against `sink`.
    #[instrument(skip_all, fields(ordinal = self.ordinal, session_id = %self.id))]
    pub async fn run(mut self, sink: &dyn PublishSink) -> SessionOutcome {
        debug!(metadata = ?self.metadata, "session start");

        let mut buffer = SessionBuffer::new();
        let mut outcome = SessionOutcome {
            ordinal: self.ordinal,
            session_id: self.id,
            metadata: self.metadata.clone(),
            last_event_index: 0,
            published: 0,
            failed: 0,
            dropped: 0,
            buffered: 0,
            pool_wraps: 0,
        };

        while self.event_index < self.metadata.event_count {
            let event = self.emit();
            let think_time = self.think_time();

            match self.metadata.delivery(event.event_index) {
                Delivery::Hold => {
                    trace!(event_index = event.event_index, "offline, holding event");
                    buffer.hold(event);
                    outcome.buffered += 1;
                }
                Delivery::Flush => {
                    buffer.hold(event);
                    outcome.buffered += 1;
                    pause(self.reconnect_delay).await;
                    let burst = buffer.release(&self.id);
                    debug!(events = burst.len(), "reconnected, flushing buffer");
                    for held in burst {
                        publish(held, sink, &mut outcome).await;
                    }
                }
                Delivery::Immediate => {
                    pause(self.metadata.network_delay()).await;
                    publish(event, sink, &mut outcome).await;
                }
            }

            pause(think_time).await;
        }

        self.state = SessionState::Complete;
        outcome.last_event_index = self.event_index;
        outcome.pool_wraps = self.pool.wraps();
        debug!(
            published = outcome.published,
            failed = outcome.failed,
            "session complete"
        );
        outcome
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}

async fn publish(mut event: Event, sink: &dyn PublishSink, outcome: &mut SessionOutcome) {
    event.mark_sent();
    let bytes = match event.to_bytes() {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(event_index = event.event_index, %err, "failed to serialize event, dropping it");
            outcome.dropped += 1;
            return;
        }
    };
    match sink.publish(bytes).await {
        Ok(()) => outcome.published += 1,
        Err(err) => {
            warn!(event_index = event.event_index, %err, "publish failed");
            outcome.failed += 1;
        }
    }
}
