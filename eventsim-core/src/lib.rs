//! # eventsim-core
//!
//! The session simulation engine: reproducible random pools, the event
//! model, the offline buffering policy and the per-session state machine
//! that feeds a publish sink.
//!
//! ### Key Submodules:
//! - `rand_pool`: per-session pre-generated uniform and normal draws
//! - `metadata`: session parameters and the buffering decision
//! - `event`: wire records
//! - `buffer`: withheld events of an offline session
//! - `sink`: the publish contract and an in-memory sink
//! - `session`: the `Start -> Running -> Complete` state machine

pub mod buffer;
pub mod event;
pub mod metadata;
pub mod rand_pool;
pub mod session;
pub mod sink;

pub mod prelude {
    pub use crate::buffer::SessionBuffer;
    pub use crate::event::{Event, Payload, SessionKind};
    pub use crate::metadata::{Delivery, SessionMetadata};
    pub use crate::rand_pool::{PoolSizing, RandomPool};
    pub use crate::session::{Session, SessionOutcome, SessionState};
    pub use crate::sink::{MemorySink, PublishSink, Published, SinkError};
}
