pub mod error;
pub mod plan;
pub mod runtime;
pub mod scheduler;
pub mod summary;

pub use error::EngineError;
pub use plan::{plan_digest, plan_sessions, SessionPlan};
pub use runtime::run_simulation;
pub use scheduler::{Job, Scheduler};
pub use summary::RunSummary;
