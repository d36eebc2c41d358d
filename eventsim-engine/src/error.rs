use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("session plan digest mismatch: expected {expected}, derived {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("{failed} of {total} sessions did not complete")]
    Incomplete { failed: usize, total: usize },
}
