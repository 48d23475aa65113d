use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Catalog or scenario parameters are missing or out of range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Engine state broke one of its own rules; the cycle is aborted.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl SimError {
    pub fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        SimError::InvariantViolation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
