use thiserror::Error;

/// Errors reported by the core. Nothing here is recovered internally;
/// fallback policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Rejected before any stepping took place.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Numeric failure while stepping. `last_valid` is the index of the last
    /// sample that was computed successfully; `time` and `state` describe it.
    #[error("Simulation failed at step {step} (t = {time}): {reason}")]
    Simulation {
        step: usize,
        last_valid: usize,
        time: f64,
        state: Vec<f64>,
        reason: String,
    },

    /// Parse, compile or evaluation failure of a user expression.
    #[error("Expression error: {0}")]
    Expression(String),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidParameters(message.into())
    }

    pub(crate) fn expression(message: impl Into<String>) -> Self {
        Error::Expression(message.into())
    }

    pub fn is_simulation_failure(&self) -> bool {
        matches!(self, Error::Simulation { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
