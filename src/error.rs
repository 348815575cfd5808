use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Routine data sparsity (placeholder rates, dates missing from one input) is
/// absorbed by filtering and never shows up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("insufficient data: required {required} entries, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("series dates must be strictly increasing ({prev} is followed by {next})")]
    Unordered {
        prev: chrono::NaiveDate,
        next: chrono::NaiveDate,
    },

    #[error("duplicate date {0} in series")]
    DuplicateDate(chrono::NaiveDate),
}

impl SimError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Process-level error carrying the exit code the binary should return.
///
/// Exit codes: 2 usage/config/IO, 3 invalid simulation input, 4 upstream data.
#[derive(Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl From<SimError> for AppError {
    fn from(err: SimError) -> Self {
        AppError::new(3, err.to_string())
    }
}
