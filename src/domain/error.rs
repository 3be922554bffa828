//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the input or configuration contract.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("missing column in input header: {column}")]
    MissingColumn { column: String },
}

impl DomainError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
