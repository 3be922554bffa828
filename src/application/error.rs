//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("no tree document found, tried: {}", format_paths(.candidates))]
    NoTreeFound { candidates: Vec<PathBuf> },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}: {source}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
