//! Error taxonomy for Kairu
//!
//! Data model operations return [`KairuError`]. The command layer wraps these
//! in `anyhow::Error`, so callers that need the kind back can use
//! `err.downcast_ref::<KairuError>()`.

use thiserror::Error;

/// Errors raised by the data model and the persistence adapter
#[derive(Error, Debug)]
pub enum KairuError {
    /// Malformed input: bad date, unknown priority/recurrence, empty name, duplicates
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A referenced task, sub-task, group, goal or theme does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The target was already completed
    #[error("{kind} {id} is already completed")]
    AlreadyCompleted { kind: &'static str, id: String },

    /// A store purchase costs more than the current balance
    #[error("Not enough points: {needed} needed, {available} available")]
    InsufficientPoints { needed: u64, available: u64 },

    /// The data file exists but does not have the expected shape
    #[error("Data file is corrupt: {0}")]
    CorruptStore(String),

    /// Reading or writing the data file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KairuError {
    pub fn validation(message: impl Into<String>) -> Self {
        KairuError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        KairuError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result alias for data model operations
pub type KairuResult<T> = Result<T, KairuError>;
