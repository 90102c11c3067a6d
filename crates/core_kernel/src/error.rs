//! Kernel error type

use thiserror::Error;

use crate::money::MoneyError;
use crate::temporal::TemporalError;

/// Errors raised while building or parsing kernel values
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Temporal error: {0}")]
    Temporal(#[from] TemporalError),

    #[error("Invalid identifier: {0}")]
    Identifier(#[from] uuid::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }
}
