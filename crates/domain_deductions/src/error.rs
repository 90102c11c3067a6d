//! Deductions domain errors

use core_kernel::MoneyError;
use thiserror::Error;

/// Errors that can occur in the deductions domain
#[derive(Debug, Error)]
pub enum DeductionError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Deduction in status {0} cannot be matched")]
    NotMatchable(String),

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Money(#[from] MoneyError),
}
