//! Claims domain errors

use core_kernel::MoneyError;
use thiserror::Error;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Approved amount {approved} exceeds claimed amount {claimed}")]
    AmountExceedsClaimed { approved: String, claimed: String },

    #[error("Settled amount {settled} exceeds approved amount {approved}")]
    AmountExceedsApproved { settled: String, approved: String },

    #[error("Allocation of {requested} exceeds unmatched balance {available}")]
    AllocationExceedsBalance { requested: String, available: String },

    #[error("Claim is closed ({0})")]
    Closed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Money(#[from] MoneyError),
}
