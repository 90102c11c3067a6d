//! Approval domain errors

use thiserror::Error;

/// Errors that can occur in the approvals domain
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Validation error: {0}")]
    Validation(String),
}
