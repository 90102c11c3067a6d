//! Engine errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use domain_approvals::ApprovalError;
use domain_claims::ClaimError;
use domain_deductions::DeductionError;

/// Errors surfaced by the reconciliation engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error("Illegal {entity} transition from {from} to {to}")]
    IllegalTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Ledger store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Ledger store error: {0}")]
    Store(#[source] PortError),
}

impl EngineError {
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// True when re-running the read-decide-write cycle may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::StoreUnavailable(_))
    }
}

impl From<PortError> for EngineError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => EngineError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Validation { message, .. } => EngineError::Validation(message),
            e if e.is_retryable() => EngineError::StoreUnavailable(e.to_string()),
            e => EngineError::Store(e),
        }
    }
}

impl From<MoneyError> for EngineError {
    fn from(err: MoneyError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<ClaimError> for EngineError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::InvalidStatusTransition { from, to } => EngineError::IllegalTransition {
                entity: "claim",
                from,
                to,
            },
            ClaimError::AllocationExceedsBalance { .. } => EngineError::InvalidAllocation(err.to_string()),
            ClaimError::Closed(_) => EngineError::InvalidState(err.to_string()),
            ClaimError::AmountExceedsClaimed { .. }
            | ClaimError::AmountExceedsApproved { .. }
            | ClaimError::Validation(_)
            | ClaimError::Money(_) => EngineError::Validation(err.to_string()),
        }
    }
}

impl From<DeductionError> for EngineError {
    fn from(err: DeductionError) -> Self {
        match err {
            DeductionError::InvalidStatusTransition { from, to } => EngineError::IllegalTransition {
                entity: "deduction",
                from,
                to,
            },
            DeductionError::NotMatchable(_) => EngineError::InvalidState(err.to_string()),
            DeductionError::InvalidAllocation(message) => EngineError::InvalidAllocation(message),
            DeductionError::Validation(_) | DeductionError::Money(_) => {
                EngineError::Validation(err.to_string())
            }
        }
    }
}

impl From<ApprovalError> for EngineError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::InvalidStatusTransition { from, to } => EngineError::IllegalTransition {
                entity: "approval",
                from,
                to,
            },
            ApprovalError::Validation(message) => EngineError::Validation(message),
        }
    }
}
