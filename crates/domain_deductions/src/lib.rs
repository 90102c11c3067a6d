//! Customer Deductions Domain
//!
//! A deduction is an amount a customer withholds from an invoice payment,
//! usually because it believes a trade claim is owed. Deductions are cleared
//! by allocating them against claims ([`Match`] records) or resolved through
//! review, dispute, or write-off.
//!
//! # Deduction Lifecycle
//!
//! ```text
//! open -> under_review -> approved | disputed
//! open | under_review | disputed -> matched    (allocation only)
//! any non-terminal -> written_off
//! ```

pub mod deduction;
pub mod allocation;
pub mod error;

pub use deduction::{Deduction, DeductionDecision, DeductionStatus, DeductionType, NewDeduction};
pub use allocation::{Match, MatchMethod};
pub use error::DeductionError;
