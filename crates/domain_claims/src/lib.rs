//! Trade Claims Domain
//!
//! This crate models the claim a customer raises against a trade promotion,
//! rebate, or allowance, from submission through review to settlement.
//!
//! # Claim Lifecycle
//!
//! ```text
//! pending -> under_review -> approved | partially_approved -> settled
//!                         \-> rejected
//! any non-terminal -> written_off
//! ```

pub mod claim;
pub mod error;

pub use claim::{Claim, ClaimDecision, ClaimStatus, ClaimType, NewClaim, SupportingDetails};
pub use error::ClaimError;
