//! Deduction-Claim Reconciliation Engine
//!
//! Reconciles customer deductions against trade claims and drives the
//! approval workflow around both:
//!
//! - [`MatchingEngine`]: exact-amount auto-matching and manual partial
//!   allocation
//! - [`LifecycleManager`]: state transitions for claims, deductions, and
//!   approvals, with best-effort propagation of approval decisions
//! - [`ReconciliationReporter`]: totals, variance, match rate, and aging
//! - [`SlaTracker`]: SLA status, the work queue, and overdue approvals
//!
//! All state lives behind [`LedgerPort`]. Writes are conditional on the
//! version that was read and are retried under [`RetryPolicy`].

pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod matching;
pub mod ports;
pub mod propagation;
pub mod reporting;
pub mod retry;
pub mod sla;

pub use config::{EngineConfig, RetryPolicy};
pub use engine::ReconciliationEngine;
pub use error::EngineError;
pub use lifecycle::{
    ApprovalTransition, ClaimTransition, DeductionTransition, EntityLifecycle, LifecycleManager,
};
pub use matching::MatchingEngine;
pub use ports::{ApprovalQuery, ClaimQuery, DeductionQuery, LedgerPort, MatchQuery, MatchWrite};
pub use propagation::{ApprovalTarget, ClaimApprovalTarget, DeductionApprovalTarget, ProjectionRegistry};
pub use reporting::{
    AgingBand, AgingBucket, ClaimTotals, DeductionTotals, ReconciliationQuery, ReconciliationReport,
    ReconciliationReporter,
};
pub use sla::{QueueEntry, SlaTracker};
