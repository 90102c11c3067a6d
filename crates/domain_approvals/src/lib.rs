//! Approval Workflow Domain
//!
//! Claims, deductions, budgets, and other trade entities are routed through
//! time-boxed approval requests. Each request carries an SLA measured in
//! hours from the moment it was raised.
//!
//! # Approval Lifecycle
//!
//! ```text
//! pending -> approved | rejected | cancelled
//! ```

pub mod approval;
pub mod sla;
pub mod queue;
pub mod error;

pub use approval::{Approval, ApprovalDecision, ApprovalStatus, EntityType, NewApproval, Priority};
pub use sla::{compute_sla, SlaState, SlaStatus};
pub use queue::{overdue, priority_queue};
pub use error::ApprovalError;
