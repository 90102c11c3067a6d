//! Core Kernel - Foundational types shared by the reconciliation crates
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money types with exact decimal arithmetic
//! - Calendar windows and reporting timezones
//! - Strongly-typed identifiers
//! - Audit trail entries and port error types

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod audit;
pub mod error;

pub use money::{Money, Currency, MoneyError, MAX_LEDGER_AMOUNT};
pub use temporal::{DateRange, Timezone, TemporalError};
pub use identifiers::{
    TenantId, CustomerId, ClaimId, DeductionId, MatchId, ApprovalId, AuditEventId,
};
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckable, HealthCheckResult,
};
pub use audit::{AuditEntry, AuditedEntity};
pub use error::CoreError;
