//! Port adapters backed by PostgreSQL
//!
//! - [`PostgresLedgerAdapter`] implements the engine's `LedgerPort`
//! - [`PostgresStatusProjection`] is the `ApprovalTarget` for entity types
//!   whose tables belong to neighbouring services
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresLedgerAdapter, PostgresStatusProjection, PROJECTED_ENTITY_TYPES};
//!
//! let mut engine = ReconciliationEngine::new(Arc::new(PostgresLedgerAdapter::new(pool.clone())), config);
//! let projection = Arc::new(PostgresStatusProjection::new(pool));
//! for entity_type in PROJECTED_ENTITY_TYPES {
//!     engine = engine.with_target(entity_type, projection.clone());
//! }
//! ```

pub mod ledger;
pub mod projection;

pub use ledger::PostgresLedgerAdapter;
pub use projection::{PostgresStatusProjection, PROJECTED_ENTITY_TYPES};
