//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the reconciliation ledger using SQLx.
//!
//! # Architecture
//!
//! Repositories own the SQL and the row types; adapters implement the
//! engine's ports on top of them and translate errors at the boundary.
//!
//! # Concurrency
//!
//! Claims, deductions and approvals carry a `version` column. Updates are
//! issued as `UPDATE ... WHERE version = $n`; a miss is reported as a
//! conflict, which the engine answers by re-reading and retrying.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedgerAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/reconciliation")).await?;
//! run_migrations(&pool).await?;
//! let ledger = PostgresLedgerAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PostgresLedgerAdapter, PostgresStatusProjection, PROJECTED_ENTITY_TYPES};
pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
