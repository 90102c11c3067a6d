//! Status projection for approvable entities owned outside the ledger
//!
//! Promotions, budgets, rebates, trading terms and campaigns live in their
//! own tables; an approval decision only sets their `status` column.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::PortError;
use domain_approvals::{Approval, EntityType};
use domain_reconciliation::{ApprovalTarget, EngineError};

use crate::error::DatabaseError;

/// Entity types this projection can write, for registration at startup
pub const PROJECTED_ENTITY_TYPES: [EntityType; 5] = [
    EntityType::Promotion,
    EntityType::Budget,
    EntityType::Rebate,
    EntityType::TradingTerm,
    EntityType::Campaign,
];

/// Writes approval outcomes into the owning table's `status` column
#[derive(Debug, Clone)]
pub struct PostgresStatusProjection {
    pool: PgPool,
}

impl PostgresStatusProjection {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The table holding entities of `entity_type`, if it is projected
    pub fn table_for(entity_type: EntityType) -> Option<&'static str> {
        match entity_type {
            EntityType::Promotion => Some("promotions"),
            EntityType::Budget => Some("budgets"),
            EntityType::Rebate => Some("rebates"),
            EntityType::TradingTerm => Some("trading_terms"),
            EntityType::Campaign => Some("campaigns"),
            EntityType::Claim | EntityType::Deduction => None,
        }
    }

    #[instrument(skip(self, approval), fields(entity_type = %approval.entity_type, entity_id = %approval.entity_id))]
    async fn set_status(&self, approval: &Approval, status: &str) -> Result<(), EngineError> {
        let table = Self::table_for(approval.entity_type).ok_or_else(|| {
            EngineError::Validation(format!(
                "{} approvals are not projected to a status table",
                approval.entity_type
            ))
        })?;

        let result = sqlx::query(&format!(
            "UPDATE {table} SET status = $3, updated_at = now() WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(approval.entity_id)
        .bind(approval.tenant_id.as_uuid())
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::from(PortError::from(DatabaseError::from(e))))?;

        if result.rows_affected() == 0 {
            return Err(EngineError::not_found(approval.entity_type.as_str(), approval.entity_id));
        }

        debug!(status, "Projected approval outcome");
        Ok(())
    }
}

#[async_trait]
impl ApprovalTarget for PostgresStatusProjection {
    async fn mark_approved(&self, approval: &Approval) -> Result<(), EngineError> {
        self.set_status(approval, "approved").await
    }

    async fn mark_rejected(&self, approval: &Approval, _reason: &str) -> Result<(), EngineError> {
        self.set_status(approval, "rejected").await
    }
}
