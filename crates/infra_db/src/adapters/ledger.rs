//! PostgreSQL Ledger Adapter
//!
//! Implements [`LedgerPort`] over the repositories in this crate. Each write
//! and its audit entries go through one transaction, so an entity change is
//! never visible without the audit row that explains it.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerAdapter;
//! use domain_reconciliation::{EngineConfig, LedgerPort, ReconciliationEngine};
//! use std::sync::Arc;
//!
//! let ledger: Arc<dyn LedgerPort> = Arc::new(PostgresLedgerAdapter::new(pool));
//! let engine = ReconciliationEngine::new(ledger, EngineConfig::default());
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, ApprovalId, AuditEntry, ClaimId, DeductionId, DomainPort, HealthCheckResult,
    HealthCheckable, PortError, TenantId,
};
use domain_approvals::Approval;
use domain_claims::Claim;
use domain_deductions::{Deduction, Match};
use domain_reconciliation::{
    ApprovalQuery, ClaimQuery, DeductionQuery, LedgerPort, MatchQuery, MatchWrite,
};

use crate::error::DatabaseError;
use crate::repositories::{
    ApprovalRepository, AuditRepository, ClaimRepository, DeductionRepository,
};

const ADAPTER_ID: &str = "postgres-ledger-adapter";

/// PostgreSQL-backed implementation of the LedgerPort trait
///
/// # Error Handling
///
/// Database errors are translated to `PortError` variants:
/// - `DatabaseError::NotFound` -> `PortError::NotFound`
/// - `DatabaseError::Conflict`, duplicates, serialization failures -> `PortError::Conflict`
/// - connection and pool errors -> `PortError::Connection`
/// - other errors -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PostgresLedgerAdapter {
    pool: PgPool,
    claims: ClaimRepository,
    deductions: DeductionRepository,
    approvals: ApprovalRepository,
    audit: AuditRepository,
}

impl PostgresLedgerAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            claims: ClaimRepository::new(pool.clone()),
            deductions: DeductionRepository::new(pool.clone()),
            approvals: ApprovalRepository::new(pool.clone()),
            audit: AuditRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }

    async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DatabaseError> {
        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
    }
}

impl DomainPort for PostgresLedgerAdapter {}

#[async_trait]
impl HealthCheckable for PostgresLedgerAdapter {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerPort for PostgresLedgerAdapter {
    // ========================================================================
    // Claims
    // ========================================================================

    #[instrument(skip(self), fields(tenant_id = %tenant_id, claim_id = %id))]
    async fn get_claim(&self, tenant_id: TenantId, id: ClaimId) -> Result<Claim, PortError> {
        self.claims
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| PortError::not_found("Claim", id))
    }

    #[instrument(skip(self, query), fields(tenant_id = %tenant_id))]
    async fn find_claims(&self, tenant_id: TenantId, query: &ClaimQuery) -> Result<Vec<Claim>, PortError> {
        debug!(?query, "Finding claims");
        Ok(self.claims.find(tenant_id, query).await?)
    }

    #[instrument(skip(self, claim, audit), fields(claim_id = %claim.id))]
    async fn insert_claim(&self, claim: &Claim, audit: &AuditEntry) -> Result<Claim, PortError> {
        let mut tx = self.begin().await?;
        let stored = self.claims.insert(&mut tx, claim).await?;
        self.audit.append(&mut tx, audit).await?;
        Self::commit(tx).await?;
        Ok(stored)
    }

    #[instrument(skip(self, claim, audit), fields(claim_id = %claim.id, version = claim.version))]
    async fn update_claim(&self, claim: &Claim, audit: &AuditEntry) -> Result<Claim, PortError> {
        let mut tx = self.begin().await?;
        let stored = self.claims.update(&mut tx, claim).await?;
        self.audit.append(&mut tx, audit).await?;
        Self::commit(tx).await?;
        Ok(stored)
    }

    // ========================================================================
    // Deductions
    // ========================================================================

    #[instrument(skip(self), fields(tenant_id = %tenant_id, deduction_id = %id))]
    async fn get_deduction(&self, tenant_id: TenantId, id: DeductionId) -> Result<Deduction, PortError> {
        self.deductions
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| PortError::not_found("Deduction", id))
    }

    #[instrument(skip(self, query), fields(tenant_id = %tenant_id))]
    async fn find_deductions(
        &self,
        tenant_id: TenantId,
        query: &DeductionQuery,
    ) -> Result<Vec<Deduction>, PortError> {
        debug!(?query, "Finding deductions");
        Ok(self.deductions.find(tenant_id, query).await?)
    }

    #[instrument(skip(self, deduction, audit), fields(deduction_id = %deduction.id))]
    async fn insert_deduction(&self, deduction: &Deduction, audit: &AuditEntry) -> Result<Deduction, PortError> {
        let mut tx = self.begin().await?;
        let stored = self.deductions.insert(&mut tx, deduction).await?;
        self.audit.append(&mut tx, audit).await?;
        Self::commit(tx).await?;
        Ok(stored)
    }

    #[instrument(skip(self, deduction, audit), fields(deduction_id = %deduction.id, version = deduction.version))]
    async fn update_deduction(&self, deduction: &Deduction, audit: &AuditEntry) -> Result<Deduction, PortError> {
        let mut tx = self.begin().await?;
        let stored = self.deductions.update(&mut tx, deduction).await?;
        self.audit.append(&mut tx, audit).await?;
        Self::commit(tx).await?;
        Ok(stored)
    }

    // ========================================================================
    // Matches
    // ========================================================================

    /// Both version checks, the match row and the audit entries commit
    /// together or not at all
    #[instrument(
        skip(self, write),
        fields(
            deduction_id = %write.deduction.id,
            claim_id = %write.claim.id,
            amount = %write.allocation.amount,
        )
    )]
    async fn record_match(&self, write: MatchWrite) -> Result<(Deduction, Claim), PortError> {
        let mut tx = self.begin().await?;

        let deduction = self.deductions.update(&mut tx, &write.deduction).await?;
        let claim = self.claims.update(&mut tx, &write.claim).await?;
        self.deductions.insert_match(&mut tx, &write.allocation).await?;
        for entry in &write.audit {
            self.audit.append(&mut tx, entry).await?;
        }

        Self::commit(tx).await?;
        debug!(match_id = %write.allocation.id, "Match recorded");
        Ok((deduction, claim))
    }

    #[instrument(skip(self, query), fields(tenant_id = %tenant_id))]
    async fn find_matches(&self, tenant_id: TenantId, query: &MatchQuery) -> Result<Vec<Match>, PortError> {
        Ok(self.deductions.find_matches(tenant_id, query).await?)
    }

    // ========================================================================
    // Approvals
    // ========================================================================

    #[instrument(skip(self), fields(tenant_id = %tenant_id, approval_id = %id))]
    async fn get_approval(&self, tenant_id: TenantId, id: ApprovalId) -> Result<Approval, PortError> {
        self.approvals
            .get(tenant_id, id)
            .await?
            .ok_or_else(|| PortError::not_found("Approval", id))
    }

    #[instrument(skip(self, query), fields(tenant_id = %tenant_id))]
    async fn find_approvals(
        &self,
        tenant_id: TenantId,
        query: &ApprovalQuery,
    ) -> Result<Vec<Approval>, PortError> {
        debug!(?query, "Finding approvals");
        Ok(self.approvals.find(tenant_id, query).await?)
    }

    #[instrument(skip(self, approval, audit), fields(approval_id = %approval.id))]
    async fn insert_approval(&self, approval: &Approval, audit: &AuditEntry) -> Result<Approval, PortError> {
        let mut tx = self.begin().await?;
        let stored = self.approvals.insert(&mut tx, approval).await?;
        self.audit.append(&mut tx, audit).await?;
        Self::commit(tx).await?;
        Ok(stored)
    }

    #[instrument(skip(self, approval, audit), fields(approval_id = %approval.id, version = approval.version))]
    async fn update_approval(&self, approval: &Approval, audit: &AuditEntry) -> Result<Approval, PortError> {
        let mut tx = self.begin().await?;
        let stored = self.approvals.update(&mut tx, approval).await?;
        self.audit.append(&mut tx, audit).await?;
        Self::commit(tx).await?;
        Ok(stored)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    #[instrument(skip(self), fields(tenant_id = %tenant_id, entity_id = %entity_id))]
    async fn list_audit(&self, tenant_id: TenantId, entity_id: Uuid) -> Result<Vec<AuditEntry>, PortError> {
        Ok(self.audit.list_for_entity(tenant_id, entity_id).await?)
    }
}
