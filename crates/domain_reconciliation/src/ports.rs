//! Ledger Store Port
//!
//! The engine reads and writes claims, deductions, matches, and approvals
//! only through [`LedgerPort`]. Every read is scoped to a tenant, and every
//! update is conditional on the entity's `version`: the adapter applies the
//! write only if the stored version still equals the version the engine
//! read, and bumps it. A lost race surfaces as [`PortError::Conflict`].
//!
//! # Adapters
//!
//! - **PostgreSQL**: `infra_db::PostgresLedgerAdapter`
//! - **Mock**: [`mock::MockLedger`], in memory, with fault injection
//!
//! # Usage
//!
//! ```rust,ignore
//! let ledger: Arc<dyn LedgerPort> = Arc::new(PostgresLedgerAdapter::new(pool));
//! let engine = ReconciliationEngine::new(ledger, EngineConfig::default());
//! ```

use async_trait::async_trait;
use uuid::Uuid;

use core_kernel::{
    ApprovalId, AuditEntry, ClaimId, Currency, CustomerId, DateRange, DeductionId, DomainPort,
    HealthCheckable, PortError, TenantId,
};
use domain_approvals::{Approval, ApprovalStatus, EntityType};
use domain_claims::{Claim, ClaimStatus};
use domain_deductions::{Deduction, DeductionStatus, Match};

/// Query parameters for finding claims
#[derive(Debug, Clone, Default)]
pub struct ClaimQuery {
    pub customer_id: Option<CustomerId>,
    /// Empty means any status
    pub statuses: Vec<ClaimStatus>,
    /// Inclusive window over the claim date
    pub claim_dates: Option<DateRange>,
    pub currency: Option<Currency>,
}

impl ClaimQuery {
    pub fn with_statuses(statuses: impl Into<Vec<ClaimStatus>>) -> Self {
        Self {
            statuses: statuses.into(),
            ..Default::default()
        }
    }

    pub fn matches(&self, claim: &Claim) -> bool {
        self.customer_id.map_or(true, |c| claim.customer_id == c)
            && (self.statuses.is_empty() || self.statuses.contains(&claim.status))
            && self.claim_dates.map_or(true, |r| r.contains(claim.claim_date))
            && self.currency.map_or(true, |c| claim.currency == c)
    }
}

/// Query parameters for finding deductions
#[derive(Debug, Clone, Default)]
pub struct DeductionQuery {
    pub customer_id: Option<CustomerId>,
    /// Empty means any status
    pub statuses: Vec<DeductionStatus>,
    /// Inclusive window over the deduction date
    pub deduction_dates: Option<DateRange>,
    pub currency: Option<Currency>,
}

impl DeductionQuery {
    pub fn with_statuses(statuses: impl Into<Vec<DeductionStatus>>) -> Self {
        Self {
            statuses: statuses.into(),
            ..Default::default()
        }
    }

    pub fn matches(&self, deduction: &Deduction) -> bool {
        self.customer_id.map_or(true, |c| deduction.customer_id == c)
            && (self.statuses.is_empty() || self.statuses.contains(&deduction.status))
            && self.deduction_dates.map_or(true, |r| r.contains(deduction.deduction_date))
            && self.currency.map_or(true, |c| deduction.currency == c)
    }
}

/// Query parameters for finding approvals
#[derive(Debug, Clone, Default)]
pub struct ApprovalQuery {
    /// Empty means any status
    pub statuses: Vec<ApprovalStatus>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<Uuid>,
}

impl ApprovalQuery {
    pub fn pending() -> Self {
        Self {
            statuses: vec![ApprovalStatus::Pending],
            ..Default::default()
        }
    }

    pub fn matches(&self, approval: &Approval) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&approval.status))
            && self.entity_type.map_or(true, |t| approval.entity_type == t)
            && self.entity_id.map_or(true, |id| approval.entity_id == id)
    }
}

/// Query parameters for finding matches
#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
    pub deduction_id: Option<DeductionId>,
    pub claim_id: Option<ClaimId>,
}

impl MatchQuery {
    pub fn matches(&self, allocation: &Match) -> bool {
        self.deduction_id.map_or(true, |d| allocation.deduction_id == d)
            && self.claim_id.map_or(true, |c| allocation.claim_id == c)
    }
}

/// One atomic allocation write
///
/// `deduction` and `claim` carry the versions that were read; both must
/// still be current for the write to apply.
#[derive(Debug, Clone)]
pub struct MatchWrite {
    pub deduction: Deduction,
    pub claim: Claim,
    pub allocation: Match,
    pub audit: Vec<AuditEntry>,
}

/// The port the reconciliation engine requires from its ledger store
#[async_trait]
pub trait LedgerPort: DomainPort + HealthCheckable {
    // ========================================================================
    // Claims
    // ========================================================================

    /// Retrieves a claim, or `PortError::NotFound` if it does not exist in
    /// the tenant
    async fn get_claim(&self, tenant_id: TenantId, id: ClaimId) -> Result<Claim, PortError>;

    /// Finds claims ordered by creation time, then id
    async fn find_claims(&self, tenant_id: TenantId, query: &ClaimQuery) -> Result<Vec<Claim>, PortError>;

    async fn insert_claim(&self, claim: &Claim, audit: &AuditEntry) -> Result<Claim, PortError>;

    /// Conditionally replaces a claim
    ///
    /// # Returns
    ///
    /// The stored claim with its bumped version, or `PortError::Conflict`
    /// if `claim.version` is stale
    async fn update_claim(&self, claim: &Claim, audit: &AuditEntry) -> Result<Claim, PortError>;

    // ========================================================================
    // Deductions
    // ========================================================================

    async fn get_deduction(&self, tenant_id: TenantId, id: DeductionId) -> Result<Deduction, PortError>;

    /// Finds deductions ordered by creation time, then id
    async fn find_deductions(
        &self,
        tenant_id: TenantId,
        query: &DeductionQuery,
    ) -> Result<Vec<Deduction>, PortError>;

    async fn insert_deduction(&self, deduction: &Deduction, audit: &AuditEntry) -> Result<Deduction, PortError>;

    /// Conditionally replaces a deduction; see [`LedgerPort::update_claim`]
    async fn update_deduction(&self, deduction: &Deduction, audit: &AuditEntry) -> Result<Deduction, PortError>;

    // ========================================================================
    // Matches
    // ========================================================================

    /// Writes both sides of an allocation and the match row in one unit
    ///
    /// # Returns
    ///
    /// The stored deduction and claim with bumped versions
    async fn record_match(&self, write: MatchWrite) -> Result<(Deduction, Claim), PortError>;

    async fn find_matches(&self, tenant_id: TenantId, query: &MatchQuery) -> Result<Vec<Match>, PortError>;

    // ========================================================================
    // Approvals
    // ========================================================================

    async fn get_approval(&self, tenant_id: TenantId, id: ApprovalId) -> Result<Approval, PortError>;

    /// Finds approvals ordered by request time, then id
    async fn find_approvals(
        &self,
        tenant_id: TenantId,
        query: &ApprovalQuery,
    ) -> Result<Vec<Approval>, PortError>;

    async fn insert_approval(&self, approval: &Approval, audit: &AuditEntry) -> Result<Approval, PortError>;

    /// Conditionally replaces an approval; see [`LedgerPort::update_claim`]
    async fn update_approval(&self, approval: &Approval, audit: &AuditEntry) -> Result<Approval, PortError>;

    // ========================================================================
    // Audit
    // ========================================================================

    /// Audit entries for one entity, oldest first
    async fn list_audit(&self, tenant_id: TenantId, entity_id: Uuid) -> Result<Vec<AuditEntry>, PortError>;
}

// ============================================================================
// Mock Implementation
// ============================================================================

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use core_kernel::{AdapterHealth, HealthCheckResult, MatchId};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    struct LedgerState {
        claims: HashMap<ClaimId, Claim>,
        deductions: HashMap<DeductionId, Deduction>,
        approvals: HashMap<ApprovalId, Approval>,
        matches: HashMap<MatchId, Match>,
        audit: Vec<AuditEntry>,
    }

    /// In-memory ledger with versioned writes and fault injection
    #[derive(Debug, Default, Clone)]
    pub struct MockLedger {
        state: Arc<RwLock<LedgerState>>,
        failing_writes: Arc<AtomicU32>,
        conflicting_writes: Arc<AtomicU32>,
    }

    impl MockLedger {
        /// Creates an empty ledger
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes the next `n` writes fail with a connection error
        pub fn fail_next_writes(&self, n: u32) {
            self.failing_writes.store(n, Ordering::SeqCst);
        }

        /// Makes the next `n` writes lose a version race
        pub fn conflict_next_writes(&self, n: u32) {
            self.conflicting_writes.store(n, Ordering::SeqCst);
        }

        /// Stores a claim as-is, bypassing versioning and audit
        pub async fn seed_claim(&self, claim: Claim) {
            self.state.write().await.claims.insert(claim.id, claim);
        }

        /// Stores a deduction as-is, bypassing versioning and audit
        pub async fn seed_deduction(&self, deduction: Deduction) {
            self.state.write().await.deductions.insert(deduction.id, deduction);
        }

        /// Stores an approval as-is, bypassing versioning and audit
        pub async fn seed_approval(&self, approval: Approval) {
            self.state.write().await.approvals.insert(approval.id, approval);
        }

        /// Number of match rows written so far
        pub async fn match_count(&self) -> usize {
            self.state.read().await.matches.len()
        }

        fn injected_fault(&self) -> Option<PortError> {
            if take_one(&self.failing_writes) {
                return Some(PortError::connection("injected connection failure"));
            }
            if take_one(&self.conflicting_writes) {
                return Some(PortError::conflict("injected version conflict"));
            }
            None
        }
    }

    fn take_one(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_version(entity: &str, stored: i64, read: i64) -> Result<(), PortError> {
        if stored != read {
            return Err(PortError::conflict(format!(
                "{entity} version {read} is stale (stored {stored})"
            )));
        }
        Ok(())
    }

    impl DomainPort for MockLedger {}

    #[async_trait]
    impl HealthCheckable for MockLedger {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-ledger".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl LedgerPort for MockLedger {
        async fn get_claim(&self, tenant_id: TenantId, id: ClaimId) -> Result<Claim, PortError> {
            self.state
                .read()
                .await
                .claims
                .get(&id)
                .filter(|c| c.tenant_id == tenant_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn find_claims(&self, tenant_id: TenantId, query: &ClaimQuery) -> Result<Vec<Claim>, PortError> {
            let state = self.state.read().await;
            let mut results: Vec<Claim> = state
                .claims
                .values()
                .filter(|c| c.tenant_id == tenant_id && query.matches(c))
                .cloned()
                .collect();
            results.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(results)
        }

        async fn insert_claim(&self, claim: &Claim, audit: &AuditEntry) -> Result<Claim, PortError> {
            if let Some(fault) = self.injected_fault() {
                return Err(fault);
            }
            let mut state = self.state.write().await;
            if state.claims.contains_key(&claim.id) {
                return Err(PortError::conflict(format!("claim {} already exists", claim.id)));
            }
            state.claims.insert(claim.id, claim.clone());
            state.audit.push(audit.clone());
            Ok(claim.clone())
        }

        async fn update_claim(&self, claim: &Claim, audit: &AuditEntry) -> Result<Claim, PortError> {
            if let Some(fault) = self.injected_fault() {
                return Err(fault);
            }
            let mut state = self.state.write().await;
            let stored = state
                .claims
                .get(&claim.id)
                .filter(|c| c.tenant_id == claim.tenant_id)
                .ok_or_else(|| PortError::not_found("Claim", claim.id))?;
            check_version("claim", stored.version, claim.version)?;

            let mut updated = claim.clone();
            updated.version += 1;
            state.claims.insert(updated.id, updated.clone());
            state.audit.push(audit.clone());
            Ok(updated)
        }

        async fn get_deduction(&self, tenant_id: TenantId, id: DeductionId) -> Result<Deduction, PortError> {
            self.state
                .read()
                .await
                .deductions
                .get(&id)
                .filter(|d| d.tenant_id == tenant_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Deduction", id))
        }

        async fn find_deductions(
            &self,
            tenant_id: TenantId,
            query: &DeductionQuery,
        ) -> Result<Vec<Deduction>, PortError> {
            let state = self.state.read().await;
            let mut results: Vec<Deduction> = state
                .deductions
                .values()
                .filter(|d| d.tenant_id == tenant_id && query.matches(d))
                .cloned()
                .collect();
            results.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(results)
        }

        async fn insert_deduction(&self, deduction: &Deduction, audit: &AuditEntry) -> Result<Deduction, PortError> {
            if let Some(fault) = self.injected_fault() {
                return Err(fault);
            }
            let mut state = self.state.write().await;
            if state.deductions.contains_key(&deduction.id) {
                return Err(PortError::conflict(format!("deduction {} already exists", deduction.id)));
            }
            state.deductions.insert(deduction.id, deduction.clone());
            state.audit.push(audit.clone());
            Ok(deduction.clone())
        }

        async fn update_deduction(&self, deduction: &Deduction, audit: &AuditEntry) -> Result<Deduction, PortError> {
            if let Some(fault) = self.injected_fault() {
                return Err(fault);
            }
            let mut state = self.state.write().await;
            let stored = state
                .deductions
                .get(&deduction.id)
                .filter(|d| d.tenant_id == deduction.tenant_id)
                .ok_or_else(|| PortError::not_found("Deduction", deduction.id))?;
            check_version("deduction", stored.version, deduction.version)?;

            let mut updated = deduction.clone();
            updated.version += 1;
            state.deductions.insert(updated.id, updated.clone());
            state.audit.push(audit.clone());
            Ok(updated)
        }

        async fn record_match(&self, write: MatchWrite) -> Result<(Deduction, Claim), PortError> {
            if let Some(fault) = self.injected_fault() {
                return Err(fault);
            }
            let mut state = self.state.write().await;
            let tenant_id = write.allocation.tenant_id;

            let stored_deduction = state
                .deductions
                .get(&write.deduction.id)
                .filter(|d| d.tenant_id == tenant_id)
                .ok_or_else(|| PortError::not_found("Deduction", write.deduction.id))?;
            check_version("deduction", stored_deduction.version, write.deduction.version)?;

            let stored_claim = state
                .claims
                .get(&write.claim.id)
                .filter(|c| c.tenant_id == tenant_id)
                .ok_or_else(|| PortError::not_found("Claim", write.claim.id))?;
            check_version("claim", stored_claim.version, write.claim.version)?;

            let mut deduction = write.deduction;
            deduction.version += 1;
            let mut claim = write.claim;
            claim.version += 1;

            state.deductions.insert(deduction.id, deduction.clone());
            state.claims.insert(claim.id, claim.clone());
            state.matches.insert(write.allocation.id, write.allocation);
            state.audit.extend(write.audit);
            Ok((deduction, claim))
        }

        async fn find_matches(&self, tenant_id: TenantId, query: &MatchQuery) -> Result<Vec<Match>, PortError> {
            let state = self.state.read().await;
            let mut results: Vec<Match> = state
                .matches
                .values()
                .filter(|m| m.tenant_id == tenant_id && query.matches(m))
                .cloned()
                .collect();
            results.sort_by(|a, b| a.matched_at.cmp(&b.matched_at).then(a.id.cmp(&b.id)));
            Ok(results)
        }

        async fn get_approval(&self, tenant_id: TenantId, id: ApprovalId) -> Result<Approval, PortError> {
            self.state
                .read()
                .await
                .approvals
                .get(&id)
                .filter(|a| a.tenant_id == tenant_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Approval", id))
        }

        async fn find_approvals(
            &self,
            tenant_id: TenantId,
            query: &ApprovalQuery,
        ) -> Result<Vec<Approval>, PortError> {
            let state = self.state.read().await;
            let mut results: Vec<Approval> = state
                .approvals
                .values()
                .filter(|a| a.tenant_id == tenant_id && query.matches(a))
                .cloned()
                .collect();
            results.sort_by(|a, b| a.requested_at.cmp(&b.requested_at).then(a.id.cmp(&b.id)));
            Ok(results)
        }

        async fn insert_approval(&self, approval: &Approval, audit: &AuditEntry) -> Result<Approval, PortError> {
            if let Some(fault) = self.injected_fault() {
                return Err(fault);
            }
            let mut state = self.state.write().await;
            if state.approvals.contains_key(&approval.id) {
                return Err(PortError::conflict(format!("approval {} already exists", approval.id)));
            }
            state.approvals.insert(approval.id, approval.clone());
            state.audit.push(audit.clone());
            Ok(approval.clone())
        }

        async fn update_approval(&self, approval: &Approval, audit: &AuditEntry) -> Result<Approval, PortError> {
            if let Some(fault) = self.injected_fault() {
                return Err(fault);
            }
            let mut state = self.state.write().await;
            let stored = state
                .approvals
                .get(&approval.id)
                .filter(|a| a.tenant_id == approval.tenant_id)
                .ok_or_else(|| PortError::not_found("Approval", approval.id))?;
            check_version("approval", stored.version, approval.version)?;

            let mut updated = approval.clone();
            updated.version += 1;
            state.approvals.insert(updated.id, updated.clone());
            state.audit.push(audit.clone());
            Ok(updated)
        }

        async fn list_audit(&self, tenant_id: TenantId, entity_id: Uuid) -> Result<Vec<AuditEntry>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .audit
                .iter()
                .filter(|e| e.tenant_id == tenant_id && e.entity_id == entity_id)
                .cloned()
                .collect())
        }
    }
}
