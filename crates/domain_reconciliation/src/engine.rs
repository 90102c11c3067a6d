//! Engine facade wiring the components to one ledger

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{ApprovalId, AuditEntry, ClaimId, DeductionId, HealthCheckResult, TenantId};
use domain_approvals::{Approval, EntityType};
use domain_claims::Claim;
use domain_deductions::Deduction;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::lifecycle::LifecycleManager;
use crate::matching::MatchingEngine;
use crate::ports::LedgerPort;
use crate::propagation::ApprovalTarget;
use crate::reporting::ReconciliationReporter;
use crate::sla::SlaTracker;

/// The reconciliation engine
///
/// Cheap to clone; every component shares the same ledger handle and holds
/// no state of its own between calls.
#[derive(Clone)]
pub struct ReconciliationEngine {
    ledger: Arc<dyn LedgerPort>,
    config: EngineConfig,
    matching: MatchingEngine,
    lifecycle: LifecycleManager,
    reporter: ReconciliationReporter,
    sla: SlaTracker,
}

impl ReconciliationEngine {
    pub fn new(ledger: Arc<dyn LedgerPort>, config: EngineConfig) -> Self {
        Self {
            matching: MatchingEngine::new(ledger.clone(), config.retry_policy()),
            lifecycle: LifecycleManager::new(ledger.clone(), &config),
            reporter: ReconciliationReporter::new(ledger.clone(), &config),
            sla: SlaTracker::new(ledger.clone(), &config),
            ledger,
            config,
        }
    }

    /// Registers an approval target for `entity_type`
    pub fn with_target(mut self, entity_type: EntityType, target: Arc<dyn ApprovalTarget>) -> Self {
        self.lifecycle = self.lifecycle.with_target(entity_type, target);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn matching(&self) -> &MatchingEngine {
        &self.matching
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn reporter(&self) -> &ReconciliationReporter {
        &self.reporter
    }

    pub fn sla(&self) -> &SlaTracker {
        &self.sla
    }

    pub async fn claim(&self, tenant_id: TenantId, id: ClaimId) -> Result<Claim, EngineError> {
        Ok(self.ledger.get_claim(tenant_id, id).await?)
    }

    pub async fn deduction(&self, tenant_id: TenantId, id: DeductionId) -> Result<Deduction, EngineError> {
        Ok(self.ledger.get_deduction(tenant_id, id).await?)
    }

    pub async fn approval(&self, tenant_id: TenantId, id: ApprovalId) -> Result<Approval, EngineError> {
        Ok(self.ledger.get_approval(tenant_id, id).await?)
    }

    /// Audit entries for one entity, oldest first
    #[instrument(skip(self))]
    pub async fn audit_trail(&self, tenant_id: TenantId, entity_id: Uuid) -> Result<Vec<AuditEntry>, EngineError> {
        Ok(self.ledger.list_audit(tenant_id, entity_id).await?)
    }

    pub async fn health_check(&self) -> HealthCheckResult {
        self.ledger.health_check().await
    }
}
