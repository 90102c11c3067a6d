//! Lifecycle Manager
//!
//! Applies legal state transitions to claims, deductions, and approvals.
//! Each transition is a read-decide-write cycle against the ledger: the
//! entity is re-read, the transition is checked against its state graph,
//! and the result is written conditionally on the version that was read.
//! Approval decisions are then propagated to the underlying entity on a
//! best-effort basis through the [`ProjectionRegistry`].

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{
    ApprovalId, AuditEntry, AuditedEntity, ClaimId, DeductionId, Money, TenantId,
};
use domain_approvals::{Approval, ApprovalStatus, EntityType, NewApproval};
use domain_claims::{Claim, NewClaim};
use domain_deductions::{Deduction, NewDeduction};

use crate::config::{EngineConfig, RetryPolicy};
use crate::error::EngineError;
use crate::ports::LedgerPort;
use crate::propagation::{ApprovalTarget, ProjectionRegistry};
use crate::retry::with_retry;

/// A requested claim transition
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimTransition {
    Submit,
    Approve { amount: Money },
    /// Approves the lesser of `amount` and the claimed amount
    ApproveUpTo { amount: Money },
    Reject { reason: String },
    Settle { amount: Option<Money> },
    WriteOff { reason: Option<String> },
}

impl ClaimTransition {
    pub fn action(&self) -> &'static str {
        match self {
            ClaimTransition::Submit => "submit",
            ClaimTransition::Approve { .. } | ClaimTransition::ApproveUpTo { .. } => "approve",
            ClaimTransition::Reject { .. } => "reject",
            ClaimTransition::Settle { .. } => "settle",
            ClaimTransition::WriteOff { .. } => "write_off",
        }
    }

    fn reason(&self) -> Option<String> {
        match self {
            ClaimTransition::Reject { reason } => Some(reason.clone()),
            ClaimTransition::WriteOff { reason } => reason.clone(),
            _ => None,
        }
    }
}

/// A requested deduction transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeductionTransition {
    Review,
    Approve,
    Dispute { reason: String },
    WriteOff { reason: Option<String> },
}

impl DeductionTransition {
    pub fn action(&self) -> &'static str {
        match self {
            DeductionTransition::Review => "review",
            DeductionTransition::Approve => "approve",
            DeductionTransition::Dispute { .. } => "dispute",
            DeductionTransition::WriteOff { .. } => "write_off",
        }
    }

    fn reason(&self) -> Option<String> {
        match self {
            DeductionTransition::Dispute { reason } => Some(reason.clone()),
            DeductionTransition::WriteOff { reason } => reason.clone(),
            _ => None,
        }
    }
}

/// A requested approval decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalTransition {
    Approve { comments: Option<String> },
    Reject { reason: String, comments: Option<String> },
    Cancel { reason: Option<String> },
}

impl ApprovalTransition {
    pub fn action(&self) -> &'static str {
        match self {
            ApprovalTransition::Approve { .. } => "approve",
            ApprovalTransition::Reject { .. } => "reject",
            ApprovalTransition::Cancel { .. } => "cancel",
        }
    }

    fn reason(&self) -> Option<String> {
        match self {
            ApprovalTransition::Reject { reason, .. } => Some(reason.clone()),
            ApprovalTransition::Cancel { reason } => reason.clone(),
            ApprovalTransition::Approve { .. } => None,
        }
    }
}

/// Claim and deduction transitions
///
/// Split out of [`LifecycleManager`] so the built-in approval targets can
/// drive claims and deductions without holding the manager itself.
#[derive(Clone)]
pub struct EntityLifecycle {
    ledger: Arc<dyn LedgerPort>,
    retry: RetryPolicy,
}

impl EntityLifecycle {
    pub fn new(ledger: Arc<dyn LedgerPort>, retry: RetryPolicy) -> Self {
        Self { ledger, retry }
    }

    /// Records a new pending claim
    #[instrument(skip(self, input), fields(tenant_id = %input.tenant_id))]
    pub async fn create_claim(&self, input: NewClaim) -> Result<Claim, EngineError> {
        let claim = Claim::create(input, Utc::now())?;
        let audit = AuditEntry::new(
            claim.tenant_id,
            AuditedEntity::Claim,
            claim.id,
            "create",
            claim.status.as_str(),
            claim.created_by.as_str(),
        )
        .with_amount(claim.claimed_amount);

        let ledger = &self.ledger;
        let (claim, audit) = (&claim, &audit);
        let stored = with_retry(&self.retry, "create_claim", move || async move {
            ledger.insert_claim(claim, audit).await.map_err(EngineError::from)
        })
        .await?;
        info!(claim_id = %stored.id, claim_number = %stored.claim_number, "claim created");
        Ok(stored)
    }

    /// Applies `transition` to a claim
    #[instrument(skip(self, transition), fields(action = transition.action()))]
    pub async fn transition_claim(
        &self,
        tenant_id: TenantId,
        id: ClaimId,
        transition: ClaimTransition,
        actor: &str,
    ) -> Result<Claim, EngineError> {
        let this = self;
        let transition = &transition;
        let claim = with_retry(&self.retry, "transition_claim", move || {
            this.apply_claim_transition(tenant_id, id, transition, actor)
        })
        .await?;

        info!(claim_id = %claim.id, status = %claim.status, actor, "claim transitioned");
        Ok(claim)
    }

    /// Records a new open deduction
    #[instrument(skip(self, input), fields(tenant_id = %input.tenant_id))]
    pub async fn create_deduction(&self, input: NewDeduction, actor: &str) -> Result<Deduction, EngineError> {
        let deduction = Deduction::create(input, Utc::now())?;
        let audit = AuditEntry::new(
            deduction.tenant_id,
            AuditedEntity::Deduction,
            deduction.id,
            "create",
            deduction.status.as_str(),
            actor,
        )
        .with_amount(deduction.deduction_amount);

        let ledger = &self.ledger;
        let (deduction, audit) = (&deduction, &audit);
        let stored = with_retry(&self.retry, "create_deduction", move || async move {
            ledger.insert_deduction(deduction, audit).await.map_err(EngineError::from)
        })
        .await?;
        info!(deduction_id = %stored.id, deduction_number = %stored.deduction_number, "deduction created");
        Ok(stored)
    }

    /// Applies `transition` to a deduction
    ///
    /// The move to `matched` is not available here; it only happens through
    /// allocation in the matching engine.
    #[instrument(skip(self, transition), fields(action = transition.action()))]
    pub async fn transition_deduction(
        &self,
        tenant_id: TenantId,
        id: DeductionId,
        transition: DeductionTransition,
        actor: &str,
    ) -> Result<Deduction, EngineError> {
        let this = self;
        let transition = &transition;
        let deduction = with_retry(&self.retry, "transition_deduction", move || {
            this.apply_deduction_transition(tenant_id, id, transition, actor)
        })
        .await?;

        info!(deduction_id = %deduction.id, status = %deduction.status, actor, "deduction transitioned");
        Ok(deduction)
    }

    async fn apply_claim_transition(
        &self,
        tenant_id: TenantId,
        id: ClaimId,
        transition: &ClaimTransition,
        actor: &str,
    ) -> Result<Claim, EngineError> {
        let mut claim = self.ledger.get_claim(tenant_id, id).await?;
        let from = claim.status;
        let now = Utc::now();

        let amount = match transition {
            ClaimTransition::Submit => {
                claim.submit(now)?;
                None
            }
            ClaimTransition::Approve { amount } => {
                claim.approve(*amount, actor, now)?;
                Some(*amount)
            }
            ClaimTransition::ApproveUpTo { amount } => {
                let capped = amount.checked_min(&claim.claimed_amount).map_err(|e| {
                    EngineError::Validation(e.to_string())
                })?;
                claim.approve(capped, actor, now)?;
                Some(capped)
            }
            ClaimTransition::Reject { reason } => {
                claim.reject(reason, actor, now)?;
                None
            }
            ClaimTransition::Settle { amount } => {
                claim.settle(*amount, actor, now)?;
                claim.settled_amount
            }
            ClaimTransition::WriteOff { reason } => {
                claim.write_off(reason.clone(), actor, now)?;
                None
            }
        };

        let mut audit = AuditEntry::new(
            tenant_id,
            AuditedEntity::Claim,
            claim.id,
            transition.action(),
            claim.status.as_str(),
            actor,
        )
        .from_status(from.as_str())
        .with_reason(transition.reason());
        if let Some(amount) = amount {
            audit = audit.with_amount(amount);
        }
        Ok(self.ledger.update_claim(&claim, &audit).await?)
    }

    async fn apply_deduction_transition(
        &self,
        tenant_id: TenantId,
        id: DeductionId,
        transition: &DeductionTransition,
        actor: &str,
    ) -> Result<Deduction, EngineError> {
        let mut deduction = self.ledger.get_deduction(tenant_id, id).await?;
        let from = deduction.status;
        let now = Utc::now();

        match transition {
            DeductionTransition::Review => deduction.review(now)?,
            DeductionTransition::Approve => deduction.approve(actor, now)?,
            DeductionTransition::Dispute { reason } => deduction.dispute(reason, actor, now)?,
            DeductionTransition::WriteOff { reason } => {
                deduction.write_off(reason.clone(), actor, now)?
            }
        }

        let audit = AuditEntry::new(
            tenant_id,
            AuditedEntity::Deduction,
            deduction.id,
            transition.action(),
            deduction.status.as_str(),
            actor,
        )
        .from_status(from.as_str())
        .with_reason(transition.reason());
        Ok(self.ledger.update_deduction(&deduction, &audit).await?)
    }
}

/// Lifecycle operations for all three aggregates
#[derive(Clone)]
pub struct LifecycleManager {
    entities: EntityLifecycle,
    ledger: Arc<dyn LedgerPort>,
    retry: RetryPolicy,
    default_sla_hours: u32,
    targets: ProjectionRegistry,
}

impl LifecycleManager {
    /// Creates a manager with the built-in claim and deduction targets
    pub fn new(ledger: Arc<dyn LedgerPort>, config: &EngineConfig) -> Self {
        let retry = config.retry_policy();
        let entities = EntityLifecycle::new(ledger.clone(), retry);
        Self {
            targets: ProjectionRegistry::with_builtin(&entities),
            entities,
            ledger,
            retry,
            default_sla_hours: config.default_sla_hours,
        }
    }

    /// Registers the approval target for `entity_type`, replacing any
    /// previous one
    pub fn with_target(mut self, entity_type: EntityType, target: Arc<dyn ApprovalTarget>) -> Self {
        self.targets.register(entity_type, target);
        self
    }

    pub fn targets(&self) -> &ProjectionRegistry {
        &self.targets
    }

    pub async fn create_claim(&self, input: NewClaim) -> Result<Claim, EngineError> {
        self.entities.create_claim(input).await
    }

    pub async fn transition_claim(
        &self,
        tenant_id: TenantId,
        id: ClaimId,
        transition: ClaimTransition,
        actor: &str,
    ) -> Result<Claim, EngineError> {
        self.entities.transition_claim(tenant_id, id, transition, actor).await
    }

    pub async fn create_deduction(&self, input: NewDeduction, actor: &str) -> Result<Deduction, EngineError> {
        self.entities.create_deduction(input, actor).await
    }

    pub async fn transition_deduction(
        &self,
        tenant_id: TenantId,
        id: DeductionId,
        transition: DeductionTransition,
        actor: &str,
    ) -> Result<Deduction, EngineError> {
        self.entities.transition_deduction(tenant_id, id, transition, actor).await
    }

    /// Raises a pending approval; the SLA defaults from configuration
    #[instrument(skip(self, input), fields(tenant_id = %input.tenant_id, entity_type = %input.entity_type))]
    pub async fn create_approval(&self, input: NewApproval) -> Result<Approval, EngineError> {
        let approval = Approval::request(input, Utc::now(), self.default_sla_hours)?;
        let audit = AuditEntry::new(
            approval.tenant_id,
            AuditedEntity::Approval,
            approval.id,
            "request",
            approval.status.as_str(),
            approval.requested_by.as_str(),
        )
        .with_amount(approval.amount);

        let ledger = &self.ledger;
        let (approval, audit) = (&approval, &audit);
        let stored = with_retry(&self.retry, "create_approval", move || async move {
            ledger.insert_approval(approval, audit).await.map_err(EngineError::from)
        })
        .await?;
        info!(approval_id = %stored.id, due_date = %stored.due_date, "approval requested");
        Ok(stored)
    }

    /// Records an approval decision, then propagates approve and reject to
    /// the underlying entity
    ///
    /// Propagation failures are logged and never undo the decision.
    #[instrument(skip(self, transition), fields(action = transition.action()))]
    pub async fn decide_approval(
        &self,
        tenant_id: TenantId,
        id: ApprovalId,
        transition: ApprovalTransition,
        actor: &str,
    ) -> Result<Approval, EngineError> {
        let this = self;
        let transition = &transition;
        let approval = with_retry(&self.retry, "decide_approval", move || {
            this.apply_approval_transition(tenant_id, id, transition, actor)
        })
        .await?;

        info!(approval_id = %approval.id, status = %approval.status, actor, "approval decided");
        self.propagate(&approval).await;
        Ok(approval)
    }

    async fn apply_approval_transition(
        &self,
        tenant_id: TenantId,
        id: ApprovalId,
        transition: &ApprovalTransition,
        actor: &str,
    ) -> Result<Approval, EngineError> {
        let mut approval = self.ledger.get_approval(tenant_id, id).await?;
        let from = approval.status;
        let now = Utc::now();

        match transition {
            ApprovalTransition::Approve { comments } => {
                approval.approve(actor, comments.clone(), now)?
            }
            ApprovalTransition::Reject { reason, comments } => {
                approval.reject(actor, reason, comments.clone(), now)?
            }
            ApprovalTransition::Cancel { reason } => approval.cancel(actor, reason.clone(), now)?,
        }

        let audit = AuditEntry::new(
            tenant_id,
            AuditedEntity::Approval,
            approval.id,
            transition.action(),
            approval.status.as_str(),
            actor,
        )
        .from_status(from.as_str())
        .with_reason(transition.reason());
        Ok(self.ledger.update_approval(&approval, &audit).await?)
    }

    async fn propagate(&self, approval: &Approval) {
        let Some(target) = self.targets.get(approval.entity_type) else {
            warn!(
                approval_id = %approval.id,
                entity_type = %approval.entity_type,
                "no approval target registered; decision not propagated"
            );
            return;
        };

        let result = match approval.status {
            ApprovalStatus::Approved => target.mark_approved(approval).await,
            ApprovalStatus::Rejected => {
                let reason = approval.rejection_reason().unwrap_or_default();
                target.mark_rejected(approval, reason).await
            }
            ApprovalStatus::Pending | ApprovalStatus::Cancelled => return,
        };

        if let Err(err) = result {
            warn!(
                approval_id = %approval.id,
                entity_type = %approval.entity_type,
                entity_id = %approval.entity_id,
                error = %err,
                "approval decision not propagated"
            );
        }
    }
}
