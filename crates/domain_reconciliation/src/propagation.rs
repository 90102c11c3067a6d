//! Approval decision propagation
//!
//! When an approval is approved or rejected, the underlying entity is told
//! about it through the [`ApprovalTarget`] registered for its
//! [`EntityType`]. The registry is a finite, explicit mapping built at
//! startup; entity types without a target are logged and skipped.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use core_kernel::{ClaimId, DeductionId};
use domain_approvals::{Approval, EntityType};

use crate::error::EngineError;
use crate::lifecycle::{ClaimTransition, DeductionTransition, EntityLifecycle};

/// Receiver of approval decisions for one kind of entity
#[async_trait]
pub trait ApprovalTarget: Send + Sync {
    async fn mark_approved(&self, approval: &Approval) -> Result<(), EngineError>;

    async fn mark_rejected(&self, approval: &Approval, reason: &str) -> Result<(), EngineError>;
}

/// Mapping from entity type to its approval target
#[derive(Clone, Default)]
pub struct ProjectionRegistry {
    targets: HashMap<EntityType, Arc<dyn ApprovalTarget>>,
}

impl ProjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the claim and deduction targets installed
    pub fn with_builtin(entities: &EntityLifecycle) -> Self {
        let mut registry = Self::new();
        registry.register(
            EntityType::Claim,
            Arc::new(ClaimApprovalTarget::new(entities.clone())),
        );
        registry.register(
            EntityType::Deduction,
            Arc::new(DeductionApprovalTarget::new(entities.clone())),
        );
        registry
    }

    pub fn register(&mut self, entity_type: EntityType, target: Arc<dyn ApprovalTarget>) {
        self.targets.insert(entity_type, target);
    }

    pub fn get(&self, entity_type: EntityType) -> Option<&Arc<dyn ApprovalTarget>> {
        self.targets.get(&entity_type)
    }

    pub fn is_registered(&self, entity_type: EntityType) -> bool {
        self.targets.contains_key(&entity_type)
    }
}

fn decided_by(approval: &Approval) -> &str {
    approval
        .decision
        .as_ref()
        .map(|d| d.decided_by())
        .unwrap_or(approval.requested_by.as_str())
}

/// Approves a claim for the approval amount, capped at the claimed amount,
/// or rejects it with the decision reason
pub struct ClaimApprovalTarget {
    entities: EntityLifecycle,
}

impl ClaimApprovalTarget {
    pub fn new(entities: EntityLifecycle) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl ApprovalTarget for ClaimApprovalTarget {
    async fn mark_approved(&self, approval: &Approval) -> Result<(), EngineError> {
        self.entities
            .transition_claim(
                approval.tenant_id,
                ClaimId::from_uuid(approval.entity_id),
                ClaimTransition::ApproveUpTo {
                    amount: approval.amount,
                },
                decided_by(approval),
            )
            .await
            .map(|_| ())
    }

    async fn mark_rejected(&self, approval: &Approval, reason: &str) -> Result<(), EngineError> {
        self.entities
            .transition_claim(
                approval.tenant_id,
                ClaimId::from_uuid(approval.entity_id),
                ClaimTransition::Reject {
                    reason: reason.to_string(),
                },
                decided_by(approval),
            )
            .await
            .map(|_| ())
    }
}

/// Approves a deduction, or disputes it on rejection
pub struct DeductionApprovalTarget {
    entities: EntityLifecycle,
}

impl DeductionApprovalTarget {
    pub fn new(entities: EntityLifecycle) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl ApprovalTarget for DeductionApprovalTarget {
    async fn mark_approved(&self, approval: &Approval) -> Result<(), EngineError> {
        self.entities
            .transition_deduction(
                approval.tenant_id,
                DeductionId::from_uuid(approval.entity_id),
                DeductionTransition::Approve,
                decided_by(approval),
            )
            .await
            .map(|_| ())
    }

    async fn mark_rejected(&self, approval: &Approval, reason: &str) -> Result<(), EngineError> {
        self.entities
            .transition_deduction(
                approval.tenant_id,
                DeductionId::from_uuid(approval.entity_id),
                DeductionTransition::Dispute {
                    reason: reason.to_string(),
                },
                decided_by(approval),
            )
            .await
            .map(|_| ())
    }
}
