//! Approvals DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ApprovalId, Money, TenantId};
use domain_approvals::{
    Approval, ApprovalDecision, ApprovalStatus, EntityType, NewApproval, Priority, SlaState,
    SlaStatus,
};
use domain_reconciliation::QueueEntry;

use super::common::MoneyInput;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApprovalRequest {
    pub tenant: Uuid,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    #[validate(length(max = 255))]
    pub entity_name: Option<String>,
    pub amount: MoneyInput,
    pub priority: Option<Priority>,
    #[validate(range(min = 1, max = 8760))]
    pub sla_hours: Option<u32>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 255))]
    pub requested_by: String,
    #[validate(length(min = 1, max = 255))]
    pub assigned_to: Option<String>,
}

impl From<CreateApprovalRequest> for NewApproval {
    fn from(request: CreateApprovalRequest) -> Self {
        NewApproval {
            tenant_id: TenantId::from_uuid(request.tenant),
            entity_type: request.entity_type,
            entity_id: request.entity_id,
            entity_name: request.entity_name,
            amount: request.amount.into(),
            priority: request.priority,
            sla_hours: request.sla_hours,
            due_date: request.due_date,
            requested_by: request.requested_by,
            assigned_to: request.assigned_to,
        }
    }
}

/// Body of `POST approvals/{id}/<action>`; `reject` requires `reason`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalActionRequest {
    pub tenant: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub actor: String,
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub reason: Option<String>,
}

/// `?tenant=&asOf=` on SLA reads
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaQuery {
    pub tenant: Uuid,
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub id: ApprovalId,
    pub tenant_id: TenantId,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub entity_name: Option<String>,
    pub amount: Money,
    pub status: ApprovalStatus,
    pub priority: Priority,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub assigned_to: Option<String>,
    pub due_date: DateTime<Utc>,
    pub sla_hours: u32,
    pub decision: Option<ApprovalDecision>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<Approval> for ApprovalResponse {
    fn from(approval: Approval) -> Self {
        Self {
            id: approval.id,
            tenant_id: approval.tenant_id,
            entity_type: approval.entity_type,
            entity_id: approval.entity_id,
            entity_name: approval.entity_name,
            amount: approval.amount,
            status: approval.status,
            priority: approval.priority,
            requested_by: approval.requested_by,
            requested_at: approval.requested_at,
            assigned_to: approval.assigned_to,
            due_date: approval.due_date,
            sla_hours: approval.sla_hours,
            decision: approval.decision,
            version: approval.version,
            updated_at: approval.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaResponse {
    pub approval_id: ApprovalId,
    pub as_of: DateTime<Utc>,
    #[serde(flatten)]
    pub sla: SlaStatus,
    pub state: SlaState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntryResponse {
    pub approval: ApprovalResponse,
    pub sla: SlaStatus,
    pub state: SlaState,
}

impl From<QueueEntry> for QueueEntryResponse {
    fn from(entry: QueueEntry) -> Self {
        Self {
            approval: entry.approval.into(),
            sla: entry.sla,
            state: entry.state,
        }
    }
}
