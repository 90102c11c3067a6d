//! SLA Tracker
//!
//! Ledger-backed views over approval SLAs: the status of one approval, the
//! priority-ordered work queue, and the approvals already past due.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use core_kernel::{ApprovalId, TenantId};
use domain_approvals::{compute_sla, overdue, priority_queue, Approval, SlaState, SlaStatus};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ports::{ApprovalQuery, LedgerPort};

/// A pending approval with its SLA position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub approval: Approval,
    pub sla: SlaStatus,
    pub state: SlaState,
}

#[derive(Clone)]
pub struct SlaTracker {
    ledger: Arc<dyn LedgerPort>,
    warning_percent: Decimal,
}

impl SlaTracker {
    pub fn new(ledger: Arc<dyn LedgerPort>, config: &EngineConfig) -> Self {
        Self {
            ledger,
            warning_percent: config.sla_warning_percent,
        }
    }

    /// SLA status of one approval at `as_of`
    #[instrument(skip(self))]
    pub async fn approval_sla(
        &self,
        tenant_id: TenantId,
        id: ApprovalId,
        as_of: DateTime<Utc>,
    ) -> Result<SlaStatus, EngineError> {
        let approval = self.ledger.get_approval(tenant_id, id).await?;
        Ok(compute_sla(&approval, as_of))
    }

    /// Pending approvals in work order, each with its SLA position
    #[instrument(skip(self))]
    pub async fn work_queue(&self, tenant_id: TenantId, as_of: DateTime<Utc>) -> Result<Vec<QueueEntry>, EngineError> {
        let pending = self.ledger.find_approvals(tenant_id, &ApprovalQuery::pending()).await?;

        Ok(priority_queue(pending)
            .into_iter()
            .map(|approval| {
                let sla = compute_sla(&approval, as_of);
                QueueEntry {
                    state: sla.state(self.warning_percent),
                    sla,
                    approval,
                }
            })
            .collect())
    }

    /// Pending approvals past due at `as_of`, most overdue first
    #[instrument(skip(self))]
    pub async fn overdue_approvals(
        &self,
        tenant_id: TenantId,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Approval>, EngineError> {
        let pending = self.ledger.find_approvals(tenant_id, &ApprovalQuery::pending()).await?;
        Ok(overdue(pending, as_of))
    }
}
