//! Audit trail entries
//!
//! Every state-changing write against the ledger appends one [`AuditEntry`],
//! so a claim, deduction, or approval can be traced back through each
//! transition, who performed it, and why.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;
use crate::identifiers::{AuditEventId, TenantId};
use crate::money::Money;

/// The kind of ledger record an audit entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditedEntity {
    Claim,
    Deduction,
    Approval,
}

impl AuditedEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditedEntity::Claim => "claim",
            AuditedEntity::Deduction => "deduction",
            AuditedEntity::Approval => "approval",
        }
    }
}

impl fmt::Display for AuditedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditedEntity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claim" => Ok(AuditedEntity::Claim),
            "deduction" => Ok(AuditedEntity::Deduction),
            "approval" => Ok(AuditedEntity::Approval),
            other => Err(CoreError::validation(format!("unknown audited entity `{other}`"))),
        }
    }
}

/// One recorded change to a ledger entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEventId,
    pub tenant_id: TenantId,
    pub entity: AuditedEntity,
    pub entity_id: Uuid,
    /// Short verb such as `submit`, `approve`, `match`
    pub action: String,
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor: String,
    pub reason: Option<String>,
    pub amount: Option<Money>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry stamped with the current time
    pub fn new(
        tenant_id: TenantId,
        entity: AuditedEntity,
        entity_id: impl Into<Uuid>,
        action: impl Into<String>,
        to_status: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditEventId::new_v7(),
            tenant_id,
            entity,
            entity_id: entity_id.into(),
            action: action.into(),
            from_status: None,
            to_status: to_status.into(),
            actor: actor.into(),
            reason: None,
            amount: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn from_status(mut self, status: impl Into<String>) -> Self {
        self.from_status = Some(status.into());
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }
}
