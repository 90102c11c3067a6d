//! Audit trail DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use core_kernel::{AuditEntry, AuditEventId, AuditedEntity, Money};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryResponse {
    pub id: AuditEventId,
    pub entity: AuditedEntity,
    pub entity_id: Uuid,
    pub action: String,
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor: String,
    pub reason: Option<String>,
    pub amount: Option<Money>,
    pub recorded_at: DateTime<Utc>,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            entity: entry.entity,
            entity_id: entry.entity_id,
            action: entry.action,
            from_status: entry.from_status,
            to_status: entry.to_status,
            actor: entry.actor,
            reason: entry.reason,
            amount: entry.amount,
            recorded_at: entry.recorded_at,
        }
    }
}
