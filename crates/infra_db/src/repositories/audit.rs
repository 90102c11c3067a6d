//! Append-only audit log

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{AuditEntry, AuditEventId, Money, TenantId};

use super::{parse_currency, parse_enum};
use crate::error::DatabaseError;

/// An audit_log row as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entity: String,
    pub entity_id: Uuid,
    pub action: String,
    pub from_status: Option<String>,
    pub to_status: String,
    pub actor: String,
    pub reason: Option<String>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = DatabaseError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let amount = match (row.amount, row.currency.as_deref()) {
            (Some(amount), Some(code)) => Some(Money::new(amount, parse_currency(code)?)),
            (None, _) => None,
            (Some(_), None) => {
                return Err(DatabaseError::serialization(format!(
                    "audit entry {} has an amount without a currency",
                    row.id
                )))
            }
        };

        Ok(AuditEntry {
            id: AuditEventId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            entity: parse_enum(&row.entity)?,
            entity_id: row.entity_id,
            action: row.action,
            from_status: row.from_status,
            to_status: row.to_status,
            actor: row.actor,
            reason: row.reason,
            amount,
            recorded_at: row.recorded_at,
        })
    }
}

/// Repository for the `audit_log` table
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, conn: &mut PgConnection, entry: &AuditEntry) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (
                id, tenant_id, entity, entity_id, action, from_status, to_status,
                actor, reason, amount, currency, recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.tenant_id.as_uuid())
        .bind(entry.entity.as_str())
        .bind(entry.entity_id)
        .bind(&entry.action)
        .bind(&entry.from_status)
        .bind(&entry.to_status)
        .bind(&entry.actor)
        .bind(&entry.reason)
        .bind(entry.amount.map(|m| m.amount()))
        .bind(entry.amount.map(|m| m.currency().code()))
        .bind(entry.recorded_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Entries for one entity in insertion order
    pub async fn list_for_entity(&self, tenant_id: TenantId, entity_id: Uuid) -> Result<Vec<AuditEntry>, DatabaseError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, tenant_id, entity, entity_id, action, from_status, to_status,
                   actor, reason, amount, currency, recorded_at
            FROM audit_log
            WHERE tenant_id = $1 AND entity_id = $2
            ORDER BY seq
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}
