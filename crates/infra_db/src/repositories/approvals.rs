//! Approvals repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{ApprovalId, Money, TenantId};
use domain_approvals::{Approval, ApprovalDecision};
use domain_reconciliation::ApprovalQuery;

use super::{parse_currency, parse_enum};
use crate::error::DatabaseError;

const APPROVAL_COLUMNS: &str = r#"
    id, tenant_id, entity_type, entity_id, entity_name, amount, currency,
    status, priority, requested_by, requested_at, assigned_to, due_date,
    sla_hours, decision, version, updated_at
"#;

/// An approvals row as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApprovalRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub entity_name: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub priority: String,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub assigned_to: Option<String>,
    pub due_date: DateTime<Utc>,
    pub sla_hours: i32,
    pub decision: Option<Json<ApprovalDecision>>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ApprovalRow> for Approval {
    type Error = DatabaseError;

    fn try_from(row: ApprovalRow) -> Result<Self, Self::Error> {
        let sla_hours = u32::try_from(row.sla_hours)
            .map_err(|_| DatabaseError::serialization(format!("negative sla_hours {}", row.sla_hours)))?;

        Ok(Approval {
            id: ApprovalId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            entity_type: parse_enum(&row.entity_type)?,
            entity_id: row.entity_id,
            entity_name: row.entity_name,
            amount: Money::new(row.amount, parse_currency(&row.currency)?),
            status: parse_enum(&row.status)?,
            priority: parse_enum(&row.priority)?,
            requested_by: row.requested_by,
            requested_at: row.requested_at,
            assigned_to: row.assigned_to,
            due_date: row.due_date,
            sla_hours,
            decision: row.decision.map(|d| d.0),
            version: row.version,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for the `approvals` table
#[derive(Debug, Clone)]
pub struct ApprovalRepository {
    pool: PgPool,
}

impl ApprovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, tenant_id: TenantId, id: ApprovalId) -> Result<Option<Approval>, DatabaseError> {
        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            "SELECT {APPROVAL_COLUMNS} FROM approvals WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Approval::try_from).transpose()
    }

    /// Finds approvals matching the query in request order
    pub async fn find(&self, tenant_id: TenantId, query: &ApprovalQuery) -> Result<Vec<Approval>, DatabaseError> {
        let statuses: Vec<String> = query.statuses.iter().map(|s| s.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            SELECT {APPROVAL_COLUMNS} FROM approvals
            WHERE tenant_id = $1
              AND (cardinality($2::text[]) = 0 OR status = ANY($2))
              AND ($3::text IS NULL OR entity_type = $3)
              AND ($4::uuid IS NULL OR entity_id = $4)
            ORDER BY requested_at, id
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(&statuses)
        .bind(query.entity_type.map(|t| t.as_str()))
        .bind(query.entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Approval::try_from).collect()
    }

    pub async fn insert(&self, conn: &mut PgConnection, approval: &Approval) -> Result<Approval, DatabaseError> {
        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            INSERT INTO approvals (
                id, tenant_id, entity_type, entity_id, entity_name, amount, currency,
                status, priority, requested_by, requested_at, assigned_to, due_date,
                sla_hours, decision, version, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {APPROVAL_COLUMNS}
            "#
        ))
        .bind(approval.id.as_uuid())
        .bind(approval.tenant_id.as_uuid())
        .bind(approval.entity_type.as_str())
        .bind(approval.entity_id)
        .bind(&approval.entity_name)
        .bind(approval.amount.amount())
        .bind(approval.amount.currency().code())
        .bind(approval.status.as_str())
        .bind(approval.priority.as_str())
        .bind(&approval.requested_by)
        .bind(approval.requested_at)
        .bind(&approval.assigned_to)
        .bind(approval.due_date)
        .bind(sla_hours_column(approval)?)
        .bind(approval.decision.as_ref().map(Json))
        .bind(approval.version)
        .bind(approval.updated_at)
        .fetch_one(conn)
        .await?;

        Approval::try_from(row)
    }

    /// Records a decision if the stored version equals `approval.version`
    pub async fn update(&self, conn: &mut PgConnection, approval: &Approval) -> Result<Approval, DatabaseError> {
        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            UPDATE approvals SET
                status = $4,
                assigned_to = $5,
                decision = $6,
                updated_at = $7,
                version = version + 1
            WHERE id = $1 AND tenant_id = $2 AND version = $3
            RETURNING {APPROVAL_COLUMNS}
            "#
        ))
        .bind(approval.id.as_uuid())
        .bind(approval.tenant_id.as_uuid())
        .bind(approval.version)
        .bind(approval.status.as_str())
        .bind(&approval.assigned_to)
        .bind(approval.decision.as_ref().map(Json))
        .bind(approval.updated_at)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(row) = row {
            return Approval::try_from(row);
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM approvals WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(approval.id.as_uuid())
        .bind(approval.tenant_id.as_uuid())
        .fetch_one(conn)
        .await?;

        Err(if exists {
            DatabaseError::conflict("Approval", approval.id, approval.version)
        } else {
            DatabaseError::not_found("Approval", approval.id)
        })
    }
}

fn sla_hours_column(approval: &Approval) -> Result<i32, DatabaseError> {
    i32::try_from(approval.sla_hours)
        .map_err(|_| DatabaseError::serialization(format!("sla_hours {} out of range", approval.sla_hours)))
}
