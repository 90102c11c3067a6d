//! Deductions and match rows

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{ClaimId, CustomerId, DeductionId, MatchId, Money, TenantId};
use domain_deductions::{Deduction, DeductionDecision, Match};
use domain_reconciliation::{DeductionQuery, MatchQuery};

use super::{parse_currency, parse_enum};
use crate::error::DatabaseError;

const DEDUCTION_COLUMNS: &str = r#"
    id, tenant_id, deduction_number, deduction_type, customer_id, invoice_reference,
    deduction_amount, matched_amount, remaining_amount, currency,
    deduction_date, due_date, reason_code, reason_description, status,
    match_ids, decision, version, created_at, updated_at
"#;

/// A deductions row as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeductionRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub deduction_number: String,
    pub deduction_type: String,
    pub customer_id: Uuid,
    pub invoice_reference: String,
    pub deduction_amount: Decimal,
    pub matched_amount: Decimal,
    pub remaining_amount: Decimal,
    pub currency: String,
    pub deduction_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub reason_code: Option<String>,
    pub reason_description: Option<String>,
    pub status: String,
    pub match_ids: Vec<Uuid>,
    pub decision: Option<Json<DeductionDecision>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DeductionRow> for Deduction {
    type Error = DatabaseError;

    fn try_from(row: DeductionRow) -> Result<Self, Self::Error> {
        let currency = parse_currency(&row.currency)?;
        Ok(Deduction {
            id: DeductionId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            deduction_number: row.deduction_number,
            deduction_type: parse_enum(&row.deduction_type)?,
            customer_id: CustomerId::from_uuid(row.customer_id),
            invoice_reference: row.invoice_reference,
            deduction_amount: Money::new(row.deduction_amount, currency),
            matched_amount: Money::new(row.matched_amount, currency),
            remaining_amount: Money::new(row.remaining_amount, currency),
            currency,
            deduction_date: row.deduction_date,
            due_date: row.due_date,
            reason_code: row.reason_code,
            reason_description: row.reason_description,
            status: parse_enum(&row.status)?,
            match_ids: row.match_ids.into_iter().map(MatchId::from_uuid).collect(),
            decision: row.decision.map(|d| d.0),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A deduction_matches row as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub deduction_id: Uuid,
    pub claim_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub matched_by: String,
    pub matched_at: DateTime<Utc>,
}

impl TryFrom<MatchRow> for Match {
    type Error = DatabaseError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        Ok(Match {
            id: MatchId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            deduction_id: DeductionId::from_uuid(row.deduction_id),
            claim_id: ClaimId::from_uuid(row.claim_id),
            amount: Money::new(row.amount, parse_currency(&row.currency)?),
            matched_at: row.matched_at,
            method: parse_enum(&row.method)?,
            matched_by: row.matched_by,
        })
    }
}

/// Repository for the `deductions` and `deduction_matches` tables
#[derive(Debug, Clone)]
pub struct DeductionRepository {
    pool: PgPool,
}

impl DeductionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, tenant_id: TenantId, id: DeductionId) -> Result<Option<Deduction>, DatabaseError> {
        let row = sqlx::query_as::<_, DeductionRow>(&format!(
            "SELECT {DEDUCTION_COLUMNS} FROM deductions WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Deduction::try_from).transpose()
    }

    /// Finds deductions matching the query, oldest first
    pub async fn find(
        &self,
        tenant_id: TenantId,
        query: &DeductionQuery,
    ) -> Result<Vec<Deduction>, DatabaseError> {
        let statuses: Vec<String> = query.statuses.iter().map(|s| s.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, DeductionRow>(&format!(
            r#"
            SELECT {DEDUCTION_COLUMNS} FROM deductions
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND (cardinality($3::text[]) = 0 OR status = ANY($3))
              AND ($4::date IS NULL OR deduction_date >= $4)
              AND ($5::date IS NULL OR deduction_date <= $5)
              AND ($6::text IS NULL OR currency = $6)
            ORDER BY created_at, id
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(query.customer_id.map(Uuid::from))
        .bind(&statuses)
        .bind(query.deduction_dates.map(|r| r.start()))
        .bind(query.deduction_dates.map(|r| r.end()))
        .bind(query.currency.map(|c| c.code()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Deduction::try_from).collect()
    }

    pub async fn insert(&self, conn: &mut PgConnection, deduction: &Deduction) -> Result<Deduction, DatabaseError> {
        let row = sqlx::query_as::<_, DeductionRow>(&format!(
            r#"
            INSERT INTO deductions (
                id, tenant_id, deduction_number, deduction_type, customer_id, invoice_reference,
                deduction_amount, matched_amount, remaining_amount, currency,
                deduction_date, due_date, reason_code, reason_description, status,
                match_ids, decision, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING {DEDUCTION_COLUMNS}
            "#
        ))
        .bind(deduction.id.as_uuid())
        .bind(deduction.tenant_id.as_uuid())
        .bind(&deduction.deduction_number)
        .bind(deduction.deduction_type.as_str())
        .bind(deduction.customer_id.as_uuid())
        .bind(&deduction.invoice_reference)
        .bind(deduction.deduction_amount.amount())
        .bind(deduction.matched_amount.amount())
        .bind(deduction.remaining_amount.amount())
        .bind(deduction.currency.code())
        .bind(deduction.deduction_date)
        .bind(deduction.due_date)
        .bind(&deduction.reason_code)
        .bind(&deduction.reason_description)
        .bind(deduction.status.as_str())
        .bind(match_uuids(deduction))
        .bind(deduction.decision.as_ref().map(Json))
        .bind(deduction.version)
        .bind(deduction.created_at)
        .bind(deduction.updated_at)
        .fetch_one(conn)
        .await?;

        Deduction::try_from(row)
    }

    /// Replaces the mutable columns if the stored version equals
    /// `deduction.version`, bumping it
    pub async fn update(&self, conn: &mut PgConnection, deduction: &Deduction) -> Result<Deduction, DatabaseError> {
        let row = sqlx::query_as::<_, DeductionRow>(&format!(
            r#"
            UPDATE deductions SET
                matched_amount = $4,
                remaining_amount = $5,
                due_date = $6,
                reason_code = $7,
                reason_description = $8,
                status = $9,
                match_ids = $10,
                decision = $11,
                updated_at = $12,
                version = version + 1
            WHERE id = $1 AND tenant_id = $2 AND version = $3
            RETURNING {DEDUCTION_COLUMNS}
            "#
        ))
        .bind(deduction.id.as_uuid())
        .bind(deduction.tenant_id.as_uuid())
        .bind(deduction.version)
        .bind(deduction.matched_amount.amount())
        .bind(deduction.remaining_amount.amount())
        .bind(deduction.due_date)
        .bind(&deduction.reason_code)
        .bind(&deduction.reason_description)
        .bind(deduction.status.as_str())
        .bind(match_uuids(deduction))
        .bind(deduction.decision.as_ref().map(Json))
        .bind(deduction.updated_at)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Deduction::try_from(row),
            None => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS (SELECT 1 FROM deductions WHERE id = $1 AND tenant_id = $2)",
                )
                .bind(deduction.id.as_uuid())
                .bind(deduction.tenant_id.as_uuid())
                .fetch_one(conn)
                .await?;

                if exists {
                    Err(DatabaseError::conflict("Deduction", deduction.id, deduction.version))
                } else {
                    Err(DatabaseError::not_found("Deduction", deduction.id))
                }
            }
        }
    }

    pub async fn insert_match(&self, conn: &mut PgConnection, allocation: &Match) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO deduction_matches (
                id, tenant_id, deduction_id, claim_id, amount, currency,
                method, matched_by, matched_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(allocation.id.as_uuid())
        .bind(allocation.tenant_id.as_uuid())
        .bind(allocation.deduction_id.as_uuid())
        .bind(allocation.claim_id.as_uuid())
        .bind(allocation.amount.amount())
        .bind(allocation.amount.currency().code())
        .bind(allocation.method.as_str())
        .bind(&allocation.matched_by)
        .bind(allocation.matched_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Match rows in allocation order
    pub async fn find_matches(&self, tenant_id: TenantId, query: &MatchQuery) -> Result<Vec<Match>, DatabaseError> {
        let rows = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, tenant_id, deduction_id, claim_id, amount, currency,
                   method, matched_by, matched_at
            FROM deduction_matches
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR deduction_id = $2)
              AND ($3::uuid IS NULL OR claim_id = $3)
            ORDER BY matched_at, id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(query.deduction_id.map(Uuid::from))
        .bind(query.claim_id.map(Uuid::from))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Match::try_from).collect()
    }
}

fn match_uuids(deduction: &Deduction) -> Vec<Uuid> {
    deduction.match_ids.iter().map(|id| *id.as_uuid()).collect()
}
