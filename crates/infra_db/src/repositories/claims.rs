//! Claims repository
//!
//! Reads go straight to the pool. Writes take a connection so the adapter
//! can put them in the same transaction as the matching audit rows.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{ClaimId, CustomerId, DeductionId, Money, TenantId};
use domain_claims::{Claim, ClaimDecision, SupportingDetails};
use domain_reconciliation::ClaimQuery;

use super::{optional_money, parse_currency, parse_enum};
use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = r#"
    id, tenant_id, claim_number, claim_type, customer_id,
    claimed_amount, approved_amount, settled_amount, matched_amount, currency,
    claim_date, due_date, status, created_by, deduction_ids,
    supporting, decision, version, created_at, updated_at
"#;

/// A claims row as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub claim_number: String,
    pub claim_type: String,
    pub customer_id: Uuid,
    pub claimed_amount: Decimal,
    pub approved_amount: Option<Decimal>,
    pub settled_amount: Option<Decimal>,
    pub matched_amount: Decimal,
    pub currency: String,
    pub claim_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub created_by: String,
    pub deduction_ids: Vec<Uuid>,
    pub supporting: Json<SupportingDetails>,
    pub decision: Option<Json<ClaimDecision>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for Claim {
    type Error = DatabaseError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        let currency = parse_currency(&row.currency)?;
        Ok(Claim {
            id: ClaimId::from_uuid(row.id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            claim_number: row.claim_number,
            claim_type: parse_enum(&row.claim_type)?,
            customer_id: CustomerId::from_uuid(row.customer_id),
            claimed_amount: Money::new(row.claimed_amount, currency),
            approved_amount: optional_money(row.approved_amount, currency),
            settled_amount: optional_money(row.settled_amount, currency),
            matched_amount: Money::new(row.matched_amount, currency),
            currency,
            claim_date: row.claim_date,
            due_date: row.due_date,
            status: parse_enum(&row.status)?,
            created_by: row.created_by,
            deduction_ids: row.deduction_ids.into_iter().map(DeductionId::from_uuid).collect(),
            supporting: row.supporting.0,
            decision: row.decision.map(|d| d.0),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for the `claims` table
#[derive(Debug, Clone)]
pub struct ClaimRepository {
    pool: PgPool,
}

impl ClaimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a claim within a tenant
    pub async fn get(&self, tenant_id: TenantId, id: ClaimId) -> Result<Option<Claim>, DatabaseError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Claim::try_from).transpose()
    }

    /// Finds claims matching the query, oldest first
    ///
    /// Unset filters are passed as NULL (or an empty status array) and
    /// match everything.
    pub async fn find(&self, tenant_id: TenantId, query: &ClaimQuery) -> Result<Vec<Claim>, DatabaseError> {
        let statuses: Vec<String> = query.statuses.iter().map(|s| s.as_str().to_string()).collect();

        let rows = sqlx::query_as::<_, ClaimRow>(&format!(
            r#"
            SELECT {CLAIM_COLUMNS} FROM claims
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND (cardinality($3::text[]) = 0 OR status = ANY($3))
              AND ($4::date IS NULL OR claim_date >= $4)
              AND ($5::date IS NULL OR claim_date <= $5)
              AND ($6::text IS NULL OR currency = $6)
            ORDER BY created_at, id
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(query.customer_id.map(Uuid::from))
        .bind(&statuses)
        .bind(query.claim_dates.map(|r| r.start()))
        .bind(query.claim_dates.map(|r| r.end()))
        .bind(query.currency.map(|c| c.code()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Claim::try_from).collect()
    }

    pub async fn insert(&self, conn: &mut PgConnection, claim: &Claim) -> Result<Claim, DatabaseError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            r#"
            INSERT INTO claims (
                id, tenant_id, claim_number, claim_type, customer_id,
                claimed_amount, approved_amount, settled_amount, matched_amount, currency,
                claim_date, due_date, status, created_by, deduction_ids,
                supporting, decision, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING {CLAIM_COLUMNS}
            "#
        ))
        .bind(claim.id.as_uuid())
        .bind(claim.tenant_id.as_uuid())
        .bind(&claim.claim_number)
        .bind(claim.claim_type.as_str())
        .bind(claim.customer_id.as_uuid())
        .bind(claim.claimed_amount.amount())
        .bind(claim.approved_amount.map(|m| m.amount()))
        .bind(claim.settled_amount.map(|m| m.amount()))
        .bind(claim.matched_amount.amount())
        .bind(claim.currency.code())
        .bind(claim.claim_date)
        .bind(claim.due_date)
        .bind(claim.status.as_str())
        .bind(&claim.created_by)
        .bind(deduction_uuids(claim))
        .bind(Json(&claim.supporting))
        .bind(claim.decision.as_ref().map(Json))
        .bind(claim.version)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .fetch_one(conn)
        .await?;

        Claim::try_from(row)
    }

    /// Replaces the mutable columns if the stored version equals `claim.version`
    ///
    /// # Returns
    ///
    /// The stored claim with its version bumped, `NotFound` if the claim does
    /// not exist in the tenant, or `Conflict` if the version moved
    pub async fn update(&self, conn: &mut PgConnection, claim: &Claim) -> Result<Claim, DatabaseError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            r#"
            UPDATE claims SET
                approved_amount = $4,
                settled_amount = $5,
                matched_amount = $6,
                due_date = $7,
                status = $8,
                deduction_ids = $9,
                supporting = $10,
                decision = $11,
                updated_at = $12,
                version = version + 1
            WHERE id = $1 AND tenant_id = $2 AND version = $3
            RETURNING {CLAIM_COLUMNS}
            "#
        ))
        .bind(claim.id.as_uuid())
        .bind(claim.tenant_id.as_uuid())
        .bind(claim.version)
        .bind(claim.approved_amount.map(|m| m.amount()))
        .bind(claim.settled_amount.map(|m| m.amount()))
        .bind(claim.matched_amount.amount())
        .bind(claim.due_date)
        .bind(claim.status.as_str())
        .bind(deduction_uuids(claim))
        .bind(Json(&claim.supporting))
        .bind(claim.decision.as_ref().map(Json))
        .bind(claim.updated_at)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Claim::try_from(row),
            None => Err(missing_or_stale(conn, claim).await),
        }
    }
}

fn deduction_uuids(claim: &Claim) -> Vec<Uuid> {
    claim.deduction_ids.iter().map(|id| *id.as_uuid()).collect()
}

async fn missing_or_stale(conn: &mut PgConnection, claim: &Claim) -> DatabaseError {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM claims WHERE id = $1 AND tenant_id = $2)",
    )
    .bind(claim.id.as_uuid())
    .bind(claim.tenant_id.as_uuid())
    .fetch_one(conn)
    .await;

    match exists {
        Ok(true) => DatabaseError::conflict("Claim", claim.id, claim.version),
        Ok(false) => DatabaseError::not_found("Claim", claim.id),
        Err(e) => e.into(),
    }
}
