//! Reconciliation Reporter
//!
//! Summarises deductions against claims for a customer over a date window:
//! totals on both sides, the variance between them, the share of deductions
//! that have been matched, and the aging of deductions still outstanding.
//! Reports are pure reads of the ledger.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument};

use core_kernel::{Currency, CustomerId, DateRange, Money, TenantId, Timezone};
use domain_claims::Claim;
use domain_deductions::Deduction;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ports::{ClaimQuery, DeductionQuery, LedgerPort};

/// Selection for one report
#[derive(Debug, Clone)]
pub struct ReconciliationQuery {
    /// `None` reports across all customers
    pub customer_id: Option<CustomerId>,
    /// Inclusive window over claim and deduction dates
    pub period: DateRange,
    /// Aging reference instant; defaults to now
    pub as_of: Option<DateTime<Utc>>,
    /// Restricts both sides to one currency
    pub currency: Option<Currency>,
}

impl ReconciliationQuery {
    pub fn for_customer(customer_id: CustomerId, period: DateRange) -> Self {
        Self {
            customer_id: Some(customer_id),
            period,
            as_of: None,
            currency: None,
        }
    }
}

/// Aging band of an outstanding deduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgingBand {
    #[serde(rename = "0-30")]
    Current,
    #[serde(rename = "31-60")]
    Days31To60,
    #[serde(rename = "61-90")]
    Days61To90,
    #[serde(rename = "90+")]
    Over90,
}

impl AgingBand {
    pub const ALL: [AgingBand; 4] = [
        AgingBand::Current,
        AgingBand::Days31To60,
        AgingBand::Days61To90,
        AgingBand::Over90,
    ];

    /// Band for an age in calendar days; future-dated deductions count as current
    pub fn for_age(days: i64) -> Self {
        match days {
            i64::MIN..=30 => AgingBand::Current,
            31..=60 => AgingBand::Days31To60,
            61..=90 => AgingBand::Days61To90,
            _ => AgingBand::Over90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBand::Current => "0-30",
            AgingBand::Days31To60 => "31-60",
            AgingBand::Days61To90 => "61-90",
            AgingBand::Over90 => "90+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingBucket {
    pub band: AgingBand,
    pub count: u64,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionTotals {
    pub count: u64,
    pub total_amount: Money,
    pub matched_count: u64,
    /// Deductions with a remaining balance
    pub unmatched_count: u64,
    pub total_matched: Money,
    pub total_remaining: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTotals {
    pub count: u64,
    pub total_claimed: Money,
    /// Claims carrying at least one allocation
    pub matched_count: u64,
    pub unmatched_count: u64,
}

/// Reconciliation position for one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub tenant_id: TenantId,
    pub customer_id: Option<CustomerId>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub as_of: DateTime<Utc>,
    pub currency: Currency,
    pub deductions: DeductionTotals,
    pub claims: ClaimTotals,
    /// Total claimed minus total deducted
    pub variance: Money,
    /// Variance over total deducted, in percent to 2 places
    pub variance_percent: Decimal,
    /// Matched deductions over all deductions, to 4 places
    pub match_rate: Decimal,
    pub aging: Vec<AgingBucket>,
}

/// Builds [`ReconciliationReport`]s from the ledger
#[derive(Clone)]
pub struct ReconciliationReporter {
    ledger: Arc<dyn LedgerPort>,
    timezone: Timezone,
    default_currency: Currency,
}

impl ReconciliationReporter {
    pub fn new(ledger: Arc<dyn LedgerPort>, config: &EngineConfig) -> Self {
        Self {
            ledger,
            timezone: config.reporting_timezone,
            default_currency: config.default_currency,
        }
    }

    /// Reports on the deductions and claims selected by `query`
    ///
    /// # Errors
    ///
    /// `Validation` when the window holds more than one currency and the
    /// query does not pick one
    #[instrument(skip(self, query), fields(customer_id = ?query.customer_id))]
    pub async fn reconcile(
        &self,
        tenant_id: TenantId,
        query: &ReconciliationQuery,
    ) -> Result<ReconciliationReport, EngineError> {
        let deductions = self
            .ledger
            .find_deductions(
                tenant_id,
                &DeductionQuery {
                    customer_id: query.customer_id,
                    deduction_dates: Some(query.period),
                    currency: query.currency,
                    ..Default::default()
                },
            )
            .await?;
        let claims = self
            .ledger
            .find_claims(
                tenant_id,
                &ClaimQuery {
                    customer_id: query.customer_id,
                    claim_dates: Some(query.period),
                    currency: query.currency,
                    ..Default::default()
                },
            )
            .await?;

        let currency = match query.currency {
            Some(currency) => currency,
            None => self.single_currency(&deductions, &claims)?,
        };
        let as_of = query.as_of.unwrap_or_else(Utc::now);

        let deduction_totals = deduction_totals(currency, &deductions)?;
        let claim_totals = claim_totals(currency, &claims)?;
        let variance = claim_totals
            .total_claimed
            .checked_sub(&deduction_totals.total_amount)?;

        let report = ReconciliationReport {
            tenant_id,
            customer_id: query.customer_id,
            period_start: query.period.start(),
            period_end: query.period.end(),
            as_of,
            currency,
            variance_percent: percent_of(variance.amount(), deduction_totals.total_amount.amount()),
            match_rate: ratio(deduction_totals.matched_count, deduction_totals.count),
            aging: self.aging(currency, &deductions, as_of)?,
            variance,
            deductions: deduction_totals,
            claims: claim_totals,
        };

        debug!(
            deductions = report.deductions.count,
            claims = report.claims.count,
            variance = %report.variance,
            "reconciliation report built"
        );
        Ok(report)
    }

    fn single_currency(&self, deductions: &[Deduction], claims: &[Claim]) -> Result<Currency, EngineError> {
        let currencies: BTreeSet<Currency> = deductions
            .iter()
            .map(|d| d.currency)
            .chain(claims.iter().map(|c| c.currency))
            .collect();

        if currencies.len() > 1 {
            return Err(EngineError::Validation(format!(
                "window mixes currencies ({}); filter by currency",
                currencies.iter().map(Currency::code).collect::<Vec<_>>().join(", ")
            )));
        }
        Ok(currencies.into_iter().next().unwrap_or(self.default_currency))
    }

    fn aging(
        &self,
        currency: Currency,
        deductions: &[Deduction],
        as_of: DateTime<Utc>,
    ) -> Result<Vec<AgingBucket>, EngineError> {
        let mut buckets: Vec<AgingBucket> = AgingBand::ALL
            .iter()
            .map(|band| AgingBucket {
                band: *band,
                count: 0,
                amount: Money::zero(currency),
            })
            .collect();

        for deduction in deductions.iter().filter(|d| d.is_outstanding()) {
            let age = self.timezone.calendar_days_since(deduction.deduction_date, as_of);
            let band = AgingBand::for_age(age);
            if let Some(bucket) = buckets.iter_mut().find(|b| b.band == band) {
                bucket.count += 1;
                bucket.amount = bucket.amount.checked_add(&deduction.remaining_amount)?;
            }
        }
        Ok(buckets)
    }
}

fn deduction_totals(currency: Currency, deductions: &[Deduction]) -> Result<DeductionTotals, EngineError> {
    let unmatched_count = deductions
        .iter()
        .filter(|d| d.remaining_amount.is_positive())
        .count() as u64;
    let count = deductions.len() as u64;

    Ok(DeductionTotals {
        count,
        total_amount: Money::sum(currency, deductions.iter().map(|d| &d.deduction_amount))?,
        matched_count: count - unmatched_count,
        unmatched_count,
        total_matched: Money::sum(currency, deductions.iter().map(|d| &d.matched_amount))?,
        total_remaining: Money::sum(currency, deductions.iter().map(|d| &d.remaining_amount))?,
    })
}

fn claim_totals(currency: Currency, claims: &[Claim]) -> Result<ClaimTotals, EngineError> {
    let matched_count = claims.iter().filter(|c| c.has_allocations()).count() as u64;
    let count = claims.len() as u64;

    Ok(ClaimTotals {
        count,
        total_claimed: Money::sum(currency, claims.iter().map(|c| &c.claimed_amount))?,
        matched_count,
        unmatched_count: count - matched_count,
    })
}

/// `part / whole * 100` to 2 places, or 0 for an empty whole
fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * dec!(100)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn ratio(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) / Decimal::from(whole))
        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}
