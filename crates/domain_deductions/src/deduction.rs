//! Deduction aggregate

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use core_kernel::{Currency, CustomerId, DeductionId, MatchId, Money, TenantId};
use crate::error::DeductionError;

/// Deduction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionStatus {
    Open,
    UnderReview,
    /// Accepted as valid without a matching claim
    Approved,
    /// Contested with the customer
    Disputed,
    /// Fully covered by claim allocations
    Matched,
    WrittenOff,
}

impl DeductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeductionStatus::Open => "open",
            DeductionStatus::UnderReview => "under_review",
            DeductionStatus::Approved => "approved",
            DeductionStatus::Disputed => "disputed",
            DeductionStatus::Matched => "matched",
            DeductionStatus::WrittenOff => "written_off",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeductionStatus::Matched | DeductionStatus::WrittenOff)
    }

    /// Statuses with an edge to `matched`
    pub fn accepts_allocation(&self) -> bool {
        matches!(
            self,
            DeductionStatus::Open | DeductionStatus::UnderReview | DeductionStatus::Disputed
        )
    }

    /// Checks the deduction transition graph
    pub fn can_transition_to(&self, target: DeductionStatus) -> bool {
        use DeductionStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, target),
            (Open, UnderReview) |
            (UnderReview, Approved) |
            (UnderReview, Disputed) |
            (Open, Matched) |
            (UnderReview, Matched) |
            (Disputed, Matched) |
            (_, WrittenOff)
        )
    }
}

impl fmt::Display for DeductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeductionStatus {
    type Err = DeductionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(DeductionStatus::Open),
            "under_review" => Ok(DeductionStatus::UnderReview),
            "approved" => Ok(DeductionStatus::Approved),
            "disputed" => Ok(DeductionStatus::Disputed),
            "matched" => Ok(DeductionStatus::Matched),
            "written_off" => Ok(DeductionStatus::WrittenOff),
            other => Err(DeductionError::Validation(format!("unknown deduction status `{other}`"))),
        }
    }
}

/// Reason category for a deduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    Promotional,
    Pricing,
    Shortage,
    Damage,
    Return,
    Compliance,
    Other,
}

impl DeductionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeductionType::Promotional => "promotional",
            DeductionType::Pricing => "pricing",
            DeductionType::Shortage => "shortage",
            DeductionType::Damage => "damage",
            DeductionType::Return => "return",
            DeductionType::Compliance => "compliance",
            DeductionType::Other => "other",
        }
    }
}

impl FromStr for DeductionType {
    type Err = DeductionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "promotional" => Ok(DeductionType::Promotional),
            "pricing" => Ok(DeductionType::Pricing),
            "shortage" => Ok(DeductionType::Shortage),
            "damage" => Ok(DeductionType::Damage),
            "return" => Ok(DeductionType::Return),
            "compliance" => Ok(DeductionType::Compliance),
            "other" => Ok(DeductionType::Other),
            other => Err(DeductionError::Validation(format!("unknown deduction type `{other}`"))),
        }
    }
}

/// The decision recorded on a deduction outside of matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeductionDecision {
    Approved {
        by: String,
        at: DateTime<Utc>,
    },
    Disputed {
        by: String,
        at: DateTime<Utc>,
        reason: String,
    },
    WrittenOff {
        by: String,
        at: DateTime<Utc>,
        reason: Option<String>,
    },
}

/// Input for recording a deduction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeduction {
    pub tenant_id: TenantId,
    pub deduction_type: DeductionType,
    pub customer_id: Option<CustomerId>,
    pub invoice_reference: String,
    pub deduction_amount: Money,
    pub deduction_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub reason_code: Option<String>,
    pub reason_description: Option<String>,
}

impl NewDeduction {
    pub fn validate(&self) -> Result<CustomerId, DeductionError> {
        let customer_id = self
            .customer_id
            .ok_or_else(|| DeductionError::Validation("customer is required".into()))?;
        if !self.deduction_amount.is_positive() {
            return Err(DeductionError::Validation("deduction amount must be positive".into()));
        }
        self.deduction_amount
            .ensure_storable()
            .map_err(|e| DeductionError::Validation(e.to_string()))?;
        if self.invoice_reference.trim().is_empty() {
            return Err(DeductionError::Validation("invoice reference is required".into()));
        }
        Ok(customer_id)
    }
}

/// An amount a customer withheld from an invoice payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub id: DeductionId,
    pub tenant_id: TenantId,
    /// Human readable number, `DED-YYYY-NNNNNNN`
    pub deduction_number: String,
    pub deduction_type: DeductionType,
    pub customer_id: CustomerId,
    pub invoice_reference: String,
    pub deduction_amount: Money,
    /// Allocated to claims so far; never decreases
    pub matched_amount: Money,
    /// Always `deduction_amount - matched_amount`
    pub remaining_amount: Money,
    pub currency: Currency,
    pub deduction_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub reason_code: Option<String>,
    pub reason_description: Option<String>,
    pub status: DeductionStatus,
    pub match_ids: Vec<MatchId>,
    pub decision: Option<DeductionDecision>,
    /// Optimistic concurrency version
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deduction {
    /// Records an open deduction from validated input
    pub fn create(input: NewDeduction, now: DateTime<Utc>) -> Result<Self, DeductionError> {
        let customer_id = input.validate()?;
        let id = DeductionId::new_v7();
        let currency = input.deduction_amount.currency();

        Ok(Self {
            deduction_number: generate_deduction_number(&id, input.deduction_date),
            id,
            tenant_id: input.tenant_id,
            deduction_type: input.deduction_type,
            customer_id,
            invoice_reference: input.invoice_reference,
            deduction_amount: input.deduction_amount,
            matched_amount: Money::zero(currency),
            remaining_amount: input.deduction_amount,
            currency,
            deduction_date: input.deduction_date,
            due_date: input.due_date,
            reason_code: input.reason_code,
            reason_description: input.reason_description,
            status: DeductionStatus::Open,
            match_ids: Vec::new(),
            decision: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn review(&mut self, now: DateTime<Utc>) -> Result<(), DeductionError> {
        self.transition(DeductionStatus::UnderReview, now)
    }

    pub fn approve(&mut self, actor: &str, now: DateTime<Utc>) -> Result<(), DeductionError> {
        self.transition(DeductionStatus::Approved, now)?;
        self.decision = Some(DeductionDecision::Approved {
            by: actor.to_string(),
            at: now,
        });
        Ok(())
    }

    pub fn dispute(&mut self, reason: &str, actor: &str, now: DateTime<Utc>) -> Result<(), DeductionError> {
        if reason.trim().is_empty() {
            return Err(DeductionError::Validation("dispute reason is required".into()));
        }
        self.transition(DeductionStatus::Disputed, now)?;
        self.decision = Some(DeductionDecision::Disputed {
            by: actor.to_string(),
            at: now,
            reason: reason.to_string(),
        });
        Ok(())
    }

    pub fn write_off(&mut self, reason: Option<String>, actor: &str, now: DateTime<Utc>) -> Result<(), DeductionError> {
        self.transition(DeductionStatus::WrittenOff, now)?;
        self.decision = Some(DeductionDecision::WrittenOff {
            by: actor.to_string(),
            at: now,
            reason,
        });
        Ok(())
    }

    /// Nothing allocated yet
    pub fn is_unmatched(&self) -> bool {
        self.matched_amount.is_zero()
    }

    /// Still carries an unresolved balance
    pub fn is_outstanding(&self) -> bool {
        self.remaining_amount.is_positive() && self.status != DeductionStatus::WrittenOff
    }

    /// Allocates `amount` of this deduction to a claim
    ///
    /// Amount checks come before the status check, so a fully matched
    /// deduction reports an invalid allocation rather than a bad state.
    /// Reaching a zero remaining balance moves the deduction to `Matched`.
    pub fn allocate(
        &mut self,
        match_id: MatchId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), DeductionError> {
        if amount.currency() != self.currency {
            return Err(DeductionError::InvalidAllocation(format!(
                "allocation currency {} differs from deduction currency {}",
                amount.currency(),
                self.currency
            )));
        }
        if !amount.is_positive() {
            return Err(DeductionError::InvalidAllocation("amount must be positive".into()));
        }
        if amount.checked_cmp(&self.remaining_amount)? == Ordering::Greater {
            return Err(DeductionError::InvalidAllocation(format!(
                "amount {} exceeds remaining {}",
                amount, self.remaining_amount
            )));
        }
        if !self.status.accepts_allocation() {
            return Err(DeductionError::NotMatchable(self.status.to_string()));
        }

        self.matched_amount = self.matched_amount.checked_add(&amount)?;
        self.remaining_amount = self.deduction_amount.checked_sub(&self.matched_amount)?;
        self.match_ids.push(match_id);
        self.updated_at = now;
        if self.remaining_amount.is_zero() {
            self.status = DeductionStatus::Matched;
        }
        Ok(())
    }

    fn transition(&mut self, target: DeductionStatus, now: DateTime<Utc>) -> Result<(), DeductionError> {
        if !self.status.can_transition_to(target) {
            return Err(DeductionError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }
}

fn generate_deduction_number(id: &DeductionId, deduction_date: NaiveDate) -> String {
    let sequence = id.as_uuid().as_u128() % 10_000_000;
    format!("DED-{}-{:07}", deduction_date.year(), sequence)
}
