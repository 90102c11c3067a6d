//! Claim aggregate

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, Currency, CustomerId, DeductionId, Money, TenantId};
use crate::error::ClaimError;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Submitted by the customer, not yet picked up
    Pending,
    /// Being reviewed by an analyst
    UnderReview,
    /// Approved for the full claimed amount
    Approved,
    /// Approved for less than the claimed amount
    PartiallyApproved,
    /// Rejected
    Rejected,
    /// Paid out or credited
    Settled,
    /// Abandoned without settlement
    WrittenOff,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::UnderReview => "under_review",
            ClaimStatus::Approved => "approved",
            ClaimStatus::PartiallyApproved => "partially_approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Settled => "settled",
            ClaimStatus::WrittenOff => "written_off",
        }
    }

    /// Terminal statuses accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Rejected | ClaimStatus::Settled | ClaimStatus::WrittenOff
        )
    }

    /// Checks the claim transition graph
    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, target),
            (Pending, UnderReview) |
            (UnderReview, Approved) |
            (UnderReview, PartiallyApproved) |
            (UnderReview, Rejected) |
            (Approved, Settled) |
            (PartiallyApproved, Settled) |
            (_, WrittenOff)
        )
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClaimStatus::Pending),
            "under_review" => Ok(ClaimStatus::UnderReview),
            "approved" => Ok(ClaimStatus::Approved),
            "partially_approved" => Ok(ClaimStatus::PartiallyApproved),
            "rejected" => Ok(ClaimStatus::Rejected),
            "settled" => Ok(ClaimStatus::Settled),
            "written_off" => Ok(ClaimStatus::WrittenOff),
            other => Err(ClaimError::Validation(format!("unknown claim status `{other}`"))),
        }
    }
}

/// Kind of trade claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Promotion,
    Rebate,
    Allowance,
    Markdown,
    Damage,
    Return,
    Other,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Promotion => "promotion",
            ClaimType::Rebate => "rebate",
            ClaimType::Allowance => "allowance",
            ClaimType::Markdown => "markdown",
            ClaimType::Damage => "damage",
            ClaimType::Return => "return",
            ClaimType::Other => "other",
        }
    }
}

impl FromStr for ClaimType {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "promotion" => Ok(ClaimType::Promotion),
            "rebate" => Ok(ClaimType::Rebate),
            "allowance" => Ok(ClaimType::Allowance),
            "markdown" => Ok(ClaimType::Markdown),
            "damage" => Ok(ClaimType::Damage),
            "return" => Ok(ClaimType::Return),
            "other" => Ok(ClaimType::Other),
            other => Err(ClaimError::Validation(format!("unknown claim type `{other}`"))),
        }
    }
}

/// Optional references backing a claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportingDetails {
    pub promotion_id: Option<String>,
    pub rebate_id: Option<String>,
    pub invoice_reference: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

/// The decision recorded when a claim leaves review
///
/// A rejection reason only exists inside `Rejected`, so a claim in any other
/// state cannot carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimDecision {
    Approved {
        by: String,
        at: DateTime<Utc>,
        amount: Money,
    },
    Rejected {
        by: String,
        at: DateTime<Utc>,
        reason: String,
    },
    Settled {
        by: String,
        at: DateTime<Utc>,
        amount: Money,
    },
    WrittenOff {
        by: String,
        at: DateTime<Utc>,
        reason: Option<String>,
    },
}

/// Input for creating a claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClaim {
    pub tenant_id: TenantId,
    pub claim_type: ClaimType,
    pub customer_id: Option<CustomerId>,
    pub claimed_amount: Money,
    pub claim_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub created_by: String,
    pub supporting: SupportingDetails,
}

impl NewClaim {
    /// Checks the creation input
    pub fn validate(&self) -> Result<CustomerId, ClaimError> {
        let customer_id = self
            .customer_id
            .ok_or_else(|| ClaimError::Validation("customer is required".into()))?;
        if !self.claimed_amount.is_positive() {
            return Err(ClaimError::Validation("claimed amount must be positive".into()));
        }
        self.claimed_amount
            .ensure_storable()
            .map_err(|e| ClaimError::Validation(e.to_string()))?;
        if self.created_by.trim().is_empty() {
            return Err(ClaimError::Validation("created_by is required".into()));
        }
        if let Some(due) = self.due_date {
            if due < self.claim_date {
                return Err(ClaimError::Validation("due date precedes claim date".into()));
            }
        }
        Ok(customer_id)
    }
}

/// A trade claim submitted by a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Human readable number, `CLM-YYYY-NNNNNNN`
    pub claim_number: String,
    pub claim_type: ClaimType,
    pub customer_id: CustomerId,
    /// Amount the customer asked for
    pub claimed_amount: Money,
    /// Amount approved in review
    pub approved_amount: Option<Money>,
    /// Amount actually settled
    pub settled_amount: Option<Money>,
    /// Sum of deduction allocations against this claim
    pub matched_amount: Money,
    pub currency: Currency,
    pub claim_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: ClaimStatus,
    pub created_by: String,
    /// Deductions allocated against this claim, in allocation order
    pub deduction_ids: Vec<DeductionId>,
    pub supporting: SupportingDetails,
    pub decision: Option<ClaimDecision>,
    /// Optimistic concurrency version
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a pending claim from validated input
    pub fn create(input: NewClaim, now: DateTime<Utc>) -> Result<Self, ClaimError> {
        let customer_id = input.validate()?;
        let id = ClaimId::new_v7();
        let currency = input.claimed_amount.currency();

        Ok(Self {
            claim_number: generate_claim_number(&id, input.claim_date),
            id,
            tenant_id: input.tenant_id,
            claim_type: input.claim_type,
            customer_id,
            claimed_amount: input.claimed_amount,
            approved_amount: None,
            settled_amount: None,
            matched_amount: Money::zero(currency),
            currency,
            claim_date: input.claim_date,
            due_date: input.due_date,
            status: ClaimStatus::Pending,
            created_by: input.created_by,
            deduction_ids: Vec::new(),
            supporting: input.supporting,
            decision: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves a pending claim into review
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), ClaimError> {
        self.transition(ClaimStatus::UnderReview, now)
    }

    /// Approves the claim for `amount`
    ///
    /// An amount below the claimed amount lands in `PartiallyApproved`.
    pub fn approve(&mut self, amount: Money, actor: &str, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if !amount.is_positive() {
            return Err(ClaimError::Validation("approved amount must be positive".into()));
        }
        let target = match amount.checked_cmp(&self.claimed_amount)? {
            Ordering::Greater => {
                return Err(ClaimError::AmountExceedsClaimed {
                    approved: amount.to_string(),
                    claimed: self.claimed_amount.to_string(),
                })
            }
            Ordering::Equal => ClaimStatus::Approved,
            Ordering::Less => ClaimStatus::PartiallyApproved,
        };
        self.transition(target, now)?;
        self.approved_amount = Some(amount);
        self.decision = Some(ClaimDecision::Approved {
            by: actor.to_string(),
            at: now,
            amount,
        });
        Ok(())
    }

    /// Rejects the claim; a reason is mandatory
    pub fn reject(&mut self, reason: &str, actor: &str, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if reason.trim().is_empty() {
            return Err(ClaimError::Validation("rejection reason is required".into()));
        }
        self.transition(ClaimStatus::Rejected, now)?;
        self.decision = Some(ClaimDecision::Rejected {
            by: actor.to_string(),
            at: now,
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Settles an approved claim, defaulting to the approved amount
    pub fn settle(&mut self, amount: Option<Money>, actor: &str, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if !self.status.can_transition_to(ClaimStatus::Settled) {
            return Err(self.illegal(ClaimStatus::Settled));
        }
        let approved = self
            .approved_amount
            .ok_or_else(|| ClaimError::Validation("claim has no approved amount".into()))?;
        let settled = amount.unwrap_or(approved);
        if settled.is_negative() {
            return Err(ClaimError::Validation("settled amount cannot be negative".into()));
        }
        if settled.checked_cmp(&approved)? == Ordering::Greater {
            return Err(ClaimError::AmountExceedsApproved {
                settled: settled.to_string(),
                approved: approved.to_string(),
            });
        }
        self.transition(ClaimStatus::Settled, now)?;
        self.settled_amount = Some(settled);
        self.decision = Some(ClaimDecision::Settled {
            by: actor.to_string(),
            at: now,
            amount: settled,
        });
        Ok(())
    }

    /// Writes off any non-terminal claim
    pub fn write_off(&mut self, reason: Option<String>, actor: &str, now: DateTime<Utc>) -> Result<(), ClaimError> {
        self.transition(ClaimStatus::WrittenOff, now)?;
        self.decision = Some(ClaimDecision::WrittenOff {
            by: actor.to_string(),
            at: now,
            reason,
        });
        Ok(())
    }

    /// Claimed amount not yet covered by deduction allocations
    pub fn unmatched_balance(&self) -> Result<Money, ClaimError> {
        Ok(self.claimed_amount.checked_sub(&self.matched_amount)?)
    }

    /// True once any deduction has been allocated against this claim
    pub fn has_allocations(&self) -> bool {
        !self.deduction_ids.is_empty()
    }

    /// Records a deduction allocation against this claim
    pub fn record_allocation(
        &mut self,
        deduction_id: DeductionId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), ClaimError> {
        if self.status.is_terminal() {
            return Err(ClaimError::Closed(self.status.to_string()));
        }
        if !amount.is_positive() {
            return Err(ClaimError::Validation("allocation must be positive".into()));
        }
        let available = self.unmatched_balance()?;
        if amount.checked_cmp(&available)? == Ordering::Greater {
            return Err(ClaimError::AllocationExceedsBalance {
                requested: amount.to_string(),
                available: available.to_string(),
            });
        }
        self.matched_amount = self.matched_amount.checked_add(&amount)?;
        if !self.deduction_ids.contains(&deduction_id) {
            self.deduction_ids.push(deduction_id);
        }
        self.updated_at = now;
        Ok(())
    }

    fn transition(&mut self, target: ClaimStatus, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if !self.status.can_transition_to(target) {
            return Err(self.illegal(target));
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    fn illegal(&self, target: ClaimStatus) -> ClaimError {
        ClaimError::InvalidStatusTransition {
            from: self.status.to_string(),
            to: target.to_string(),
        }
    }
}

fn generate_claim_number(id: &ClaimId, claim_date: NaiveDate) -> String {
    let sequence = id.as_uuid().as_u128() % 10_000_000;
    format!("CLM-{}-{:07}", claim_date.year(), sequence)
}
