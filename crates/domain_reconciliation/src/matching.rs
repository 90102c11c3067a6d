//! Matching Engine
//!
//! Allocates deductions against claims. Automatic matching pairs a
//! deduction with the oldest claim of the same customer and currency whose
//! claimed amount equals the deduction amount exactly; manual matching
//! allocates an explicit, possibly partial, amount.
//!
//! Every allocation is written through [`LedgerPort::record_match`] as one
//! conditional unit covering the deduction, the claim, and the match row.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{AuditEntry, AuditedEntity, ClaimId, DeductionId, Money, TenantId};
use domain_claims::{Claim, ClaimStatus};
use domain_deductions::{Deduction, DeductionStatus, Match, MatchMethod};

use crate::config::RetryPolicy;
use crate::error::EngineError;
use crate::ports::{ClaimQuery, DeductionQuery, LedgerPort, MatchWrite};
use crate::retry::with_retry;

const AUTO_DEDUCTION_STATUSES: [DeductionStatus; 2] =
    [DeductionStatus::Open, DeductionStatus::UnderReview];

const AUTO_CLAIM_STATUSES: [ClaimStatus; 2] = [ClaimStatus::Pending, ClaimStatus::Approved];

/// Deduction-to-claim allocation
#[derive(Clone)]
pub struct MatchingEngine {
    ledger: Arc<dyn LedgerPort>,
    retry: RetryPolicy,
}

impl MatchingEngine {
    pub fn new(ledger: Arc<dyn LedgerPort>, retry: RetryPolicy) -> Self {
        Self { ledger, retry }
    }

    /// Pairs unmatched deductions with claims of exactly equal amount
    ///
    /// Deductions are visited oldest first and each claim is consumed at
    /// most once, so the pairing is deterministic for a given ledger state.
    /// A second run with no intervening change creates nothing.
    #[instrument(skip(self))]
    pub async fn auto_match(&self, tenant_id: TenantId, actor: &str) -> Result<Vec<Match>, EngineError> {
        let deductions: Vec<Deduction> = self
            .ledger
            .find_deductions(tenant_id, &DeductionQuery::with_statuses(AUTO_DEDUCTION_STATUSES))
            .await?
            .into_iter()
            .filter(Deduction::is_unmatched)
            .collect();
        let claims: Vec<Claim> = self
            .ledger
            .find_claims(tenant_id, &ClaimQuery::with_statuses(AUTO_CLAIM_STATUSES))
            .await?
            .into_iter()
            .filter(|c| !c.has_allocations())
            .collect();

        debug!(deductions = deductions.len(), claims = claims.len(), "auto-match candidates");

        let mut consumed: HashSet<ClaimId> = HashSet::new();
        let mut created = Vec::new();

        for deduction in &deductions {
            let Some(claim) = claims
                .iter()
                .find(|c| !consumed.contains(&c.id) && is_exact_pair(deduction, c))
            else {
                continue;
            };
            consumed.insert(claim.id);

            let (deduction_id, claim_id) = (deduction.id, claim.id);
            let this = self;
            let outcome = with_retry(&self.retry, "auto_match", move || {
                this.apply_auto_match(tenant_id, deduction_id, claim_id, actor)
            })
            .await;

            match outcome {
                Ok(Some(allocation)) => created.push(allocation),
                Ok(None) => {
                    debug!(%deduction_id, %claim_id, "pair no longer eligible; skipped")
                }
                Err(
                    err @ (EngineError::InvalidState(_)
                    | EngineError::InvalidAllocation(_)
                    | EngineError::NotFound { .. }),
                ) => {
                    warn!(%deduction_id, %claim_id, error = %err, "auto-match pair skipped")
                }
                Err(err) => return Err(err),
            }
        }

        info!(matched = created.len(), "auto-match complete");
        Ok(created)
    }

    /// Allocates `amount` of a deduction to a claim
    ///
    /// # Returns
    ///
    /// The updated deduction; it moves to `matched` once nothing remains
    #[instrument(skip(self, amount), fields(amount = %amount))]
    pub async fn match_manual(
        &self,
        tenant_id: TenantId,
        deduction_id: DeductionId,
        claim_id: ClaimId,
        amount: Money,
        actor: &str,
    ) -> Result<Deduction, EngineError> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAllocation(
                "allocation amount must be positive".into(),
            ));
        }

        let this = self;
        let (deduction, _claim) = with_retry(&self.retry, "match_manual", move || {
            this.apply_manual_match(tenant_id, deduction_id, claim_id, amount, actor)
        })
        .await?;

        info!(
            %deduction_id,
            %claim_id,
            remaining = %deduction.remaining_amount,
            status = %deduction.status,
            "manual match recorded"
        );
        Ok(deduction)
    }

    async fn apply_auto_match(
        &self,
        tenant_id: TenantId,
        deduction_id: DeductionId,
        claim_id: ClaimId,
        actor: &str,
    ) -> Result<Option<Match>, EngineError> {
        let deduction = self.ledger.get_deduction(tenant_id, deduction_id).await?;
        let claim = self.ledger.get_claim(tenant_id, claim_id).await?;

        let still_eligible = AUTO_DEDUCTION_STATUSES.contains(&deduction.status)
            && deduction.is_unmatched()
            && AUTO_CLAIM_STATUSES.contains(&claim.status)
            && !claim.has_allocations()
            && is_exact_pair(&deduction, &claim);
        if !still_eligible {
            return Ok(None);
        }

        let amount = deduction.remaining_amount;
        let write = allocate(deduction, claim, amount, MatchMethod::Auto, actor, Utc::now())?;
        let allocation = write.allocation.clone();
        self.ledger.record_match(write).await?;
        Ok(Some(allocation))
    }

    async fn apply_manual_match(
        &self,
        tenant_id: TenantId,
        deduction_id: DeductionId,
        claim_id: ClaimId,
        amount: Money,
        actor: &str,
    ) -> Result<(Deduction, Claim), EngineError> {
        let deduction = self.ledger.get_deduction(tenant_id, deduction_id).await?;
        let claim = self.ledger.get_claim(tenant_id, claim_id).await?;

        if deduction.currency != claim.currency {
            return Err(EngineError::InvalidAllocation(format!(
                "deduction currency {} differs from claim currency {}",
                deduction.currency, claim.currency
            )));
        }

        let write = allocate(deduction, claim, amount, MatchMethod::Manual, actor, Utc::now())?;
        Ok(self.ledger.record_match(write).await?)
    }
}

fn is_exact_pair(deduction: &Deduction, claim: &Claim) -> bool {
    claim.customer_id == deduction.customer_id
        && claim.currency == deduction.currency
        && claim.claimed_amount == deduction.deduction_amount
}

/// Applies one allocation to both sides in memory and builds the write
fn allocate(
    mut deduction: Deduction,
    mut claim: Claim,
    amount: Money,
    method: MatchMethod,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<MatchWrite, EngineError> {
    let allocation = Match::new(
        deduction.tenant_id,
        deduction.id,
        claim.id,
        amount,
        method,
        actor,
        now,
    );

    let deduction_from = deduction.status;
    deduction.allocate(allocation.id, amount, now)?;
    claim.record_allocation(deduction.id, amount, now)?;

    let audit = vec![
        AuditEntry::new(
            deduction.tenant_id,
            AuditedEntity::Deduction,
            deduction.id,
            "match",
            deduction.status.as_str(),
            actor,
        )
        .from_status(deduction_from.as_str())
        .with_amount(amount),
        AuditEntry::new(
            claim.tenant_id,
            AuditedEntity::Claim,
            claim.id,
            "match",
            claim.status.as_str(),
            actor,
        )
        .from_status(claim.status.as_str())
        .with_amount(amount),
    ];

    Ok(MatchWrite {
        deduction,
        claim,
        allocation,
        audit,
    })
}
