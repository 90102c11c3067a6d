//! Matching DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, DeductionId, Money};
use domain_deductions::Match;

use super::common::MoneyInput;

/// Actor recorded when `match/auto` is called without one
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AutoMatchRequest {
    pub tenant: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualMatchRequest {
    pub tenant: Uuid,
    pub deduction_id: Uuid,
    pub claim_id: Uuid,
    pub amount: MoneyInput,
    #[validate(length(min = 1, max = 255))]
    pub actor: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub deduction_id: DeductionId,
    pub claim_id: ClaimId,
    pub amount: Money,
}

impl From<Match> for MatchSummary {
    fn from(allocation: Match) -> Self {
        Self {
            deduction_id: allocation.deduction_id,
            claim_id: allocation.claim_id,
            amount: allocation.amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AutoMatchResponse {
    pub matches: Vec<MatchSummary>,
    pub count: usize,
}

impl From<Vec<Match>> for AutoMatchResponse {
    fn from(matches: Vec<Match>) -> Self {
        let matches: Vec<MatchSummary> = matches.into_iter().map(Into::into).collect();
        Self {
            count: matches.len(),
            matches,
        }
    }
}
