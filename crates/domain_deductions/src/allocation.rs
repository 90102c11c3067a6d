//! Deduction-to-claim allocations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, DeductionId, MatchId, Money, TenantId};
use crate::error::DeductionError;

/// How an allocation was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Auto,
    Manual,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Auto => "auto",
            MatchMethod::Manual => "manual",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMethod {
    type Err = DeductionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(MatchMethod::Auto),
            "manual" => Ok(MatchMethod::Manual),
            other => Err(DeductionError::Validation(format!("unknown match method `{other}`"))),
        }
    }
}

/// An allocation of part or all of a deduction to one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tenant_id: TenantId,
    pub deduction_id: DeductionId,
    pub claim_id: ClaimId,
    pub amount: Money,
    pub matched_at: DateTime<Utc>,
    pub method: MatchMethod,
    pub matched_by: String,
}

impl Match {
    pub fn new(
        tenant_id: TenantId,
        deduction_id: DeductionId,
        claim_id: ClaimId,
        amount: Money,
        method: MatchMethod,
        matched_by: impl Into<String>,
        matched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MatchId::new_v7(),
            tenant_id,
            deduction_id,
            claim_id,
            amount,
            matched_at,
            method,
            matched_by: matched_by.into(),
        }
    }
}
