//! Claims DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, Currency, CustomerId, DeductionId, Money, TenantId};
use domain_claims::{Claim, ClaimDecision, ClaimStatus, ClaimType, NewClaim, SupportingDetails};

use super::common::MoneyInput;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    pub tenant: Uuid,
    pub claim_type: ClaimType,
    pub customer_id: Option<Uuid>,
    pub claimed_amount: MoneyInput,
    pub claim_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255))]
    pub created_by: String,
    #[serde(default)]
    pub supporting: SupportingDetails,
}

impl From<CreateClaimRequest> for NewClaim {
    fn from(request: CreateClaimRequest) -> Self {
        NewClaim {
            tenant_id: TenantId::from_uuid(request.tenant),
            claim_type: request.claim_type,
            customer_id: request.customer_id.map(CustomerId::from_uuid),
            claimed_amount: request.claimed_amount.into(),
            claim_date: request.claim_date,
            due_date: request.due_date,
            created_by: request.created_by,
            supporting: request.supporting,
        }
    }
}

/// Body of `POST claims/{id}/<action>`
///
/// `approve` requires `amount`; `reject` requires `reason`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClaimActionRequest {
    pub tenant: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub actor: String,
    pub amount: Option<MoneyInput>,
    #[validate(length(min = 1, max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub id: ClaimId,
    pub tenant_id: TenantId,
    pub claim_number: String,
    pub claim_type: ClaimType,
    pub customer_id: CustomerId,
    pub claimed_amount: Money,
    pub approved_amount: Option<Money>,
    pub settled_amount: Option<Money>,
    pub matched_amount: Money,
    pub currency: Currency,
    pub claim_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: ClaimStatus,
    pub created_by: String,
    pub deduction_ids: Vec<DeductionId>,
    pub supporting: SupportingDetails,
    pub decision: Option<ClaimDecision>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        Self {
            id: claim.id,
            tenant_id: claim.tenant_id,
            claim_number: claim.claim_number,
            claim_type: claim.claim_type,
            customer_id: claim.customer_id,
            claimed_amount: claim.claimed_amount,
            approved_amount: claim.approved_amount,
            settled_amount: claim.settled_amount,
            matched_amount: claim.matched_amount,
            currency: claim.currency,
            claim_date: claim.claim_date,
            due_date: claim.due_date,
            status: claim.status,
            created_by: claim.created_by,
            deduction_ids: claim.deduction_ids,
            supporting: claim.supporting,
            decision: claim.decision,
            version: claim.version,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_reads_camel_case() {
        let request: CreateClaimRequest = serde_json::from_value(serde_json::json!({
            "tenant": "550e8400-e29b-41d4-a716-446655440001",
            "claimType": "promotion",
            "claimedAmount": { "amount": "500.00", "currency": "USD" },
            "claimDate": "2024-02-15",
            "createdBy": "ar.analyst@example.com",
            "supporting": { "promotionId": "PROMO-7" }
        }))
        .unwrap();

        assert!(request.validate().is_ok());
        let input = NewClaim::from(request);
        assert_eq!(input.claim_type, ClaimType::Promotion);
        assert_eq!(input.customer_id, None);
        assert_eq!(input.supporting.promotion_id.as_deref(), Some("PROMO-7"));
    }

    #[test]
    fn test_blank_actor_fails_validation() {
        let request = ClaimActionRequest {
            tenant: Uuid::new_v4(),
            actor: String::new(),
            amount: None,
            reason: None,
        };
        assert!(request.validate().is_err());
    }
}
