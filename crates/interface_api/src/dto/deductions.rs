//! Deductions DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Currency, CustomerId, DeductionId, MatchId, Money, TenantId};
use domain_deductions::{Deduction, DeductionDecision, DeductionStatus, DeductionType, NewDeduction};

use super::common::MoneyInput;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeductionRequest {
    pub tenant: Uuid,
    pub deduction_type: DeductionType,
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub invoice_reference: String,
    pub deduction_amount: MoneyInput,
    pub deduction_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub reason_code: Option<String>,
    pub reason_description: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub actor: String,
}

impl CreateDeductionRequest {
    /// Splits the body into the engine input and the recording actor
    pub fn into_parts(self) -> (NewDeduction, String) {
        let input = NewDeduction {
            tenant_id: TenantId::from_uuid(self.tenant),
            deduction_type: self.deduction_type,
            customer_id: self.customer_id.map(CustomerId::from_uuid),
            invoice_reference: self.invoice_reference,
            deduction_amount: self.deduction_amount.into(),
            deduction_date: self.deduction_date,
            due_date: self.due_date,
            reason_code: self.reason_code,
            reason_description: self.reason_description,
        };
        (input, self.actor)
    }
}

/// Body of `POST deductions/{id}/<action>`; `dispute` requires `reason`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeductionActionRequest {
    pub tenant: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub actor: String,
    #[validate(length(min = 1, max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionResponse {
    pub id: DeductionId,
    pub tenant_id: TenantId,
    pub deduction_number: String,
    pub deduction_type: DeductionType,
    pub customer_id: CustomerId,
    pub invoice_reference: String,
    pub deduction_amount: Money,
    pub matched_amount: Money,
    pub remaining_amount: Money,
    pub currency: Currency,
    pub deduction_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub reason_code: Option<String>,
    pub reason_description: Option<String>,
    pub status: DeductionStatus,
    pub match_ids: Vec<MatchId>,
    pub decision: Option<DeductionDecision>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Deduction> for DeductionResponse {
    fn from(deduction: Deduction) -> Self {
        Self {
            id: deduction.id,
            tenant_id: deduction.tenant_id,
            deduction_number: deduction.deduction_number,
            deduction_type: deduction.deduction_type,
            customer_id: deduction.customer_id,
            invoice_reference: deduction.invoice_reference,
            deduction_amount: deduction.deduction_amount,
            matched_amount: deduction.matched_amount,
            remaining_amount: deduction.remaining_amount,
            currency: deduction.currency,
            deduction_date: deduction.deduction_date,
            due_date: deduction.due_date,
            reason_code: deduction.reason_code,
            reason_description: deduction.reason_description,
            status: deduction.status,
            match_ids: deduction.match_ids,
            decision: deduction.decision,
            version: deduction.version,
            created_at: deduction.created_at,
            updated_at: deduction.updated_at,
        }
    }
}
