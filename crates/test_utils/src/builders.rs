//! Test Data Builders
//!
//! Provides builder patterns for constructing claims, deductions, and
//! approvals with sensible defaults. Tests set only the fields they care
//! about; free-text fields are filled with `fake` data.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{CustomerId, Money, TenantId};
use domain_approvals::{Approval, EntityType, NewApproval, Priority};
use domain_claims::{Claim, ClaimType, NewClaim, SupportingDetails};
use domain_deductions::{Deduction, DeductionType, NewDeduction};
use fake::faker::company::en::{Buzzword, CompanyName};
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use uuid::Uuid;

use crate::fixtures::{IdFixtures, MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for claims
pub struct ClaimBuilder {
    tenant_id: TenantId,
    claim_type: ClaimType,
    customer_id: Option<CustomerId>,
    claimed_amount: Money,
    claim_date: NaiveDate,
    due_date: Option<NaiveDate>,
    created_by: String,
    description: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            tenant_id: IdFixtures::tenant_id(),
            claim_type: ClaimType::Promotion,
            customer_id: Some(IdFixtures::customer_id()),
            claimed_amount: MoneyFixtures::usd_500(),
            claim_date: TemporalFixtures::in_period(),
            due_date: None,
            created_by: SafeEmail().fake(),
            description: Some(format!("{} feature", Buzzword().fake::<String>())),
            created_at: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_claim_type(mut self, claim_type: ClaimType) -> Self {
        self.claim_type = claim_type;
        self
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Leaves the customer unset, which creation rejects
    pub fn without_customer(mut self) -> Self {
        self.customer_id = None;
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.claimed_amount = amount;
        self
    }

    pub fn with_claim_date(mut self, date: NaiveDate) -> Self {
        self.claim_date = date;
        self
    }

    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn with_created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = actor.into();
        self
    }

    /// Fixes the creation timestamp, which decides auto-match order
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Builds the creation input
    pub fn build_input(self) -> NewClaim {
        NewClaim {
            tenant_id: self.tenant_id,
            claim_type: self.claim_type,
            customer_id: self.customer_id,
            claimed_amount: self.claimed_amount,
            claim_date: self.claim_date,
            due_date: self.due_date,
            created_by: self.created_by,
            supporting: SupportingDetails {
                description: self.description,
                ..Default::default()
            },
        }
    }

    /// Builds a pending claim
    ///
    /// # Panics
    ///
    /// Panics if the configured input is invalid
    pub fn build(self) -> Claim {
        let now = self.created_at.unwrap_or_else(Utc::now);
        Claim::create(self.build_input(), now).expect("claim builder produced invalid input")
    }
}

/// Builder for deductions
pub struct DeductionBuilder {
    tenant_id: TenantId,
    deduction_type: DeductionType,
    customer_id: Option<CustomerId>,
    invoice_reference: String,
    deduction_amount: Money,
    deduction_date: NaiveDate,
    reason_code: Option<String>,
    reason_description: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl Default for DeductionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeductionBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            tenant_id: IdFixtures::tenant_id(),
            deduction_type: DeductionType::Promotional,
            customer_id: Some(IdFixtures::customer_id()),
            invoice_reference: format!("INV-2024-{:05}", (1..99_999u32).fake::<u32>()),
            deduction_amount: MoneyFixtures::usd_500(),
            deduction_date: TemporalFixtures::in_period(),
            reason_code: Some("PROMO".to_string()),
            reason_description: Some(format!("Short pay by {}", CompanyName().fake::<String>())),
            created_at: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_deduction_type(mut self, deduction_type: DeductionType) -> Self {
        self.deduction_type = deduction_type;
        self
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn without_customer(mut self) -> Self {
        self.customer_id = None;
        self
    }

    pub fn with_invoice_reference(mut self, reference: impl Into<String>) -> Self {
        self.invoice_reference = reference.into();
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.deduction_amount = amount;
        self
    }

    pub fn with_deduction_date(mut self, date: NaiveDate) -> Self {
        self.deduction_date = date;
        self
    }

    pub fn with_reason_code(mut self, code: impl Into<String>) -> Self {
        self.reason_code = Some(code.into());
        self
    }

    /// Fixes the creation timestamp, which decides auto-match order
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn build_input(self) -> NewDeduction {
        NewDeduction {
            tenant_id: self.tenant_id,
            deduction_type: self.deduction_type,
            customer_id: self.customer_id,
            invoice_reference: self.invoice_reference,
            deduction_amount: self.deduction_amount,
            deduction_date: self.deduction_date,
            due_date: None,
            reason_code: self.reason_code,
            reason_description: self.reason_description,
        }
    }

    /// Builds an open deduction
    ///
    /// # Panics
    ///
    /// Panics if the configured input is invalid
    pub fn build(self) -> Deduction {
        let now = self.created_at.unwrap_or_else(Utc::now);
        Deduction::create(self.build_input(), now).expect("deduction builder produced invalid input")
    }
}

/// Builder for approval requests
pub struct ApprovalBuilder {
    tenant_id: TenantId,
    entity_type: EntityType,
    entity_id: Uuid,
    entity_name: Option<String>,
    amount: Money,
    priority: Option<Priority>,
    sla_hours: Option<u32>,
    due_date: Option<DateTime<Utc>>,
    requested_by: String,
    assigned_to: Option<String>,
    requested_at: DateTime<Utc>,
}

impl Default for ApprovalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            tenant_id: IdFixtures::tenant_id(),
            entity_type: EntityType::Claim,
            entity_id: Uuid::new_v4(),
            entity_name: Some(CompanyName().fake()),
            amount: MoneyFixtures::usd_500(),
            priority: None,
            sla_hours: Some(48),
            due_date: None,
            requested_by: StringFixtures::actor().to_string(),
            assigned_to: Some(StringFixtures::approver().to_string()),
            requested_at: TemporalFixtures::requested_at(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    /// Points the approval at an entity
    pub fn for_entity(mut self, entity_type: EntityType, entity_id: impl Into<Uuid>) -> Self {
        self.entity_type = entity_type;
        self.entity_id = entity_id.into();
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_sla_hours(mut self, hours: u32) -> Self {
        self.sla_hours = Some(hours);
        self
    }

    /// Uses the configured default SLA
    pub fn without_sla(mut self) -> Self {
        self.sla_hours = None;
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_requested_by(mut self, actor: impl Into<String>) -> Self {
        self.requested_by = actor.into();
        self
    }

    pub fn requested_at(mut self, at: DateTime<Utc>) -> Self {
        self.requested_at = at;
        self
    }

    pub fn build_input(self) -> NewApproval {
        NewApproval {
            tenant_id: self.tenant_id,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            entity_name: self.entity_name,
            amount: self.amount,
            priority: self.priority,
            sla_hours: self.sla_hours,
            due_date: self.due_date,
            requested_by: self.requested_by,
            assigned_to: self.assigned_to,
        }
    }

    /// Builds a pending approval requested at the configured instant
    ///
    /// # Panics
    ///
    /// Panics if the configured input is invalid
    pub fn build(self) -> Approval {
        let requested_at = self.requested_at;
        Approval::request(self.build_input(), requested_at, 48)
            .expect("approval builder produced invalid input")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_claims::ClaimStatus;
    use domain_deductions::DeductionStatus;

    #[test]
    fn test_claim_builder_defaults() {
        let claim = ClaimBuilder::new().build();
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.customer_id, IdFixtures::customer_id());
        assert!(!claim.created_by.is_empty());
    }

    #[test]
    fn test_deduction_builder_sets_created_at() {
        let at = TemporalFixtures::as_of();
        let deduction = DeductionBuilder::new().created_at(at).build();
        assert_eq!(deduction.status, DeductionStatus::Open);
        assert_eq!(deduction.created_at, at);
        assert!(deduction.invoice_reference.starts_with("INV-2024-"));
    }

    #[test]
    fn test_approval_builder_due_date() {
        let approval = ApprovalBuilder::new().with_sla_hours(24).build();
        assert_eq!(
            approval.due_date,
            TemporalFixtures::requested_at() + chrono::Duration::hours(24)
        );
    }
}
