//! Comprehensive tests for domain_claims

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, CustomerId, DeductionId, Money, TenantId, MAX_LEDGER_AMOUNT};

use domain_claims::claim::{
    Claim, ClaimDecision, ClaimStatus, ClaimType, NewClaim, SupportingDetails,
};
use domain_claims::ClaimError;

fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::USD)
}

fn new_claim(amount: Money) -> NewClaim {
    NewClaim {
        tenant_id: TenantId::new(),
        claim_type: ClaimType::Rebate,
        customer_id: Some(CustomerId::new()),
        claimed_amount: amount,
        claim_date: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
        due_date: None,
        created_by: "claims@customer".to_string(),
        supporting: SupportingDetails {
            rebate_id: Some("RB-2024-17".to_string()),
            ..SupportingDetails::default()
        },
    }
}

fn create_test_claim(amount: Decimal) -> Claim {
    Claim::create(new_claim(usd(amount)), Utc::now()).unwrap()
}

fn reviewed_claim(amount: Decimal) -> Claim {
    let mut claim = create_test_claim(amount);
    claim.submit(Utc::now()).unwrap();
    claim
}

// ============================================================================
// Creation Tests
// ============================================================================

mod creation_tests {
    use super::*;

    #[test]
    fn test_create_starts_pending() {
        let claim = create_test_claim(dec!(1000));

        assert_eq!(claim.status, ClaimStatus::Pending);
        assert_eq!(claim.currency, Currency::USD);
        assert!(claim.matched_amount.is_zero());
        assert!(claim.decision.is_none());
        assert!(claim.deduction_ids.is_empty());
        assert_eq!(claim.version, 0);
    }

    #[test]
    fn test_create_requires_customer() {
        let mut input = new_claim(usd(dec!(100)));
        input.customer_id = None;

        assert!(matches!(Claim::create(input, Utc::now()), Err(ClaimError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_non_positive_amount() {
        let input = new_claim(usd(dec!(0)));
        assert!(matches!(Claim::create(input, Utc::now()), Err(ClaimError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_amount_beyond_ledger_limit() {
        let input = new_claim(usd(MAX_LEDGER_AMOUNT));
        assert!(matches!(Claim::create(input, Utc::now()), Err(ClaimError::Validation(_))));

        let input = new_claim(usd(Decimal::MAX));
        assert!(matches!(Claim::create(input, Utc::now()), Err(ClaimError::Validation(_))));
    }

    #[test]
    fn test_create_rejects_blank_creator() {
        let mut input = new_claim(usd(dec!(100)));
        input.created_by = "   ".to_string();
        assert!(Claim::create(input, Utc::now()).is_err());
    }

    #[test]
    fn test_create_rejects_due_date_before_claim_date() {
        let mut input = new_claim(usd(dec!(100)));
        input.due_date = Some(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert!(Claim::create(input, Utc::now()).is_err());
    }
}

// ============================================================================
// Transition Tests
// ============================================================================

mod transition_tests {
    use super::*;

    #[test]
    fn test_submit_moves_to_under_review() {
        let claim = reviewed_claim(dec!(100));
        assert_eq!(claim.status, ClaimStatus::UnderReview);
    }

    #[test]
    fn test_submit_twice_is_illegal() {
        let mut claim = reviewed_claim(dec!(100));
        let result = claim.submit(Utc::now());
        assert!(matches!(result, Err(ClaimError::InvalidStatusTransition { .. })));
    }

    #[test]
    fn test_approve_from_pending_is_illegal() {
        let mut claim = create_test_claim(dec!(100));
        let result = claim.approve(usd(dec!(100)), "mgr", Utc::now());
        assert!(matches!(result, Err(ClaimError::InvalidStatusTransition { .. })));
        assert_eq!(claim.status, ClaimStatus::Pending);
        assert!(claim.approved_amount.is_none());
    }

    #[test]
    fn test_approve_partial_amount() {
        let mut claim = reviewed_claim(dec!(1000));
        claim.approve(usd(dec!(750)), "mgr", Utc::now()).unwrap();

        assert_eq!(claim.status, ClaimStatus::PartiallyApproved);
        assert_eq!(claim.approved_amount, Some(usd(dec!(750))));
        assert!(matches!(claim.decision, Some(ClaimDecision::Approved { .. })));
    }

    #[test]
    fn test_approve_above_claimed_is_rejected() {
        let mut claim = reviewed_claim(dec!(1000));
        let result = claim.approve(usd(dec!(1000.01)), "mgr", Utc::now());

        assert!(matches!(result, Err(ClaimError::AmountExceedsClaimed { .. })));
        assert_eq!(claim.status, ClaimStatus::UnderReview);
    }

    #[test]
    fn test_approve_in_other_currency_fails() {
        let mut claim = reviewed_claim(dec!(1000));
        let result = claim.approve(Money::new(dec!(10), Currency::EUR), "mgr", Utc::now());
        assert!(matches!(result, Err(ClaimError::Money(_))));
    }

    #[test]
    fn test_reject_records_reason() {
        let mut claim = reviewed_claim(dec!(100));
        claim.reject("no proof of performance", "mgr", Utc::now()).unwrap();

        assert_eq!(claim.status, ClaimStatus::Rejected);
        match claim.decision {
            Some(ClaimDecision::Rejected { reason, .. }) => {
                assert_eq!(reason, "no proof of performance")
            }
            other => panic!("Expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_reject_requires_reason() {
        let mut claim = reviewed_claim(dec!(100));
        assert!(matches!(
            claim.reject("", "mgr", Utc::now()),
            Err(ClaimError::Validation(_))
        ));
    }

    #[test]
    fn test_settle_pending_is_illegal() {
        let mut claim = create_test_claim(dec!(100));
        let result = claim.settle(None, "ap", Utc::now());

        assert!(matches!(result, Err(ClaimError::InvalidStatusTransition { .. })));
        assert_eq!(claim.status, ClaimStatus::Pending);
    }

    #[test]
    fn test_settle_defaults_to_approved_amount() {
        let mut claim = reviewed_claim(dec!(800));
        claim.approve(usd(dec!(600)), "mgr", Utc::now()).unwrap();
        claim.settle(None, "ap", Utc::now()).unwrap();

        assert_eq!(claim.status, ClaimStatus::Settled);
        assert_eq!(claim.settled_amount, Some(usd(dec!(600))));
    }

    #[test]
    fn test_settle_above_approved_is_rejected() {
        let mut claim = reviewed_claim(dec!(800));
        claim.approve(usd(dec!(600)), "mgr", Utc::now()).unwrap();

        let result = claim.settle(Some(usd(dec!(700))), "ap", Utc::now());
        assert!(matches!(result, Err(ClaimError::AmountExceedsApproved { .. })));
        assert_eq!(claim.status, ClaimStatus::PartiallyApproved);
    }

    #[test]
    fn test_write_off_from_any_non_terminal() {
        let mut pending = create_test_claim(dec!(100));
        pending.write_off(None, "ops", Utc::now()).unwrap();
        assert_eq!(pending.status, ClaimStatus::WrittenOff);

        let mut approved = reviewed_claim(dec!(100));
        approved.approve(usd(dec!(100)), "mgr", Utc::now()).unwrap();
        approved.write_off(Some("expired".into()), "ops", Utc::now()).unwrap();
        assert_eq!(approved.status, ClaimStatus::WrittenOff);
    }

    #[test]
    fn test_terminal_claims_reject_everything() {
        let mut claim = reviewed_claim(dec!(100));
        claim.reject("duplicate", "mgr", Utc::now()).unwrap();

        assert!(claim.write_off(None, "ops", Utc::now()).is_err());
        assert!(claim.settle(None, "ap", Utc::now()).is_err());
        assert!(claim.submit(Utc::now()).is_err());
    }

    #[test]
    fn test_transition_bumps_updated_at() {
        let mut claim = create_test_claim(dec!(100));
        let later = claim.updated_at + Duration::minutes(5);
        claim.submit(later).unwrap();
        assert_eq!(claim.updated_at, later);
    }
}

// ============================================================================
// Allocation Tests
// ============================================================================

mod allocation_tests {
    use super::*;

    #[test]
    fn test_record_allocation_appends_association() {
        let mut claim = create_test_claim(dec!(500));
        let first = DeductionId::new();
        let second = DeductionId::new();

        claim.record_allocation(first, usd(dec!(200)), Utc::now()).unwrap();
        claim.record_allocation(second, usd(dec!(300)), Utc::now()).unwrap();

        assert_eq!(claim.deduction_ids, vec![first, second]);
        assert_eq!(claim.matched_amount, usd(dec!(500)));
        assert!(claim.unmatched_balance().unwrap().is_zero());
    }

    #[test]
    fn test_allocation_beyond_balance_fails() {
        let mut claim = create_test_claim(dec!(500));
        claim.record_allocation(DeductionId::new(), usd(dec!(450)), Utc::now()).unwrap();

        let result = claim.record_allocation(DeductionId::new(), usd(dec!(50.01)), Utc::now());
        assert!(matches!(result, Err(ClaimError::AllocationExceedsBalance { .. })));
        assert_eq!(claim.matched_amount, usd(dec!(450)));
    }

    #[test]
    fn test_allocation_against_settled_claim_fails() {
        let mut claim = reviewed_claim(dec!(100));
        claim.approve(usd(dec!(100)), "mgr", Utc::now()).unwrap();
        claim.settle(None, "ap", Utc::now()).unwrap();

        let result = claim.record_allocation(DeductionId::new(), usd(dec!(10)), Utc::now());
        assert!(matches!(result, Err(ClaimError::Closed(_))));
    }

    #[test]
    fn test_repeat_allocation_from_same_deduction_keeps_one_link() {
        let mut claim = create_test_claim(dec!(500));
        let deduction = DeductionId::new();
        claim.record_allocation(deduction, usd(dec!(100)), Utc::now()).unwrap();
        claim.record_allocation(deduction, usd(dec!(100)), Utc::now()).unwrap();

        assert_eq!(claim.deduction_ids.len(), 1);
        assert_eq!(claim.matched_amount, usd(dec!(200)));
    }
}

// ============================================================================
// Serialization Tests
// ============================================================================

mod serialization_tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        let statuses = [
            ClaimStatus::Pending,
            ClaimStatus::UnderReview,
            ClaimStatus::Approved,
            ClaimStatus::PartiallyApproved,
            ClaimStatus::Rejected,
            ClaimStatus::Settled,
            ClaimStatus::WrittenOff,
        ];

        for status in statuses {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<ClaimStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_decision_is_tagged() {
        let decision = ClaimDecision::Rejected {
            by: "mgr".into(),
            at: Utc::now(),
            reason: "late".into(),
        };
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(value["kind"], "rejected");
        assert_eq!(value["reason"], "late");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!("coupon".parse::<ClaimType>().is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_approved_never_exceeds_claimed(
        claimed_cents in 1i64..10_000_000,
        approved_cents in 1i64..20_000_000,
    ) {
        let mut claim = reviewed_claim(Decimal::new(claimed_cents, 2));
        let result = claim.approve(Money::from_minor(approved_cents, Currency::USD), "mgr", Utc::now());

        prop_assert_eq!(result.is_ok(), approved_cents <= claimed_cents);
        if let Some(approved) = claim.approved_amount {
            prop_assert!(approved.amount() <= claim.claimed_amount.amount());
        }
    }

    #[test]
    fn prop_matched_never_exceeds_claimed(
        allocations in proptest::collection::vec(1i64..50_000, 1..12),
    ) {
        let mut claim = create_test_claim(dec!(1000));
        for cents in allocations {
            let _ = claim.record_allocation(
                DeductionId::new(),
                Money::from_minor(cents, Currency::USD),
                Utc::now(),
            );
            prop_assert!(claim.matched_amount.amount() <= claim.claimed_amount.amount());
        }
    }
}
