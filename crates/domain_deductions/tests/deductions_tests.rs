//! Tests for domain_deductions

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, CustomerId, MatchId, Money, TenantId, MAX_LEDGER_AMOUNT};

use domain_deductions::{
    Deduction, DeductionDecision, DeductionError, DeductionStatus, DeductionType, NewDeduction,
};

fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::USD)
}

fn new_deduction(amount: Money) -> NewDeduction {
    NewDeduction {
        tenant_id: TenantId::new(),
        deduction_type: DeductionType::Promotional,
        customer_id: Some(CustomerId::new()),
        invoice_reference: "INV-2024-00931".to_string(),
        deduction_amount: amount,
        deduction_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        due_date: None,
        reason_code: Some("PROMO".to_string()),
        reason_description: None,
    }
}

fn create_test_deduction(amount: Decimal) -> Deduction {
    Deduction::create(new_deduction(usd(amount)), Utc::now()).unwrap()
}

// ============================================================================
// Creation Tests
// ============================================================================

mod creation_tests {
    use super::*;

    #[test]
    fn test_create_is_open_and_balanced() {
        let deduction = create_test_deduction(dec!(500));

        assert_eq!(deduction.status, DeductionStatus::Open);
        assert!(deduction.matched_amount.is_zero());
        assert_eq!(deduction.remaining_amount, usd(dec!(500)));
        assert!(deduction.deduction_number.starts_with("DED-2024-"));
        assert!(deduction.is_unmatched());
    }

    #[test]
    fn test_create_requires_customer() {
        let mut input = new_deduction(usd(dec!(500)));
        input.customer_id = None;
        assert!(matches!(
            Deduction::create(input, Utc::now()),
            Err(DeductionError::Validation(_))
        ));
    }

    #[test]
    fn test_create_requires_invoice_reference() {
        let mut input = new_deduction(usd(dec!(500)));
        input.invoice_reference = String::new();
        assert!(Deduction::create(input, Utc::now()).is_err());
    }

    #[test]
    fn test_create_rejects_negative_amount() {
        let input = new_deduction(usd(dec!(-5)));
        assert!(Deduction::create(input, Utc::now()).is_err());
    }

    #[test]
    fn test_create_rejects_amount_beyond_ledger_limit() {
        let input = new_deduction(usd(MAX_LEDGER_AMOUNT));
        assert!(matches!(
            Deduction::create(input, Utc::now()),
            Err(DeductionError::Validation(_))
        ));
    }
}

// ============================================================================
// Allocation Tests
// ============================================================================

mod allocation_tests {
    use super::*;

    #[test]
    fn test_partial_allocations_then_full() {
        let mut deduction = create_test_deduction(dec!(500));

        deduction.allocate(MatchId::new(), usd(dec!(200)), Utc::now()).unwrap();
        assert_eq!(deduction.status, DeductionStatus::Open);
        assert_eq!(deduction.remaining_amount, usd(dec!(300)));

        deduction.allocate(MatchId::new(), usd(dec!(300)), Utc::now()).unwrap();
        assert_eq!(deduction.status, DeductionStatus::Matched);
        assert!(deduction.remaining_amount.is_zero());
        assert_eq!(deduction.match_ids.len(), 2);
    }

    #[test]
    fn test_allocation_beyond_remaining_fails_without_change() {
        let mut deduction = create_test_deduction(dec!(500));
        deduction.allocate(MatchId::new(), usd(dec!(450)), Utc::now()).unwrap();

        let result = deduction.allocate(MatchId::new(), usd(dec!(100)), Utc::now());
        assert!(matches!(result, Err(DeductionError::InvalidAllocation(_))));
        assert_eq!(deduction.matched_amount, usd(dec!(450)));
        assert_eq!(deduction.match_ids.len(), 1);
    }

    #[test]
    fn test_fully_matched_deduction_rejects_further_allocation() {
        let mut deduction = create_test_deduction(dec!(500));
        deduction.allocate(MatchId::new(), usd(dec!(500)), Utc::now()).unwrap();

        let result = deduction.allocate(MatchId::new(), usd(dec!(0.01)), Utc::now());
        assert!(matches!(result, Err(DeductionError::InvalidAllocation(_))));
    }

    #[test]
    fn test_zero_allocation_fails() {
        let mut deduction = create_test_deduction(dec!(500));
        let result = deduction.allocate(MatchId::new(), usd(dec!(0)), Utc::now());
        assert!(matches!(result, Err(DeductionError::InvalidAllocation(_))));
    }

    #[test]
    fn test_currency_mismatch_is_invalid_allocation() {
        let mut deduction = create_test_deduction(dec!(500));
        let result = deduction.allocate(MatchId::new(), Money::new(dec!(10), Currency::CAD), Utc::now());
        assert!(matches!(result, Err(DeductionError::InvalidAllocation(_))));
    }

    #[test]
    fn test_disputed_deduction_can_still_be_matched() {
        let mut deduction = create_test_deduction(dec!(100));
        deduction.review(Utc::now()).unwrap();
        deduction.dispute("promo not run", "ar", Utc::now()).unwrap();

        deduction.allocate(MatchId::new(), usd(dec!(100)), Utc::now()).unwrap();
        assert_eq!(deduction.status, DeductionStatus::Matched);
    }

    #[test]
    fn test_approved_deduction_is_not_matchable() {
        let mut deduction = create_test_deduction(dec!(100));
        deduction.review(Utc::now()).unwrap();
        deduction.approve("ar", Utc::now()).unwrap();

        let result = deduction.allocate(MatchId::new(), usd(dec!(10)), Utc::now());
        assert!(matches!(result, Err(DeductionError::NotMatchable(_))));
    }

    #[test]
    fn test_written_off_deduction_is_not_outstanding() {
        let mut deduction = create_test_deduction(dec!(100));
        assert!(deduction.is_outstanding());
        deduction.write_off(Some("below threshold".into()), "ar", Utc::now()).unwrap();
        assert!(!deduction.is_outstanding());
    }
}

// ============================================================================
// Transition Tests
// ============================================================================

mod transition_tests {
    use super::*;

    #[test]
    fn test_open_cannot_be_approved_directly() {
        let mut deduction = create_test_deduction(dec!(100));
        let result = deduction.approve("ar", Utc::now());
        assert!(matches!(result, Err(DeductionError::InvalidStatusTransition { .. })));
    }

    #[test]
    fn test_dispute_requires_reason() {
        let mut deduction = create_test_deduction(dec!(100));
        deduction.review(Utc::now()).unwrap();
        assert!(matches!(
            deduction.dispute(" ", "ar", Utc::now()),
            Err(DeductionError::Validation(_))
        ));
        assert_eq!(deduction.status, DeductionStatus::UnderReview);
    }

    #[test]
    fn test_dispute_records_decision() {
        let mut deduction = create_test_deduction(dec!(100));
        deduction.review(Utc::now()).unwrap();
        deduction.dispute("unauthorised", "ar", Utc::now()).unwrap();
        assert!(matches!(deduction.decision, Some(DeductionDecision::Disputed { .. })));
    }

    #[test]
    fn test_matched_is_terminal() {
        let mut deduction = create_test_deduction(dec!(100));
        deduction.allocate(MatchId::new(), usd(dec!(100)), Utc::now()).unwrap();

        assert!(deduction.write_off(None, "ar", Utc::now()).is_err());
        assert!(deduction.review(Utc::now()).is_err());
    }

    #[test]
    fn test_status_graph() {
        use DeductionStatus::*;
        assert!(Open.can_transition_to(Matched));
        assert!(Disputed.can_transition_to(WrittenOff));
        assert!(Approved.can_transition_to(WrittenOff));
        assert!(!Approved.can_transition_to(Matched));
        assert!(!Open.can_transition_to(Disputed));
        assert!(!WrittenOff.can_transition_to(Open));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("under_review".parse::<DeductionStatus>().unwrap(), DeductionStatus::UnderReview);
        assert!("closed".parse::<DeductionStatus>().is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_matched_plus_remaining_equals_amount(
        total_cents in 1i64..10_000_000,
        allocations in proptest::collection::vec(1i64..5_000_000, 0..10),
    ) {
        let mut deduction = create_test_deduction(Decimal::new(total_cents, 2));
        for cents in allocations {
            let _ = deduction.allocate(MatchId::new(), Money::from_minor(cents, Currency::USD), Utc::now());

            let sum = deduction.matched_amount.checked_add(&deduction.remaining_amount).unwrap();
            prop_assert_eq!(sum, deduction.deduction_amount);
            prop_assert!(!deduction.remaining_amount.is_negative());
            prop_assert_eq!(
                deduction.status == DeductionStatus::Matched,
                deduction.remaining_amount.is_zero()
            );
        }
    }
}
