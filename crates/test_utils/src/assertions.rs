//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for reconciliation types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_claims::Claim;
use domain_deductions::{Deduction, DeductionStatus};

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts that money values sum to a total
///
/// # Panics
///
/// Panics if the currencies differ or the sum doesn't equal the total
pub fn assert_money_sum(parts: &[Money], total: &Money) {
    let sum = Money::sum(total.currency(), parts.iter())
        .unwrap_or_else(|e| panic!("Cannot sum parts: {e}"));
    assert_eq!(
        sum, *total,
        "Parts sum to {} but expected {}",
        sum, total
    );
}

/// Asserts the deduction balance invariant
///
/// `matched + remaining == amount`, `remaining >= 0`, and the status is
/// `matched` exactly when nothing remains (written-off deductions excepted).
pub fn assert_deduction_balanced(deduction: &Deduction) {
    let sum = deduction
        .matched_amount
        .checked_add(&deduction.remaining_amount)
        .unwrap_or_else(|e| panic!("Deduction {} mixes currencies: {e}", deduction.id));
    assert_eq!(
        sum, deduction.deduction_amount,
        "Deduction {}: matched {} + remaining {} != amount {}",
        deduction.id, deduction.matched_amount, deduction.remaining_amount, deduction.deduction_amount
    );
    assert!(
        !deduction.remaining_amount.is_negative(),
        "Deduction {} has negative remaining {}",
        deduction.id,
        deduction.remaining_amount
    );
    if deduction.status != DeductionStatus::WrittenOff {
        assert_eq!(
            deduction.status == DeductionStatus::Matched,
            deduction.remaining_amount.is_zero(),
            "Deduction {} is {} with remaining {}",
            deduction.id,
            deduction.status,
            deduction.remaining_amount
        );
    }
}

/// Asserts the claim amount invariants
///
/// Approved never exceeds claimed, settled never exceeds approved, and
/// allocations never exceed the claimed amount.
pub fn assert_claim_amounts_consistent(claim: &Claim) {
    if let Some(approved) = claim.approved_amount {
        assert!(
            approved.amount() <= claim.claimed_amount.amount(),
            "Claim {} approved {} above claimed {}",
            claim.claim_number,
            approved,
            claim.claimed_amount
        );
        if let Some(settled) = claim.settled_amount {
            assert!(
                settled.amount() <= approved.amount(),
                "Claim {} settled {} above approved {}",
                claim.claim_number,
                settled,
                approved
            );
        }
    }
    assert!(
        claim.matched_amount.amount() <= claim.claimed_amount.amount(),
        "Claim {} matched {} above claimed {}",
        claim.claim_number,
        claim.matched_amount,
        claim.claimed_amount
    );
}

/// Asserts that a result is an error matching the pattern
#[macro_export]
macro_rules! assert_err_matches {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Err(other) => panic!("Expected error matching {}, got {:?}", stringify!($pattern), other),
            Ok(value) => panic!("Expected error matching {}, got Ok({:?})", stringify!($pattern), value),
        }
    };
}
