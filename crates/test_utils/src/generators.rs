//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data that
//! maintains domain invariants.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{Currency, Money};
use domain_approvals::Priority;
use proptest::prelude::*;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::CAD),
        Just(Currency::AUD),
    ]
}

/// Strategy for positive amounts in minor units, up to ten million
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for generating valid USD Money values
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Strategy for generating valid Money values with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// A total and a sequence of allocation attempts against it, in cents
///
/// Attempts may overshoot the total; callers check that overshooting
/// allocations are refused.
pub fn allocation_plan_strategy() -> impl Strategy<Value = (i64, Vec<i64>)> {
    (1i64..10_000_000i64).prop_flat_map(|total| {
        (
            Just(total),
            proptest::collection::vec(1i64..=total, 0..8),
        )
    })
}

/// Strategy for approval priorities
pub fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Urgent),
        Just(Priority::High),
        Just(Priority::Normal),
        Just(Priority::Low),
    ]
}

/// Strategy for SLA lengths in hours, including zero
pub fn sla_hours_strategy() -> impl Strategy<Value = u32> {
    0u32..720u32
}

/// Strategy for timestamps within 2024
pub fn datetime_2024_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..(365 * 24 * 60)).prop_map(|minutes| {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    })
}

/// Strategy for calendar dates within 2024
pub fn date_2024_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..365).prop_map(|days| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_positive_money_is_positive(money in positive_money_strategy()) {
            prop_assert!(money.is_positive());
        }

        #[test]
        fn test_allocation_plan_attempts_fit_total((total, attempts) in allocation_plan_strategy()) {
            for attempt in attempts {
                prop_assert!(attempt >= 1 && attempt <= total);
            }
        }

        #[test]
        fn test_dates_stay_in_2024(date in date_2024_strategy()) {
            prop_assert_eq!(chrono::Datelike::year(&date), 2024);
        }
    }
}
