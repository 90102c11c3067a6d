//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the reconciliation domain. These
//! fixtures are deterministic so unit tests stay predictable.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{ClaimId, Currency, CustomerId, DateRange, DeductionId, Money, TenantId};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The amount used by the exact auto-match scenarios
    pub fn usd_500() -> Money {
        Money::new(dec!(500.00), Currency::USD)
    }

    pub fn usd_200() -> Money {
        Money::new(dec!(200.00), Currency::USD)
    }

    pub fn usd_300() -> Money {
        Money::new(dec!(300.00), Currency::USD)
    }

    /// Total claimed in the variance scenario
    pub fn usd_10_000() -> Money {
        Money::new(dec!(10000.00), Currency::USD)
    }

    /// Total deducted in the variance scenario
    pub fn usd_9_200() -> Money {
        Money::new(dec!(9200.00), Currency::USD)
    }

    /// Creates a zero amount
    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// Creates a EUR amount for currency mismatch tests
    pub fn eur_500() -> Money {
        Money::new(dec!(500.00), Currency::EUR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Start of the standard reporting window (Jan 1, 2024)
    pub fn period_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// End of the standard reporting window (Mar 31, 2024)
    pub fn period_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    /// The first quarter of 2024, inclusive
    pub fn q1_2024() -> DateRange {
        DateRange::new(Self::period_start(), Self::period_end()).unwrap()
    }

    /// A date inside the standard window
    pub fn in_period() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
    }

    /// Aging reference instant, noon UTC on the last day of the window
    pub fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    /// `days` calendar days before [`TemporalFixtures::as_of`]
    pub fn days_before_as_of(days: i64) -> NaiveDate {
        (Self::as_of() - Duration::days(days)).date_naive()
    }

    /// Time an approval was requested in the SLA scenarios
    pub fn requested_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Creates a deterministic tenant ID for testing
    pub fn tenant_id() -> TenantId {
        TenantId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// A second tenant for isolation tests
    pub fn other_tenant_id() -> TenantId {
        TenantId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440009").unwrap())
    }

    /// Creates a deterministic customer ID for testing
    pub fn customer_id() -> CustomerId {
        CustomerId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap())
    }

    /// Creates a deterministic claim ID for testing
    pub fn claim_id() -> ClaimId {
        ClaimId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap())
    }

    /// Creates a deterministic deduction ID for testing
    pub fn deduction_id() -> DeductionId {
        DeductionId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440004").unwrap())
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn actor() -> &'static str {
        "ar.analyst@example.com"
    }

    pub fn approver() -> &'static str {
        "finance.manager@example.com"
    }

    pub fn invoice_reference() -> &'static str {
        "INV-2024-00931"
    }

    pub fn dispute_reason() -> &'static str {
        "Promotion not executed in store"
    }
}
