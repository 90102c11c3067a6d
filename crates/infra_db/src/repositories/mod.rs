//! Repository implementations for the ledger tables
//!
//! Each repository maps between a `sqlx::FromRow` row struct and the domain
//! type. Statuses and other enums are stored as their snake_case strings and
//! money as a NUMERIC amount next to a currency code.
//!
//! Writes take a `&mut PgConnection` so callers can group them in one
//! transaction; every update is conditional on the row's `version`.

pub mod approvals;
pub mod audit;
pub mod claims;
pub mod deductions;

pub use approvals::ApprovalRepository;
pub use audit::AuditRepository;
pub use claims::ClaimRepository;
pub use deductions::DeductionRepository;

use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;

use core_kernel::{Currency, Money};

use crate::error::DatabaseError;

pub(crate) fn parse_enum<T>(value: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| DatabaseError::serialization(e.to_string()))
}

pub(crate) fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    parse_enum(code)
}

pub(crate) fn optional_money(amount: Option<Decimal>, currency: Currency) -> Option<Money> {
    amount.map(|a| Money::new(a, currency))
}
