//! Money types with precise decimal arithmetic
//!
//! Every claimed, deducted, matched, and settled amount in the system is a
//! [`Money`] value. Amounts are `rust_decimal::Decimal`, so comparisons are
//! exact: two amounts either match to the last minor unit or they do not.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    CHF,
    INR,
    AUD,
    CAD,
    SGD,
    HKD,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::CHF => "CHF",
            Currency::INR => "₹",
            Currency::AUD => "A$",
            Currency::CAD => "C$",
            Currency::SGD => "S$",
            Currency::HKD => "HK$",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CHF => "CHF",
            Currency::INR => "INR",
            Currency::AUD => "AUD",
            Currency::CAD => "CAD",
            Currency::SGD => "SGD",
            Currency::HKD => "HKD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            "JPY" => Ok(Currency::JPY),
            "CHF" => Ok(Currency::CHF),
            "INR" => Ok(Currency::INR),
            "AUD" => Ok(Currency::AUD),
            "CAD" => Ok(Currency::CAD),
            "SGD" => Ok(Currency::SGD),
            "HKD" => Ok(Currency::HKD),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Exclusive upper bound on the magnitude of a stored amount
///
/// Ledger columns are NUMERIC(19,4), which leaves fifteen integer digits.
pub const MAX_LEDGER_AMOUNT: Decimal = dec!(1000000000000000);

/// A monetary amount with associated currency
///
/// Amounts are stored with 4 decimal places internally. Arithmetic between
/// two values is only defined for the same currency, which is why the
/// operations here are `checked_*` and return [`MoneyError`] instead of
/// panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates Money from an integer amount in minor units (e.g., cents)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        let divisor = Decimal::new(10_i64.pow(currency.decimal_places()), 0);
        Self::new(Decimal::new(minor_units, 0) / divisor, currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Fails when the amount does not fit a ledger column
    pub fn ensure_storable(&self) -> Result<(), MoneyError> {
        if self.amount.abs() >= MAX_LEDGER_AMOUNT {
            return Err(MoneyError::InvalidAmount(format!(
                "{} exceeds the ledger limit of {}",
                self, MAX_LEDGER_AMOUNT
            )));
        }
        Ok(())
    }

    /// Fails unless `other` carries the same currency
    pub fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| MoneyError::InvalidAmount(format!("{self} + {other} overflows")))?;
        Ok(Self::new(amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| MoneyError::InvalidAmount(format!("{self} - {other} overflows")))?;
        Ok(Self::new(amount, self.currency))
    }

    /// Compares two amounts of the same currency
    pub fn checked_cmp(&self, other: &Money) -> Result<Ordering, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Returns the smaller of two amounts of the same currency
    pub fn checked_min(&self, other: &Money) -> Result<Money, MoneyError> {
        Ok(match self.checked_cmp(other)? {
            Ordering::Greater => *other,
            _ => *self,
        })
    }

    /// Sums an iterator of amounts, all of which must be in `currency`
    pub fn sum<'a, I>(currency: Currency, items: I) -> Result<Money, MoneyError>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(100.50), Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::USD);
    }

    #[test]
    fn test_money_from_minor() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_money_checked_arithmetic() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(50.00), Currency::USD);

        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(150.00));
        assert_eq!(a.checked_sub(&b).unwrap().amount(), dec!(50.00));
        assert_eq!(a.checked_min(&b).unwrap(), b);
    }

    #[test]
    fn test_currency_mismatch() {
        let usd = Money::new(dec!(100.00), Currency::USD);
        let eur = Money::new(dec!(100.00), Currency::EUR);

        let result = usd.checked_add(&eur);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
        assert!(usd.checked_cmp(&eur).is_err());
    }

    #[test]
    fn test_exact_equality_has_no_tolerance() {
        let a = Money::new(dec!(500.00), Currency::USD);
        let b = Money::new(dec!(500.009), Currency::USD);
        assert_ne!(a, b);
        assert_eq!(a, Money::new(dec!(500), Currency::USD));
    }

    #[test]
    fn test_money_sum() {
        let parts = vec![
            Money::new(dec!(200.00), Currency::USD),
            Money::new(dec!(300.00), Currency::USD),
        ];
        let total = Money::sum(Currency::USD, &parts).unwrap();
        assert_eq!(total.amount(), dec!(500.00));

        let empty: Vec<Money> = vec![];
        assert!(Money::sum(Currency::EUR, &empty).unwrap().is_zero());
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert!(matches!(
            "XYZ".parse::<Currency>(),
            Err(MoneyError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn test_display() {
        let m = Money::new(dec!(1234.5), Currency::USD);
        assert_eq!(m.to_string(), "$ 1234.50");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn checked_add_then_sub_is_identity(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
        ) {
            let ma = Money::from_minor(a, Currency::USD);
            let mb = Money::from_minor(b, Currency::USD);

            let back = ma.checked_add(&mb).unwrap().checked_sub(&mb).unwrap();
            prop_assert_eq!(back, ma);
        }

        #[test]
        fn sum_is_order_independent(
            parts in proptest::collection::vec(0i64..1_000_000i64, 0..20)
        ) {
            let forward: Vec<Money> = parts.iter().map(|p| Money::from_minor(*p, Currency::USD)).collect();
            let mut reversed = forward.clone();
            reversed.reverse();

            prop_assert_eq!(
                Money::sum(Currency::USD, &forward).unwrap(),
                Money::sum(Currency::USD, &reversed).unwrap()
            );
        }
    }
}
