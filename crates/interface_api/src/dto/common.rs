//! Shared DTO pieces

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use core_kernel::{Currency, Money, TenantId};

/// A money amount as sent by clients
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MoneyInput {
    pub amount: Decimal,
    pub currency: Currency,
}

impl From<MoneyInput> for Money {
    fn from(input: MoneyInput) -> Self {
        Money::new(input.amount, input.currency)
    }
}

/// `?tenant=` on read endpoints
#[derive(Debug, Deserialize)]
pub struct TenantQuery {
    pub tenant: Uuid,
}

impl TenantQuery {
    pub fn tenant_id(&self) -> TenantId {
        TenantId::from_uuid(self.tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_input_accepts_strings_and_numbers() {
        let from_str: MoneyInput =
            serde_json::from_str(r#"{"amount": "200.00", "currency": "USD"}"#).unwrap();
        let from_num: MoneyInput =
            serde_json::from_str(r#"{"amount": 200, "currency": "USD"}"#).unwrap();

        assert_eq!(Money::from(from_str), Money::new(dec!(200), Currency::USD));
        assert_eq!(Money::from(from_str), Money::from(from_num));
    }

    #[test]
    fn test_money_input_rejects_unknown_currency() {
        let parsed = serde_json::from_str::<MoneyInput>(r#"{"amount": "1", "currency": "XYZ"}"#);
        assert!(parsed.is_err());
    }
}
