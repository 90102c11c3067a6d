//! Reconciliation report query

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use core_kernel::{Currency, CustomerId, DateRange, TenantId};
use domain_reconciliation::ReconciliationQuery;

use crate::error::ApiError;

/// `GET reconcile` parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileParams {
    pub tenant: Uuid,
    pub customer: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub as_of: Option<DateTime<Utc>>,
    pub currency: Option<Currency>,
}

impl ReconcileParams {
    pub fn tenant_id(&self) -> TenantId {
        TenantId::from_uuid(self.tenant)
    }

    pub fn to_query(&self) -> Result<ReconciliationQuery, ApiError> {
        let period = DateRange::new(self.start_date, self.end_date)
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        Ok(ReconciliationQuery {
            customer_id: self.customer.map(CustomerId::from_uuid),
            period,
            as_of: self.as_of,
            currency: self.currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(start: &str, end: &str) -> ReconcileParams {
        ReconcileParams {
            tenant: Uuid::new_v4(),
            customer: None,
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            as_of: None,
            currency: Some(Currency::EUR),
        }
    }

    #[test]
    fn test_builds_query_for_window() {
        let query = params("2024-01-01", "2024-03-31").to_query().unwrap();
        assert_eq!(query.customer_id, None);
        assert_eq!(query.currency, Some(Currency::EUR));
        assert_eq!(query.period.to_string(), "2024-01-01..=2024-03-31");
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let err = params("2024-04-01", "2024-03-31").to_query().unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
