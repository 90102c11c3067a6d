//! SLA arithmetic for approval requests
//!
//! Hours are reported as decimals rounded to two places. The clock runs from
//! the request time to `as_of` whether or not the approval has been decided.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::approval::Approval;

const SECONDS_PER_HOUR: Decimal = dec!(3600);

/// Traffic-light classification of an SLA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaState {
    OnTrack,
    AtRisk,
    Overdue,
}

/// Position of an approval against its SLA at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaStatus {
    pub elapsed_hours: Decimal,
    pub remaining_hours: Decimal,
    pub is_overdue: bool,
    /// Share of the SLA consumed, capped at 100
    pub percent_complete: Decimal,
}

impl SlaStatus {
    /// Classifies the status; `warning_percent` marks the at-risk threshold
    pub fn state(&self, warning_percent: Decimal) -> SlaState {
        if self.is_overdue {
            SlaState::Overdue
        } else if self.percent_complete >= warning_percent {
            SlaState::AtRisk
        } else {
            SlaState::OnTrack
        }
    }
}

/// Computes where `approval` stands against its SLA at `as_of`
pub fn compute_sla(approval: &Approval, as_of: DateTime<Utc>) -> SlaStatus {
    let elapsed = hours_between(approval.requested_at, as_of).max(Decimal::ZERO);
    let remaining = hours_between(as_of, approval.due_date).max(Decimal::ZERO);
    let percent = if approval.sla_hours == 0 {
        dec!(100)
    } else {
        (elapsed / Decimal::from(approval.sla_hours) * dec!(100)).min(dec!(100))
    };

    SlaStatus {
        elapsed_hours: elapsed.round_dp(2),
        remaining_hours: remaining.round_dp(2),
        is_overdue: as_of > approval.due_date,
        percent_complete: percent.round_dp(2),
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Decimal {
    Decimal::from((to - from).num_seconds()) / SECONDS_PER_HOUR
}
