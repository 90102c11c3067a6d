//! Engine configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use core_kernel::{Currency, Timezone};

/// Tunables for the reconciliation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Attempts for one read-decide-write cycle before giving up
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,

    /// Linear backoff step between attempts
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// SLA applied to approval requests that carry none
    #[serde(default = "default_sla_hours")]
    pub default_sla_hours: u32,

    /// Percent of the SLA after which an approval counts as at risk
    #[serde(default = "default_sla_warning_percent")]
    pub sla_warning_percent: Decimal,

    /// Calendar used for aging buckets
    #[serde(default)]
    pub reporting_timezone: Timezone,

    /// Currency of an empty report
    #[serde(default = "default_currency")]
    pub default_currency: Currency,
}

fn default_max_write_attempts() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    20
}

fn default_sla_hours() -> u32 {
    48
}

fn default_sla_warning_percent() -> Decimal {
    dec!(75)
}

fn default_currency() -> Currency {
    Currency::USD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: default_max_write_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            default_sla_hours: default_sla_hours(),
            sla_warning_percent: default_sla_warning_percent(),
            reporting_timezone: Timezone::default(),
            default_currency: default_currency(),
        }
    }
}

impl EngineConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_write_attempts.max(1),
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

/// Bounded retry with linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        EngineConfig::default().retry_policy()
    }
}
