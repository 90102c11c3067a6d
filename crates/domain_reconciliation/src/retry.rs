//! Read-decide-write retry loop

use std::future::Future;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::EngineError;

/// Runs `cycle` until it succeeds, fails for a non-retryable reason, or the
/// policy's attempts are spent
///
/// Each attempt must re-read its inputs; a retried cycle never reuses state
/// from an attempt that lost a version race.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut cycle: F,
) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    let mut attempt = 1;
    loop {
        match cycle().await {
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                debug!(operation, attempt, error = %err, "retrying ledger write");
                tokio::time::sleep(policy.delay_after(attempt)).await;
                attempt += 1;
            }
            Err(err) if err.is_retryable() => {
                warn!(operation, attempts = attempt, error = %err, "ledger write attempts exhausted");
                return Err(EngineError::StoreUnavailable(format!(
                    "{operation} failed after {attempt} attempts: {err}"
                )));
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_conflicts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(&fast_policy(3), "test", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(EngineError::StoreUnavailable("conflict".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = with_retry(&fast_policy(2), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::StoreUnavailable("timeout".into()))
        })
        .await;

        assert!(matches!(result, Err(EngineError::StoreUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_domain_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = with_retry(&fast_policy(5), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::Validation("bad".into()))
        })
        .await;

        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
