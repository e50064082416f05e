use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use backoff::future::retry;

use crate::error::StorageError;

const PER_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);

/// The retry envelope every non-transactional storage call goes through:
/// 50ms initial interval, x2.0 multiplier, ±50% jitter, capped at 500ms
/// per attempt, giving up after 2s total, with each individual attempt
/// itself bounded to 2s. Only [`StorageError::is_transient`] errors are
/// retried — not-found, duplicate, cancelled, and deadline-exceeded all
/// fail on the attempt that hit them.
pub async fn with_retry<F, Fut, T>(op: F) -> Result<T, StorageError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(50))
        .with_multiplier(2.0)
        .with_randomization_factor(0.5)
        .with_max_interval(Duration::from_millis(500))
        .with_max_elapsed_time(Some(Duration::from_secs(2)))
        .build();

    retry(backoff, || async {
        let attempt = tokio::time::timeout(PER_ATTEMPT_TIMEOUT, op()).await;
        match attempt {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) if e.is_transient() => Err(backoff::Error::transient(e)),
            Ok(Err(e)) => Err(backoff::Error::permanent(e)),
            Err(_) => Err(backoff::Error::permanent(StorageError::TimeoutExpired)),
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(|| async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(StorageError::ConnectionClosed)
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), StorageError> = with_retry(|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::NotFound)
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_operation_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), StorageError> = with_retry(|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::OperationCancelled)
        })
        .await;

        assert!(matches!(result, Err(StorageError::OperationCancelled)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn an_attempt_exceeding_the_per_attempt_timeout_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), StorageError> = with_retry(|| async {
            attempts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(PER_ATTEMPT_TIMEOUT + Duration::from_secs(1)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(StorageError::TimeoutExpired)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
