//! Deadline enforcement for service operations.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Runs `operation` and aborts it once `limit` has elapsed.
///
/// On overrun the inner future is dropped, which cancels any pending store
/// call, and a timeout-flavoured [`AppError::Internal`] is returned.
pub async fn with_deadline<T, F>(limit: Duration, name: &'static str, operation: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation = name, timeout_ms = limit.as_millis() as u64, "Operation exceeded its deadline");
            Err(AppError::timeout(name, limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_operation_times_out() {
        let result: Result<(), AppError> = with_deadline(Duration::from_secs(1), "slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_operation_passes_through() {
        let result = with_deadline(Duration::from_secs(1), "fast", async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inner_error_is_preserved() {
        let result: Result<(), AppError> = with_deadline(Duration::from_secs(1), "failing", async {
            Err(AppError::conflict("taken", serde_json::json!({})))
        })
        .await;

        assert!(matches!(result.unwrap_err(), AppError::Conflict { .. }));
    }
}
