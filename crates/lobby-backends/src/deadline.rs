use std::future::Future;
use std::time::Duration;

use crate::error::BackendError;

/// Wraps any backend call with a hard deadline (§5: "must honor a hard
/// deadline; default 2 seconds"). A timeout is surfaced as
/// `BackendError::Timeout`, which the engine treats the same as
/// backend-unavailable.
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout { ms: deadline.as_millis() as u64 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fast_call_passes_through() {
        let result = with_deadline(Duration::from_millis(50), async { Ok::<_, BackendError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let result = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, BackendError>(42)
        })
        .await;
        assert!(matches!(result, Err(BackendError::Timeout { ms: 10 })));
    }
}
