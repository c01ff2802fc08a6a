//! Deadline helpers for the matching phase.
//!
//! Matchers block on their header read; the pipeline bounds that wait so a
//! peer that never finishes its handshake cannot pin a task forever.

use crate::error::{Result, SniffError};
use std::future::Future;
use std::time::Duration;

/// Default deadline for one matcher evaluation
pub const DEFAULT_MATCHING_TIMEOUT: Duration = Duration::from_secs(3);

/// Shortest matching timeout accepted by configuration validation
pub const MIN_MATCHING_TIMEOUT: Duration = Duration::from_millis(10);

/// Longest matching timeout accepted by configuration validation
pub const MAX_MATCHING_TIMEOUT: Duration = Duration::from_secs(300);

/// Run `fut` under `duration`, mapping an elapsed deadline to `SniffError::Timeout`
pub async fn with_timeout<F, T>(duration: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| SniffError::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let value = with_timeout(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_elapsed_deadline_is_timeout() {
        let result: Result<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(SniffError::Timeout)));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<()> = with_timeout(Duration::from_secs(1), async {
            Err(SniffError::Custom("boom".into()))
        })
        .await;
        assert!(matches!(result, Err(SniffError::Custom(_))));
    }
}
