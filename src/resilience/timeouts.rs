//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a single deadline
//! - Cancel the outbound future cleanly when the deadline fires
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out relays are reported as 502 with `UPSTREAM_TIMEOUT`

use std::future::Future;
use std::time::Duration;

use tokio::time;

/// The deadline expired before the wrapped future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` to completion or drop it once `limit` has elapsed.
pub async fn within<F, T>(limit: Duration, fut: F) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineExceeded(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_before_deadline() {
        let out = within(Duration::from_millis(200), async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let out = within(Duration::from_secs(120), time::sleep(Duration::from_secs(600))).await;
        assert_eq!(out, Err(DeadlineExceeded(Duration::from_secs(120))));
    }
}
