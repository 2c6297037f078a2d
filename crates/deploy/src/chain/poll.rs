//! Fixed-interval polling with a deadline.

use std::{future::Future, time::Duration};

use tokio::time::Instant;

use super::ChainError;

/// Default interval between two polls of a transaction status.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default time to wait for a transaction to become final.
pub const DEFAULT_FINALITY_TIMEOUT: Duration = Duration::from_secs(600);

/// Shortest interval between two polls.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Used as the deadline when `now + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// How often and for how long to poll a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_FINALITY_TIMEOUT,
        }
    }
}

/// Outcome of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status<T> {
    /// Not final yet, poll again.
    Pending,
    /// Final.
    Done(T),
}

/// Repeatedly run `check` until it reports [`Status::Done`].
///
/// Network errors are treated as transient and retried until the deadline.
/// Any other error aborts the polling immediately. A check still running at
/// the deadline is dropped and the polling fails with [`ChainError::Timeout`].
pub async fn poll_until<T, F, Fut>(
    transaction_hash: &str,
    config: &PollConfig,
    mut check: F,
) -> Result<T, ChainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Status<T>, ChainError>>,
{
    let start = Instant::now();
    let deadline = start
        .checked_add(config.timeout)
        .unwrap_or_else(|| start + FAR_FUTURE);
    let interval = config.interval.max(MIN_POLL_INTERVAL);
    let timed_out = || ChainError::Timeout {
        transaction_hash: transaction_hash.to_string(),
        timeout: config.timeout,
    };
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        let Ok(outcome) = tokio::time::timeout_at(deadline, check()).await else {
            tracing::debug!(%transaction_hash, attempts, "Status poll still running at the deadline");
            return Err(timed_out());
        };

        match outcome {
            Ok(Status::Done(value)) => {
                tracing::debug!(%transaction_hash, attempts, "Transaction is final");
                return Ok(value);
            }
            Ok(Status::Pending) => {
                tracing::trace!(%transaction_hash, attempts, "Transaction pending, retrying...");
            }
            Err(ChainError::Network(e)) => {
                tracing::debug!(error = %e, %transaction_hash, attempts, "Status poll failed, retrying...");
            }
            Err(e) => return Err(e),
        }

        match Instant::now().checked_add(interval) {
            Some(next) if next <= deadline => tokio::time::sleep_until(next).await,
            _ => return Err(timed_out()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn test_returns_once_done() {
        let calls = AtomicU32::new(0);

        let value = poll_until("0x1", &fast(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Ok(Status::Pending)
                } else {
                    Ok(Status::Done(n))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_network_errors_are_retried() {
        let calls = AtomicU32::new(0);

        let value = poll_until("0x1", &fast(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ChainError::Network("connection refused".to_string()))
                } else {
                    Ok(Status::Done("accepted"))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "accepted");
    }

    #[tokio::test]
    async fn test_rejection_aborts() {
        let calls = AtomicU32::new(0);

        let err = poll_until::<(), _, _>("0x1", &fast(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ChainError::Rejected("nope".to_string())) }
        })
        .await
        .unwrap_err();

        assert_eq!(err, ChainError::Rejected("nope".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_times_out() {
        let config = PollConfig {
            interval: Duration::from_millis(5),
            timeout: Duration::from_millis(20),
        };

        let err = poll_until::<(), _, _>("0xabc", &config, || async { Ok(Status::Pending) })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChainError::Timeout { ref transaction_hash, .. } if transaction_hash == "0xabc"
        ));
    }

    #[tokio::test]
    async fn test_stalled_status_request_is_cut_at_the_deadline() {
        let config = PollConfig {
            interval: Duration::from_millis(1),
            timeout: Duration::from_millis(50),
        };
        let start = std::time::Instant::now();

        let err = poll_until::<(), _, _>("0xabc", &config, std::future::pending)
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_huge_timeout_does_not_overflow() {
        let config = PollConfig {
            interval: Duration::from_millis(1),
            timeout: Duration::from_secs(u64::MAX),
        };

        let value = poll_until("0x1", &config, || async { Ok(Status::Done(7)) })
            .await
            .unwrap();

        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_zero_interval_still_waits_between_polls() {
        let calls = AtomicU32::new(0);
        let config = PollConfig {
            interval: Duration::ZERO,
            timeout: Duration::from_millis(20),
        };

        let err = poll_until::<(), _, _>("0x1", &config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(Status::Pending) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ChainError::Timeout { .. }));
        // At most one poll per MIN_POLL_INTERVAL.
        assert!(calls.load(Ordering::SeqCst) <= 21);
    }
}
