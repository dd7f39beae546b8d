use std::time::Duration;

use async_trait::async_trait;
use tripwire_common::retry::{retry_async, RetryConfig};

use super::channel::{Notifier, NotifyError};
use crate::alert::AlertEvent;

/// Wraps a notifier so a failed delivery is retried with doubling delays.
/// The last error is returned once `max_retries` extra attempts are spent.
pub struct RetryNotifier<N: Notifier> {
    inner: N,
    policy: RetryConfig,
}

impl<N: Notifier> RetryNotifier<N> {
    pub fn new(inner: N, max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            inner,
            policy: RetryConfig {
                max_attempts: max_retries.saturating_add(1),
                initial_delay: Duration::from_millis(base_delay_ms),
                backoff_factor: 2.0,
            },
        }
    }
}

#[async_trait]
impl<N: Notifier> Notifier for RetryNotifier<N> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        retry_async(&self.policy, || self.inner.send(event)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::tests::sample_event;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FailingNotifier {
        fail_count: AtomicU32,
        max_failures: u32,
    }

    impl FailingNotifier {
        fn new(max_failures: u32) -> Self {
            Self {
                fail_count: AtomicU32::new(0),
                max_failures,
            }
        }
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        fn name(&self) -> &str {
            "test"
        }

        async fn send(&self, _event: &AlertEvent) -> Result<(), NotifyError> {
            let count = self.fail_count.fetch_add(1, Ordering::SeqCst);
            if count < self.max_failures {
                Err(NotifyError(format!("fail #{}", count + 1)))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let retry = RetryNotifier::new(FailingNotifier::new(0), 3, 1);
        assert!(retry.send(&sample_event()).await.is_ok());
        assert_eq!(retry.inner.fail_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_retries() {
        let retry = RetryNotifier::new(FailingNotifier::new(2), 3, 1);
        assert!(retry.send(&sample_event()).await.is_ok());
        assert_eq!(retry.inner.fail_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fails_after_max_retries() {
        let retry = RetryNotifier::new(FailingNotifier::new(10), 2, 1);
        let err = retry.send(&sample_event()).await.unwrap_err();
        assert_eq!(err.0, "fail #3");
        assert_eq!(retry.name(), "test");
    }
}
