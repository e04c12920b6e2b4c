//! Jittered backoff, retry and response classification.
//!
//! Every fetch a scraper makes runs through [`RetryPolicy::attempt`]:
//! transient failures and rate limits are retried, challenge pages abort the
//! source, and parse failures skip the unit immediately. Waits and in-flight
//! fetches are raced against the source's cancellation token, so a block seen
//! by one unit stops the retries of every other unit of that source.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use sleuth_core::{Sleeper, Source};
use sleuth_http::FetchedPage;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{FailureKind, Result, ScrapeError};

/// Default number of attempts per unit of work.
pub const MAX_RETRIES: u32 = 3;

/// Fixed wait after a 429/403 before the next attempt.
pub const RATE_LIMIT_PENALTY: Duration = Duration::from_secs(15);

/// Delay window between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Lower bound of the jitter window
    pub min_delay: Duration,
    /// Upper bound of the jitter window
    pub max_delay: Duration,
    /// Fixed delay after a rate limit
    pub rate_limit_penalty: Duration,
}

impl BackoffPolicy {
    /// Create a policy with the given jitter window and the default penalty.
    #[must_use]
    pub const fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            rate_limit_penalty: RATE_LIMIT_PENALTY,
        }
    }

    /// Override the rate-limit penalty.
    #[must_use]
    pub const fn with_penalty(mut self, penalty: Duration) -> Self {
        self.rate_limit_penalty = penalty;
        self
    }

    /// Delay bounds before an attempt.
    ///
    /// `previous` is the failure of the prior attempt, `None` for the first
    /// attempt. A first attempt waits only when `jitter_first` is set.
    #[must_use]
    pub fn window(&self, previous: Option<FailureKind>, jitter_first: bool) -> (Duration, Duration) {
        match previous {
            None if jitter_first => (self.min_delay, self.max_delay),
            None => (Duration::ZERO, Duration::ZERO),
            Some(FailureKind::RateLimited) => (self.rate_limit_penalty, self.rate_limit_penalty),
            Some(FailureKind::Transient) => (self.min_delay, self.max_delay),
            Some(FailureKind::Blocked | FailureKind::ParseFailure | FailureKind::Cancelled) => {
                (Duration::ZERO, Duration::ZERO)
            }
        }
    }

    /// Sample a delay uniformly from [`Self::window`].
    #[must_use]
    pub fn delay(&self, previous: Option<FailureKind>, jitter_first: bool) -> Duration {
        let (low, high) = self.window(previous, jitter_first);
        if high <= low {
            return low;
        }
        let millis = rand::thread_rng().gen_range(low.as_millis()..=high.as_millis());
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}

/// Bounded retry driven by a [`BackoffPolicy`] and an injected sleeper.
#[derive(Clone)]
pub struct RetryPolicy {
    backoff: BackoffPolicy,
    max_retries: u32,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryPolicy {
    /// Create a retry policy.
    pub fn new(backoff: BackoffPolicy, max_retries: u32, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            backoff,
            max_retries: max_retries.max(1),
            sleeper,
        }
    }

    /// Backoff window in use.
    #[must_use]
    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Total attempts per unit.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Sleep for `delay` unless `cancel` fires first.
    async fn wait(&self, unit: &str, delay: Duration, cancel: &CancellationToken) -> Result<()> {
        let cancelled = || ScrapeError::Cancelled {
            unit: unit.to_string(),
        };
        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(cancelled()),
            () = self.sleeper.sleep(delay) => Ok(()),
        }
    }

    /// Wait one jitter window before an extra request made outside
    /// [`Self::attempt`].
    pub async fn pause(&self, unit: &str, cancel: &CancellationToken) -> Result<()> {
        self.wait(unit, self.backoff.delay(None, true), cancel).await
    }

    /// Run `operation` until it succeeds or the failure is not retryable.
    ///
    /// Blocked and parse failures are returned after a single attempt. The
    /// last transient or rate-limit error is returned once attempts run out.
    /// Once `cancel` fires no further attempt starts, and a pending wait or
    /// fetch is dropped with [`ScrapeError::Cancelled`].
    pub async fn attempt<T, F, Fut>(
        &self,
        unit: &str,
        jitter_first: bool,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut previous = None;
        let mut last_error = ScrapeError::Transient {
            unit: unit.to_string(),
            reason: "no attempts made".to_string(),
        };

        for attempt in 1..=self.max_retries {
            self.wait(unit, self.backoff.delay(previous, jitter_first), cancel)
                .await?;

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(ScrapeError::Cancelled {
                    unit: unit.to_string(),
                }),
                outcome = operation() => outcome,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => match e.kind() {
                    FailureKind::Blocked | FailureKind::ParseFailure | FailureKind::Cancelled => {
                        return Err(e)
                    }
                    kind => {
                        debug!(unit, attempt, error = %e, "Attempt failed");
                        previous = Some(kind);
                        last_error = e;
                    }
                },
            }
        }

        Err(last_error)
    }
}

/// Classify a fetched page.
///
/// Block signatures are matched case-insensitively against the body before
/// the status is considered, so a 403 challenge page counts as blocked.
pub fn classify(page: &FetchedPage, unit: &str, source: Source, signatures: &[&str]) -> Result<()> {
    if !signatures.is_empty() {
        let body = page.body.to_lowercase();
        if let Some(signature) = signatures.iter().find(|s| body.contains(&s.to_lowercase())) {
            return Err(ScrapeError::Blocked {
                site: source,
                signature: (*signature).to_string(),
            });
        }
    }

    match page.status {
        429 | 403 => Err(ScrapeError::RateLimited {
            unit: unit.to_string(),
            status: page.status,
        }),
        _ if page.is_success() => Ok(()),
        status => Err(ScrapeError::Transient {
            unit: unit.to_string(),
            reason: format!("unexpected status {status}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleuth_core::clock::RecordingSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};

    const _: () = assert!(MAX_RETRIES > 0);
    const _: () = assert!(RATE_LIMIT_PENALTY.as_secs() == 15);

    fn policy(sleeper: Arc<RecordingSleeper>) -> RetryPolicy {
        RetryPolicy::new(
            BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(3)),
            MAX_RETRIES,
            sleeper,
        )
    }

    #[test]
    fn test_window_first_attempt() {
        let backoff = BackoffPolicy::new(Duration::from_secs(2), Duration::from_secs(4));
        assert_eq!(backoff.window(None, false), (Duration::ZERO, Duration::ZERO));
        assert_eq!(
            backoff.window(None, true),
            (Duration::from_secs(2), Duration::from_secs(4))
        );
    }

    #[test]
    fn test_window_after_failures() {
        let backoff = BackoffPolicy::new(Duration::from_secs(3), Duration::from_secs(7));
        assert_eq!(
            backoff.window(Some(FailureKind::RateLimited), false),
            (RATE_LIMIT_PENALTY, RATE_LIMIT_PENALTY)
        );
        assert_eq!(
            backoff.window(Some(FailureKind::Transient), false),
            (Duration::from_secs(3), Duration::from_secs(7))
        );
    }

    #[test]
    fn test_delay_within_window() {
        let backoff = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(3));
        for _ in 0..50 {
            let delay = backoff.delay(Some(FailureKind::Transient), false);
            assert!(delay >= Duration::from_secs(1) && delay <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_classify() {
        let sigs = ["captcha", "Just a moment"];

        let challenge = FetchedPage::new(403, "<title>JUST A MOMENT...</title>");
        assert!(matches!(
            classify(&challenge, "page 0", Source::Indeed, &sigs),
            Err(ScrapeError::Blocked { .. })
        ));

        let limited = FetchedPage::new(429, "slow down");
        assert!(matches!(
            classify(&limited, "page 0", Source::Indeed, &sigs),
            Err(ScrapeError::RateLimited { status: 429, .. })
        ));

        let forbidden = FetchedPage::new(403, "");
        assert!(matches!(
            classify(&forbidden, "page 0", Source::Indeed, &sigs),
            Err(ScrapeError::RateLimited { status: 403, .. })
        ));

        let unavailable = FetchedPage::new(503, "");
        assert_eq!(
            classify(&unavailable, "page 0", Source::Indeed, &sigs)
                .unwrap_err()
                .kind(),
            FailureKind::Transient
        );

        let ok = FetchedPage::new(200, "<html>jobs</html>");
        assert!(classify(&ok, "page 0", Source::Indeed, &sigs).is_ok());
    }

    #[tokio::test]
    async fn test_blocked_is_not_retried() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = policy(sleeper.clone())
            .attempt("page 0", false, &CancellationToken::new(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ScrapeError::Blocked {
                    site: Source::Linkedin,
                    signature: "captcha".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(ScrapeError::Blocked { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_waits_penalty_then_succeeds() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = policy(sleeper.clone())
            .attempt("acme", false, &CancellationToken::new(), move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(ScrapeError::RateLimited {
                        unit: "acme".to_string(),
                        status: 429,
                    })
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(sleeper.calls(), vec![RATE_LIMIT_PENALTY]);
    }

    #[tokio::test]
    async fn test_transient_exhausts_attempts() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = policy(sleeper.clone())
            .attempt("page 2", true, &CancellationToken::new(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ScrapeError::Transient {
                    unit: "page 2".to_string(),
                    reason: "timeout".to_string(),
                })
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), FailureKind::Transient);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES);
        assert_eq!(sleeper.calls().len(), MAX_RETRIES as usize);
    }

    #[tokio::test]
    async fn test_parse_failure_skips_without_retry() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<()> = policy(sleeper)
            .attempt("stripe", false, &CancellationToken::new(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ScrapeError::ParseFailure {
                    unit: "stripe".to_string(),
                    reason: "expected value".to_string(),
                })
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), FailureKind::ParseFailure);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_source_makes_no_attempt() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<()> = policy(sleeper.clone())
            .attempt("page 1", true, &cancel, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), FailureKind::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_between_attempts_stops_retrying() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let token = CancellationToken::new();
        let cancel = &token;

        let result: Result<()> = policy(sleeper.clone())
            .attempt("page 1", false, cancel, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                cancel.cancel();
                Err(ScrapeError::Transient {
                    unit: "page 1".to_string(),
                    reason: "unexpected status 503".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(ScrapeError::Cancelled { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pause_sleeps_one_jitter_window() {
        let sleeper = Arc::new(RecordingSleeper::new());
        let retry = policy(sleeper.clone());

        retry.pause("stripe", &CancellationToken::new()).await.unwrap();
        let calls = sleeper.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0] >= Duration::from_secs(1) && calls[0] <= Duration::from_secs(3));

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(retry.pause("stripe", &cancel).await.is_err());
        assert_eq!(sleeper.calls().len(), 1);
    }
}
