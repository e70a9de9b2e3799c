// Client-side throttling for the public AppView, plus 429 retries.
//
// Bluesky allows roughly 3000 requests per 5 minutes per client. A large
// raffle (tens of thousands of likes, followed by relationship batches) can
// get close to that, so every XRPC call goes through `RateLimiter::acquire`
// and, on a 429, is retried with exponential backoff. Only the HTTP attempt
// itself is bounded by a timeout; waiting for the window or a backoff never
// counts against it.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{info, warn};

use super::graph::XrpcError;

/// Bluesky's documented public limit.
pub const DEFAULT_MAX_REQUESTS: u32 = 3000;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(300);

/// Sliding-window request limiter, shared by reference across concurrent calls.
pub struct RateLimiter {
    /// Timestamps of requests still inside the window, oldest first.
    requests: Mutex<VecDeque<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            requests: Mutex::new(VecDeque::new()),
            max_requests,
            window,
        }
    }

    /// Wait until the window has room, then record the request.
    pub async fn acquire(&self) {
        loop {
            // Decide under the lock, sleep without it.
            let wait = {
                let now = Instant::now();
                let mut requests = self
                    .requests
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);

                while requests
                    .front()
                    .is_some_and(|&oldest| now.duration_since(oldest) >= self.window)
                {
                    requests.pop_front();
                }

                match requests.front() {
                    Some(&oldest) if requests.len() as u32 >= self.max_requests => {
                        (oldest + self.window).saturating_duration_since(now)
                    }
                    _ => {
                        requests.push_back(now);
                        return;
                    }
                }
            };

            info!(
                delay_ms = wait.as_millis() as u64,
                "Rate limit: waiting {}ms before next request",
                wait.as_millis()
            );
            tokio::time::sleep(wait).await;
        }
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Maximum number of retry attempts on rate-limit (429) errors.
const MAX_RETRIES: u32 = 5;

/// Base delay for exponential backoff (doubles each retry).
const BASE_BACKOFF: Duration = Duration::from_secs(2);

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Backoff before retry number `attempt` (1-based), before jitter.
fn backoff_for(attempt: u32) -> Duration {
    BASE_BACKOFF
        .saturating_mul(1u32 << attempt.min(16))
        .min(MAX_BACKOFF)
}

/// Run `operation`, retrying on 429 with jittered exponential backoff.
///
/// Each attempt gets `attempt_timeout` on its own and fails with
/// `XrpcError::Timeout` when it runs over. Every error other than a 429 is
/// returned as-is on the first failure; the raffle pipeline relies on this
/// being the only retry layer.
pub async fn with_retry<F, Fut, T>(
    rate_limiter: &RateLimiter,
    attempt_timeout: Duration,
    nsid: &str,
    operation: F,
) -> Result<T, XrpcError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, XrpcError>>,
{
    let mut attempt = 0u32;

    loop {
        rate_limiter.acquire().await;

        let outcome = tokio::time::timeout(attempt_timeout, operation())
            .await
            .unwrap_or_else(|_| {
                Err(XrpcError::Timeout {
                    nsid: nsid.to_string(),
                    after: attempt_timeout,
                })
            });

        match outcome {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limited() && attempt < MAX_RETRIES => {
                attempt += 1;

                // +/- 25% so concurrent batches don't retry in lockstep
                let jitter = rand::rng().random_range(0.75..1.25);
                let delay = backoff_for(attempt).mul_f64(jitter);

                warn!(
                    nsid = nsid,
                    attempt = attempt,
                    max_retries = MAX_RETRIES,
                    backoff_secs = delay.as_secs_f64(),
                    "Rate limited (429), retrying in {:.1}s (attempt {}/{})",
                    delay.as_secs_f64(),
                    attempt,
                    MAX_RETRIES,
                );

                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
