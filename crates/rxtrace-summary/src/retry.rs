//! Backoff policy for summarization calls.
//!
//! A call is retried when the request never got an answer (connect or
//! timeout failures) or when the summarizer reports itself temporarily
//! unavailable: 429, 502, 503 or 504. Any other status is final and goes
//! back to the caller untouched, as does the last response once the retry
//! budget is spent.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};

/// How many times, and how patiently, a summary call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry. Doubles per attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Never repeat a call.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `send` until it produces a final outcome or the budget runs out.
    pub(crate) async fn run<F, Fut>(&self, send: F) -> Result<Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut attempt = 0;
        loop {
            let outcome = send().await;
            let reason = match &outcome {
                Ok(resp) if transient_status(resp.status()) => resp.status().to_string(),
                Err(e) if transient_transport(e) => e.to_string(),
                _ => return outcome,
            };
            if attempt >= self.max_retries {
                return outcome;
            }
            let delay = self.delay(attempt);
            attempt += 1;
            tracing::warn!(
                attempt,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                reason = %reason,
                "summarizer unavailable, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn transient_transport(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
