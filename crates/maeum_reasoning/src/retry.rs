//! Retry with exponential backoff for calls to external inference services.
//!
//! Retries on transient errors (429, 408, 5xx gateway/server errors, network
//! failures). Client errors fail immediately.

use anyhow::Result;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A single attempt; for tests and latency-sensitive probes.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn is_retryable(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::REQUEST_TIMEOUT
                | StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
        )
    }

    /// Backoff before attempt `attempt + 1`, without jitter.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let secs = (self.initial_delay.as_secs_f64() * exp).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Send the request built by `build` until it succeeds, fails with a
/// non-retryable status, or attempts run out.
pub async fn send_with_retry<F>(policy: &RetryPolicy, service: &str, build: F) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error = String::from("no attempt made");

    for attempt in 1..=policy.max_attempts.max(1) {
        match build().send().await {
            Ok(response) if response.status().is_success() => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}", service, attempt);
                }
                return Ok(response);
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if !RetryPolicy::is_retryable(status) {
                    anyhow::bail!("{} API Error ({}): {}", service, status, body);
                }
                tracing::warn!(
                    "{} returned {} on attempt {}/{}",
                    service,
                    status,
                    attempt,
                    policy.max_attempts
                );
                last_error = format!("{} ({}): {}", service, status, body);
            }
            Err(e) => {
                tracing::warn!(
                    "{} network error on attempt {}/{}: {}",
                    service,
                    attempt,
                    policy.max_attempts,
                    e
                );
                last_error = format!("{}: {}", service, e);
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.delay_after(attempt) + jitter()).await;
        }
    }

    anyhow::bail!(
        "All {} attempts exhausted. Last error: {}",
        policy.max_attempts,
        last_error
    )
}

/// 0-250ms from the clock's sub-second part.
fn jitter() -> Duration {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    Duration::from_millis(u64::from(nanos % 250))
}
