//! HTTP retrieval with per-attempt timeouts and exponential backoff.
//!
//! Each request runs through [`seatbelt`] retry and timeout middleware. Transport failures,
//! timeouts, and non-success responses outside the 4xx range are retried. A 4xx response is final
//! and returned immediately.

use crate::Result;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use layered::{Execute, Service, Stack};
use ohno::{AppError, IntoAppError, app_err};
use reqwest::StatusCode;
use seatbelt::retry::{Backoff, Retry};
use seatbelt::timeout::Timeout;
use seatbelt::{RecoveryInfo, ResilienceContext};
use serde_json::Value;
use std::sync::Arc;
use tick::Clock;
use url::Url;

const LOG_TARGET: &str = "      http";

/// Timeout and backoff settings for [`Fetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Limit on a single attempt, body included.
    pub timeout: Duration,

    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry. Each later retry waits twice as long as the previous one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Why a fetch produced no document.
#[derive(Debug)]
pub enum FetchError {
    /// The server refused the request with a 4xx status. Not retried.
    Terminal { url: String, status: StatusCode },

    /// Every attempt failed with a transient error.
    Exhausted { url: String, attempts: u32, last: String },

    /// The body arrived but is not valid JSON.
    Malformed { url: String, reason: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal { url, status } => write!(f, "'{url}' responded with {status}"),
            Self::Exhausted { url, attempts, last } => write!(f, "'{url}' failed after {attempts} attempts: {last}"),
            Self::Malformed { url, reason } => write!(f, "'{url}' returned invalid JSON: {reason}"),
        }
    }
}

impl core::error::Error for FetchError {}

/// Outcome of one attempt. The inner error carries the status of a non-success response.
type Attempt = Result<Result<String, StatusCode>>;

/// Whether an attempt is worth repeating.
fn is_transient(attempt: &Attempt) -> bool {
    match attempt {
        Err(_) => true,
        Ok(Ok(_)) => false,
        Ok(Err(status)) => !status.is_client_error(),
    }
}

/// Fetches JSON documents from upstream sources.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(user_agent: &str, policy: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .into_app_err("could not create HTTP client")?;

        Ok(Self { client, policy })
    }

    /// Retrieves and parses a JSON document.
    pub async fn fetch_json(&self, url: &Url) -> Result<Value, FetchError> {
        let body = self.fetch_text(url).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Retrieves a response body, retrying transient failures.
    pub async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let clock = Clock::new_tokio();
        let context = ResilienceContext::new(&clock).name("fetch");
        let attempts = Arc::new(AtomicU32::new(0));
        let timeout = self.policy.timeout;

        let client = self.client.clone();
        let counter = Arc::clone(&attempts);
        let service = (
            Retry::layer("retry", &context)
                .clone_input()
                .recovery_with(|attempt: &Attempt, _| {
                    if is_transient(attempt) {
                        RecoveryInfo::retry()
                    } else {
                        RecoveryInfo::never()
                    }
                })
                .max_retry_attempts(self.policy.max_retries)
                .base_delay(self.policy.base_delay)
                .backoff(Backoff::Exponential)
                .use_jitter(false)
                .on_retry(|attempt: &Attempt, args| {
                    let cause = match attempt {
                        Err(e) => format!("{e:#}"),
                        Ok(Err(status)) => format!("unexpected HTTP status {status}"),
                        Ok(Ok(_)) => String::new(),
                    };
                    log::debug!(
                        target: LOG_TARGET,
                        "Retrying (attempt {}, delay {}ms): {cause}",
                        args.attempt().index() + 1,
                        args.retry_delay().as_millis(),
                    );
                }),
            Timeout::layer("timeout", &context)
                .timeout_error(move |_| app_err!("request timed out after {}ms", timeout.as_millis()))
                .timeout(timeout),
            Execute::new(move |url: Url| {
                let client = client.clone();
                let counter = Arc::clone(&counter);
                async move {
                    let _ = counter.fetch_add(1, Ordering::Relaxed);
                    send(&client, url).await.map_err(AppError::new)
                }
            }),
        )
            .into_service();

        let outcome = service.execute(url.clone()).await;
        let attempts = attempts.load(Ordering::Relaxed).max(1);

        match outcome {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(status)) if status.is_client_error() => {
                log::debug!(target: LOG_TARGET, "'{url}' refused with {status}, not retrying");
                Err(FetchError::Terminal {
                    url: url.to_string(),
                    status,
                })
            }
            Ok(Err(status)) => Err(FetchError::Exhausted {
                url: url.to_string(),
                attempts,
                last: format!("unexpected HTTP status {status}"),
            }),
            Err(e) => Err(FetchError::Exhausted {
                url: url.to_string(),
                attempts,
                last: format!("{e:#}"),
            }),
        }
    }
}

/// One request, body included.
async fn send(client: &reqwest::Client, url: Url) -> Result<Result<String, StatusCode>, reqwest::Error> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Ok(Err(status));
    }

    Ok(Ok(response.text().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_client_errors_are_final() {
        assert!(is_transient(&Err(app_err!("connection reset"))));
        assert!(is_transient(&Ok(Err(StatusCode::SERVICE_UNAVAILABLE))));
        assert!(is_transient(&Ok(Err(StatusCode::MOVED_PERMANENTLY))));
        assert!(!is_transient(&Ok(Err(StatusCode::NOT_FOUND))));
        assert!(!is_transient(&Ok(Err(StatusCode::TOO_MANY_REQUESTS))));
        assert!(!is_transient(&Ok(Ok("{}".to_string()))));
    }

    #[test]
    fn test_error_display() {
        let terminal = FetchError::Terminal {
            url: "https://example.com/x.json".to_string(),
            status: StatusCode::NOT_FOUND,
        };
        assert_eq!(terminal.to_string(), "'https://example.com/x.json' responded with 404 Not Found");

        let exhausted = FetchError::Exhausted {
            url: "https://example.com/x.json".to_string(),
            attempts: 4,
            last: "unexpected HTTP status 503 Service Unavailable".to_string(),
        };
        assert!(exhausted.to_string().contains("failed after 4 attempts"));
    }
}
