use std::thread;
use std::time::Duration;

use tracing::warn;

use docqa_core::config::GatewaySettings;
use docqa_core::error::Result;

/// Bounded retry for gateway calls. Only upstream errors are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 1, backoff: Duration::from_millis(250) }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0, backoff: Duration::ZERO }
    }

    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self { max_retries: settings.max_retries, backoff: Duration::from_millis(settings.retry_backoff_ms) }
    }

    pub fn run<T>(&self, op: &str, mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(op, attempt, max = self.max_retries, error = %e, "gateway call failed, retrying");
                    if !self.backoff.is_zero() {
                        thread::sleep(self.backoff);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
