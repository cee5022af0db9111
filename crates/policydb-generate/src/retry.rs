use std::thread;
use std::time::Duration;
use tracing::warn;

use policydb_core::Result;

/// Fixed-backoff retry for transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    pub fn none() -> Self {
        Self { max_retries: 0, backoff: Duration::ZERO }
    }

    /// Call `attempt` until it succeeds, fails permanently, or retries run out.
    pub fn run<T>(&self, provider: &str, mut attempt: impl FnMut() -> Result<T>) -> Result<T> {
        let mut retries = 0;
        loop {
            match attempt() {
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    warn!(provider, attempt = retries, error = %e, "transient failure; retrying");
                    if !self.backoff.is_zero() {
                        thread::sleep(self.backoff);
                    }
                }
                other => return other,
            }
        }
    }
}
