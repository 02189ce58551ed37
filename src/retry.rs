//! Retry Policy
//!
//! Bounded attempt loop with a pause between attempts. The completion client
//! and each pipeline own one policy apiece and the two are nested, so they are
//! kept as separate values rather than folded into one.

use crate::error::{Nl2SqlError, Result};
use crate::pacing::{Pacer, PauseKind};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Attempt ceiling and the fixed pause between attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// the attempt ceiling is reached. The last error is returned unchanged.
    ///
    /// `operation` receives the zero-based attempt number. Pauses between
    /// attempts go through `pacer` tagged with `kind`.
    pub async fn run<F, Fut, T>(
        &self,
        pacer: &dyn Pacer,
        kind: PauseKind,
        label: &str,
        is_retryable: impl Fn(&Nl2SqlError) -> bool,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !is_retryable(&err) || attempt + 1 >= max_attempts {
                        return Err(err);
                    }

                    warn!("{}", retry_notice(label, &err, attempt + 1, max_attempts, self.delay));
                    pacer.pause(kind, self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn retry_notice(
    label: &str,
    err: &Nl2SqlError,
    retry: usize,
    max_attempts: usize,
    delay: Duration,
) -> String {
    format!(
        "{}: {}. Retrying {}/{} in {:?}",
        label, err, retry, max_attempts, delay
    )
}
