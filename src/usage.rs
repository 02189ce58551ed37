//! Usage Accumulator
//!
//! Running total of completion tokens reported by the endpoint. One instance
//! is owned by the batch driver and lent to every completion call.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct UsageAccumulator {
    completion_tokens: AtomicU64,
}

impl UsageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one call's reported usage and return the new cumulative total.
    pub fn record(&self, completion_tokens: u64) -> u64 {
        self.completion_tokens
            .fetch_add(completion_tokens, Ordering::Relaxed)
            + completion_tokens
    }

    pub fn total(&self) -> u64 {
        self.completion_tokens.load(Ordering::Relaxed)
    }
}
