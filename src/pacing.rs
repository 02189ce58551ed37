//! Pacing
//!
//! Every deliberate pause in the batch goes through a [`Pacer`], tagged with
//! the layer that asked for it. Production code sleeps on the tokio timer;
//! tests swap in [`RecordingPacer`] to observe pauses without waiting.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Which layer requested a pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauseKind {
    /// Before every HTTP attempt, regardless of outcome
    InterCall,
    /// Between attempts inside the completion client
    ClientBackoff,
    /// Between attempts of a pipeline's outer loop
    PipelineRetry,
    /// Periodic pause every few generation records
    BatchSpacing,
}

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, kind: PauseKind, duration: Duration);
}

/// Sleeps for the requested duration
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, kind: PauseKind, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        debug!("Pausing {:?} ({:?})", duration, kind);
        tokio::time::sleep(duration).await;
    }
}

/// Records pauses instead of sleeping
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<(PauseKind, Duration)>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<(PauseKind, Duration)> {
        self.pauses.lock().unwrap().clone()
    }

    pub fn count(&self, kind: PauseKind) -> usize {
        self.pauses
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Sum of all recorded pauses
    pub fn total(&self) -> Duration {
        self.pauses.lock().unwrap().iter().map(|(_, d)| *d).sum()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, kind: PauseKind, duration: Duration) {
        self.pauses.lock().unwrap().push((kind, duration));
    }
}
