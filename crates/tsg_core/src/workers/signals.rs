//! Worker signal definitions.
//!
//! Workers report percent progress and completion through caller-supplied
//! callbacks. Emission with no callback installed is a no-op, so a worker
//! can always signal unconditionally.

/// Progress callback type. Receives the percent value.
pub type ProgressCallback = Box<dyn Fn(u32) + Send + Sync>;

/// Completion callback type. Fired exactly once per run.
pub type FinishedCallback = Box<dyn Fn() + Send + Sync>;

/// Optional progress/completion callbacks for one worker.
#[derive(Default)]
pub struct WorkerSignals {
    progress: Option<ProgressCallback>,
    finished: Option<FinishedCallback>,
}

impl WorkerSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the progress callback.
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Set the completion callback.
    pub fn on_finished(mut self, callback: FinishedCallback) -> Self {
        self.finished = Some(callback);
        self
    }

    /// Emit a progress value (no-op without a callback).
    pub fn emit_progress(&self, percent: u32) {
        if let Some(ref callback) = self.progress {
            callback(percent);
        }
    }

    /// Emit completion (no-op without a callback).
    pub fn emit_finished(&self) {
        if let Some(ref callback) = self.finished {
            callback();
        }
    }
}
