//! One-shot info worker exposing aggregate stream figures.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::engine::{EngineFactory, TimestampEngine, MAX_PID};
use crate::models::StreamInfo;

use super::pool::WorkItem;
use super::signals::WorkerSignals;

/// Worker that runs the engine fully once and exposes aggregate
/// bitrate/duration afterwards.
///
/// The aggregate getters return `0.0` while a run is in progress; callers
/// serialize access by waiting for the finished signal. A result of `0.0`
/// after completion is indistinguishable from a legitimately zero value;
/// callers that care must track run completion themselves.
pub struct InfoWorker {
    engine: Mutex<Box<dyn TimestampEngine>>,
    running: AtomicBool,
    signals: WorkerSignals,
}

impl std::fmt::Debug for InfoWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfoWorker").finish_non_exhaustive()
    }
}

impl InfoWorker {
    /// Create a worker around an already-constructed engine.
    pub fn new(engine: Box<dyn TimestampEngine>) -> Self {
        Self {
            engine: Mutex::new(engine),
            running: AtomicBool::new(false),
            signals: WorkerSignals::new(),
        }
    }

    /// Open an info engine for `path` via the factory.
    pub fn open(path: &Path, pcr_pid: u16, factory: &dyn EngineFactory) -> io::Result<Self> {
        if pcr_pid > MAX_PID {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("PCR PID {:#06x} out of range", pcr_pid),
            ));
        }
        Ok(Self::new(factory.open_info(path, pcr_pid)?))
    }

    /// Install signals (builder style).
    pub fn with_signals(mut self, signals: WorkerSignals) -> Self {
        self.signals = signals;
        self
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Global stream bitrate in bytes per second.
    ///
    /// Returns `0.0` while running.
    pub fn global_bitrate(&self) -> f64 {
        if self.is_running() {
            return 0.0;
        }
        self.engine.lock().global_bitrate()
    }

    /// Stream duration in seconds.
    ///
    /// Returns `0.0` while running.
    pub fn global_duration(&self) -> f64 {
        if self.is_running() {
            return 0.0;
        }
        self.engine.lock().global_duration()
    }

    /// Aggregate figures as a serializable model.
    pub fn stream_info(&self) -> StreamInfo {
        StreamInfo {
            bitrate_bps: self.global_bitrate(),
            duration_secs: self.global_duration(),
        }
    }
}

impl WorkItem for InfoWorker {
    fn run(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.engine.lock().run_to_end();
        self.running.store(false, Ordering::SeqCst);

        self.signals.emit_finished();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::ScriptedEngine;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn aggregates_available_after_run() {
        let engine = ScriptedEngine::new(vec![]).with_aggregates(512_000.0, 60.0);
        let finished = Arc::new(AtomicUsize::new(0));
        let finished_clone = finished.clone();

        let worker = InfoWorker::new(Box::new(engine)).with_signals(
            WorkerSignals::new().on_finished(Box::new(move || {
                finished_clone.fetch_add(1, Ordering::SeqCst);
            })),
        );

        worker.run();

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(worker.global_bitrate(), 512_000.0);
        assert_eq!(worker.global_duration(), 60.0);

        let info = worker.stream_info();
        assert_eq!(info.bitrate_bps, 512_000.0);
        assert_eq!(info.duration_secs, 60.0);
    }

    #[test]
    fn open_rejects_out_of_range_pcr_pid() {
        struct NeverFactory;
        impl crate::engine::EngineFactory for NeverFactory {
            fn open(
                &self,
                _path: &std::path::Path,
                _metric: crate::workers::Metric,
                _pids: crate::engine::PidSelection,
            ) -> io::Result<Box<dyn TimestampEngine>> {
                panic!("factory must not be reached");
            }

            fn open_info(
                &self,
                _path: &std::path::Path,
                _pcr: u16,
            ) -> io::Result<Box<dyn TimestampEngine>> {
                panic!("factory must not be reached");
            }
        }

        let err = InfoWorker::open(Path::new("stream.ts"), MAX_PID + 1, &NeverFactory).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn aggregates_zero_while_running() {
        let engine = ScriptedEngine::new(vec![])
            .with_aggregates(512_000.0, 60.0)
            .with_window_delay(Duration::from_millis(100));
        let worker = Arc::new(InfoWorker::new(Box::new(engine)));

        let runner = worker.clone();
        let handle = std::thread::spawn(move || runner.run());

        // Give the run a chance to start
        std::thread::sleep(Duration::from_millis(20));
        if worker.is_running() {
            assert_eq!(worker.global_bitrate(), 0.0);
            assert_eq!(worker.global_duration(), 0.0);
        }

        handle.join().unwrap();
        assert!(!worker.is_running());
        assert_eq!(worker.global_bitrate(), 512_000.0);
    }
}
