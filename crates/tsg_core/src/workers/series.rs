//! Chart-series worker: windowed engine runs with cooperative cancellation.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::chart::{Chart, Series, SharedSeries};
use crate::config::AnalysisSettings;
use crate::engine::{EngineFactory, PidSelection, StreamPids, TimestampEngine, TS_PACKET_SIZE};
use crate::logging::RunLogger;

use super::metrics::Metric;
use super::pool::WorkItem;
use super::signals::WorkerSignals;

/// What the X coordinate of a chart point represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XAxisMode {
    /// Presentation time in seconds, looked up per packet index. Samples
    /// with no time mapping are dropped.
    #[default]
    Time,
    /// Raw packet index.
    PacketIndex,
}

/// Per-worker run options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Packets processed per engine window.
    pub window_packets: u64,
    /// X-axis interpretation.
    pub axis_mode: XAxisMode,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            window_packets: 5000,
            axis_mode: XAxisMode::Time,
        }
    }
}

impl WorkerOptions {
    /// Derive options from the analysis settings section.
    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self {
            window_packets: settings.window_packets,
            axis_mode: if settings.time_x_axis {
                XAxisMode::Time
            } else {
                XAxisMode::PacketIndex
            },
        }
    }
}

/// Engine construction parameters, recorded for run logging.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WorkerParams {
    pub metric: Metric,
    pub pids: PidSelection,
}

/// Percent of the stream processed.
///
/// The documented contract: `processed_packets * 188 * 100 / file_size`.
/// Callers guard the zero-file-size case before calling.
pub fn progress_percent(processed_packets: u64, file_size_bytes: u64) -> u32 {
    let bytes = processed_packets as f64 * TS_PACKET_SIZE as f64;
    (bytes * 100.0 / file_size_bytes as f64) as u32
}

/// Background worker that drives the engine in bounded windows and
/// accumulates a named chart series.
///
/// State machine: `idle -> running -> idle (completed)` or
/// `running -> aborting -> idle (aborted)`. Both exits emit the same final
/// progress-100/finished pair; callers distinguish them only by having
/// called [`abort`](Self::abort).
///
/// The series is written only by the worker thread during a run.
/// [`show_series`](Self::show_series) must be called from the chart's owning
/// context after completion has been observed.
pub struct SeriesWorker {
    engine: Mutex<Box<dyn TimestampEngine>>,
    series: SharedSeries,
    chart: Arc<dyn Chart>,
    running: Mutex<bool>,
    stopped: Condvar,
    abort_requested: AtomicBool,
    /// Monotonic count of packets processed, advanced once per window.
    processed_packets: AtomicU64,
    file_size: u64,
    window_packets: u64,
    axis_mode: XAxisMode,
    signals: WorkerSignals,
    logger: Option<Arc<RunLogger>>,
    params: Option<WorkerParams>,
}

impl std::fmt::Debug for SeriesWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesWorker").finish_non_exhaustive()
    }
}

impl SeriesWorker {
    /// Create a worker around an already-constructed engine.
    ///
    /// Probes the total file size once (used for percent progress) and
    /// prepares an empty series with the given display name.
    pub fn new(
        ts_file: &Path,
        series_name: impl Into<String>,
        engine: Box<dyn TimestampEngine>,
        chart: Arc<dyn Chart>,
        options: WorkerOptions,
    ) -> io::Result<Self> {
        let file_size = fs::metadata(ts_file)?.len();

        Ok(Self {
            engine: Mutex::new(engine),
            series: Series::new_shared(series_name),
            chart,
            running: Mutex::new(false),
            stopped: Condvar::new(),
            abort_requested: AtomicBool::new(false),
            processed_packets: AtomicU64::new(0),
            file_size,
            window_packets: options.window_packets,
            axis_mode: options.axis_mode,
            signals: WorkerSignals::new(),
            logger: None,
            params: None,
        })
    }

    /// Generic constructor for any metric variant.
    ///
    /// The metric table supplies the series name and the PID roles the
    /// engine is constructed with; the worker machinery is identical across
    /// all variants.
    pub fn for_metric(
        ts_file: &Path,
        metric: Metric,
        pids: StreamPids,
        factory: &dyn EngineFactory,
        chart: Arc<dyn Chart>,
        options: WorkerOptions,
    ) -> io::Result<Self> {
        let selection = metric.pid_selection(pids);
        if !selection.is_valid() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("PID out of range for {}", metric.series_name()),
            ));
        }
        let engine = factory.open(ts_file, metric, selection)?;
        let mut worker = Self::new(ts_file, metric.series_name(), engine, chart, options)?;
        worker.params = Some(WorkerParams {
            metric,
            pids: selection,
        });
        Ok(worker)
    }

    /// Install signals (builder style).
    pub fn with_signals(mut self, signals: WorkerSignals) -> Self {
        self.signals = signals;
        self
    }

    /// Install a per-run logger (builder style).
    pub fn with_logger(mut self, logger: Arc<RunLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Shared handle to the worker's series.
    pub fn series(&self) -> &SharedSeries {
        &self.series
    }

    /// Total file size probed at construction, in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }

    /// Request cancellation and wait until the run loop has stopped.
    ///
    /// The abort flag is observed at window and per-sample granularity, so
    /// the loop stops within one window's processing time. When this method
    /// returns, the running flag is clear and the worker may be dropped.
    ///
    /// The flag is sticky: re-invoking `run()` afterwards terminates at the
    /// first window boundary.
    pub fn abort(&self) {
        self.abort_requested.store(true, Ordering::SeqCst);

        let mut running = self.running.lock();
        while *running {
            self.stopped.wait(&mut running);
        }
    }

    /// Attach the series to the chart and recompute default axes.
    ///
    /// Must only be called after the finished signal has been observed:
    /// a series mutated while displayed confuses the chart.
    pub fn show_series(&self) {
        self.chart.add_series(&self.series);
        self.chart.create_default_axes();
    }

    /// Detach the series from the chart without destroying its points.
    pub fn hide_series(&self) {
        self.chart.remove_series(&self.series);
    }

    /// Write the series in the persisted text format.
    ///
    /// The series name on the first line, then one `"<x>, <y>"` line per
    /// point in insertion order (zero and nine decimal digits).
    pub fn serialize_series<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.series.lock().write_to(out)
    }

    fn abort_is_requested(&self) -> bool {
        self.abort_requested.load(Ordering::SeqCst)
    }

    /// Advance the packet counter by one window and report progress.
    ///
    /// Emitted once per drained window, not once per sample, to bound event
    /// volume. Suppressed entirely for a zero-size file.
    fn update_progress(&self) {
        let processed = self
            .processed_packets
            .fetch_add(self.window_packets, Ordering::SeqCst)
            + self.window_packets;

        if self.file_size == 0 {
            return;
        }

        let percent = progress_percent(processed, self.file_size);
        self.signals.emit_progress(percent);
        if let Some(ref logger) = self.logger {
            logger.progress(percent);
        }
    }

    fn append_sample(&self, engine: &dyn TimestampEngine, index: u64, value: f64) {
        match self.axis_mode {
            XAxisMode::Time => match engine.time_at_index(index) {
                Some(time) => {
                    self.series.lock().push(time, value);
                    tracing::trace!(index, time, value, "sample");
                }
                None => {
                    // No presentation-time mapping: drop the sample.
                    tracing::trace!(index, value, "sample dropped, no time mapping");
                }
            },
            XAxisMode::PacketIndex => {
                self.series.lock().push(index as f64, value);
                tracing::trace!(index, value, "sample");
            }
        }
    }
}

impl WorkItem for SeriesWorker {
    /// Run the engine to exhaustion or cancellation.
    ///
    /// Whichever way the loop exits, the running flag is cleared (waking any
    /// `abort()` waiter), progress is forced to 100, and finished is
    /// signaled exactly once.
    fn run(&self) {
        *self.running.lock() = true;

        if let Some(ref logger) = self.logger {
            logger.phase(self.series.lock().name());
            if let Some(ref params) = self.params {
                logger.log_params_json(params);
            }
        }

        {
            let mut engine = self.engine.lock();
            while engine.run_window(self.window_packets) {
                if self.abort_is_requested() {
                    break;
                }

                while let Some(sample) = engine.pop_sample() {
                    if self.abort_is_requested() {
                        break;
                    }
                    self.append_sample(engine.as_ref(), sample.index, sample.value);
                }

                self.update_progress();
            }
        }

        {
            let mut running = self.running.lock();
            *running = false;
            self.stopped.notify_all();
        }

        self.signals.emit_progress(100);
        if let Some(ref logger) = self.logger {
            logger.progress(100);
            logger.success(&format!(
                "run finished with {} points",
                self.series.lock().len()
            ));
        }
        self.signals.emit_finished();
    }
}

impl Drop for SeriesWorker {
    fn drop(&mut self) {
        // Detach from the chart; the series and engine are released by
        // ownership.
        self.chart.remove_series(&self.series);
    }
}
