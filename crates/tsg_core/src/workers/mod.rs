//! Background workers for transport-stream analysis.
//!
//! A worker owns a timestamp engine and runs it on a pool thread, reporting
//! progress and completion through caller-installed callbacks. Series
//! workers accumulate a chart series; the info worker exposes whole-stream
//! aggregates once its run completes. Cancellation is cooperative and
//! synchronous: `abort()` returns only after the run loop has stopped.

mod info;
mod metrics;
mod pool;
mod series;
mod signals;

pub use info::InfoWorker;
pub use metrics::Metric;
pub use pool::{WorkItem, WorkerPool};
pub use series::{progress_percent, SeriesWorker, WorkerOptions, WorkerParams, XAxisMode};
pub use signals::{FinishedCallback, ProgressCallback, WorkerSignals};
