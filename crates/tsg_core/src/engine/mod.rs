//! Timestamp-extraction engine contract.
//!
//! The engine is the external collaborator that parses MPEG-TS packets and
//! computes the per-metric values (PCR/PTS/DTS curves, deltas, jitter,
//! bitrate, buffer levels). Its internals are out of scope for this crate;
//! workers drive it through the [`TimestampEngine`] trait and obtain
//! instances through an [`EngineFactory`].
//!
//! All metric arithmetic lives behind this seam. The worker layer is purely
//! mechanical: it windows the run, drains samples, and accumulates a series.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::workers::Metric;

/// Size of one MPEG transport-stream packet in bytes.
pub const TS_PACKET_SIZE: u64 = 188;

/// Highest valid PID value (13-bit field, 0x1FFF is the null packet PID).
pub const MAX_PID: u16 = 0x1FFF;

/// One (packet-index, value) sample emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Index of the TS packet the value was extracted from.
    pub index: u64,
    /// Metric value at that packet.
    pub value: f64,
}

/// PID roles forwarded to the engine constructor.
///
/// The PCR PID is always present; the PTS and DTS slots are filled only by
/// metrics that need them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidSelection {
    /// PID carrying the Program Clock Reference.
    pub pcr: u16,
    /// PID whose Presentation Time Stamps are analyzed (if any).
    pub pts: Option<u16>,
    /// PID whose Decode Time Stamps are analyzed (if any).
    pub dts: Option<u16>,
}

impl PidSelection {
    /// Selection using only the PCR PID.
    pub fn pcr_only(pcr: u16) -> Self {
        Self {
            pcr,
            pts: None,
            dts: None,
        }
    }

    /// All contained PIDs are within the 13-bit PID space.
    pub fn is_valid(&self) -> bool {
        self.pcr <= MAX_PID
            && self.pts.map_or(true, |pid| pid <= MAX_PID)
            && self.dts.map_or(true, |pid| pid <= MAX_PID)
    }
}

/// The full PID triple known to the caller (from stream selection).
///
/// Each [`Metric`] picks the roles it needs out of this via
/// [`Metric::pid_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPids {
    pub pcr: u16,
    pub pts: u16,
    pub dts: u16,
}

/// Driving interface of the timestamp-extraction engine.
///
/// Runtime failures are signaled by value, not by `Result`: a window that
/// yields nothing returns `false`, a missing index-to-time mapping returns
/// `None`, and aggregates default to `0.0`. Only construction (see
/// [`EngineFactory`]) reports I/O errors.
pub trait TimestampEngine: Send {
    /// Full one-shot pass over the stream, computing the aggregate figures
    /// returned by [`global_bitrate`](Self::global_bitrate) and
    /// [`global_duration`](Self::global_duration).
    fn run_to_end(&mut self);

    /// Process up to `window_packets` more packets.
    ///
    /// Returns `true` while more data remains. After a call, buffered
    /// samples can be drained with [`pop_sample`](Self::pop_sample).
    fn run_window(&mut self, window_packets: u64) -> bool;

    /// Drain the next sample buffered by the last window, if any.
    fn pop_sample(&mut self) -> Option<Sample>;

    /// Map a packet index to a presentation time in seconds.
    ///
    /// `None` means the engine has no mapping for that index; callers drop
    /// the sample.
    fn time_at_index(&self, index: u64) -> Option<f64>;

    /// Aggregate stream bitrate in bytes per second.
    ///
    /// Valid after [`run_to_end`](Self::run_to_end); `0.0` otherwise.
    fn global_bitrate(&self) -> f64;

    /// Stream duration in seconds.
    ///
    /// Valid after [`run_to_end`](Self::run_to_end); `0.0` otherwise.
    fn global_duration(&self) -> f64;
}

/// Factory seam for constructing engines.
///
/// The GUI shell installs the real implementation; tests install scripted
/// engines.
pub trait EngineFactory {
    /// Open an engine computing `metric` over the given stream and PIDs.
    fn open(
        &self,
        path: &Path,
        metric: Metric,
        pids: PidSelection,
    ) -> io::Result<Box<dyn TimestampEngine>>;

    /// Open an engine for a one-shot aggregate pass (bitrate/duration).
    fn open_info(&self, path: &Path, pcr_pid: u16) -> io::Result<Box<dyn TimestampEngine>>;
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Scripted engine used by worker tests.

    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;

    use super::{Sample, TimestampEngine};

    /// Engine replaying a fixed script of sample windows.
    pub(crate) struct ScriptedEngine {
        windows: Vec<Vec<Sample>>,
        cursor: usize,
        buffered: VecDeque<Sample>,
        /// Index -> presentation seconds. Indices absent from the map have
        /// no time mapping.
        time_map: HashMap<u64, f64>,
        bitrate: f64,
        duration: f64,
        /// Per-window sleep, to give concurrent abort() a chance to land.
        window_delay: Option<Duration>,
        /// When set, `run_window` never reports exhaustion.
        endless: bool,
        ran_to_end: bool,
    }

    impl ScriptedEngine {
        pub(crate) fn new(windows: Vec<Vec<Sample>>) -> Self {
            Self {
                windows,
                cursor: 0,
                buffered: VecDeque::new(),
                time_map: HashMap::new(),
                bitrate: 0.0,
                duration: 0.0,
                window_delay: None,
                endless: false,
                ran_to_end: false,
            }
        }

        pub(crate) fn with_time_map(mut self, map: &[(u64, f64)]) -> Self {
            self.time_map = map.iter().copied().collect();
            self
        }

        pub(crate) fn with_aggregates(mut self, bitrate: f64, duration: f64) -> Self {
            self.bitrate = bitrate;
            self.duration = duration;
            self
        }

        pub(crate) fn with_window_delay(mut self, delay: Duration) -> Self {
            self.window_delay = Some(delay);
            self
        }

        pub(crate) fn endless(mut self) -> Self {
            self.endless = true;
            self
        }

        fn next_window(&mut self) -> Option<Vec<Sample>> {
            if self.endless {
                let base = self.cursor as u64 * 10;
                self.cursor += 1;
                return Some(vec![Sample {
                    index: base,
                    value: base as f64,
                }]);
            }
            let window = self.windows.get(self.cursor).cloned()?;
            self.cursor += 1;
            Some(window)
        }
    }

    impl TimestampEngine for ScriptedEngine {
        fn run_to_end(&mut self) {
            if let Some(delay) = self.window_delay {
                std::thread::sleep(delay);
            }
            self.ran_to_end = true;
        }

        fn run_window(&mut self, _window_packets: u64) -> bool {
            if let Some(delay) = self.window_delay {
                std::thread::sleep(delay);
            }
            match self.next_window() {
                Some(window) => {
                    self.buffered = window.into();
                    true
                }
                None => false,
            }
        }

        fn pop_sample(&mut self) -> Option<Sample> {
            self.buffered.pop_front()
        }

        fn time_at_index(&self, index: u64) -> Option<f64> {
            self.time_map.get(&index).copied()
        }

        fn global_bitrate(&self) -> f64 {
            if self.ran_to_end {
                self.bitrate
            } else {
                0.0
            }
        }

        fn global_duration(&self) -> f64 {
            if self.ran_to_end {
                self.duration
            } else {
                0.0
            }
        }
    }
}
