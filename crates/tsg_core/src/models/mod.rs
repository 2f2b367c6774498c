//! Data models shared with the GUI/state layer.

use serde::{Deserialize, Serialize};

/// Aggregate stream figures from a completed info pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Global stream bitrate in bytes per second.
    pub bitrate_bps: f64,
    /// Stream duration in seconds.
    pub duration_secs: f64,
}
