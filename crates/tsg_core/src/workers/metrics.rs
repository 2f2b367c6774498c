//! The closed enumeration of chart metrics.
//!
//! Every chart worker variant is fully described by two facts: which PID
//! roles it forwards to the engine constructor and the display name of its
//! series. This table drives the single generic constructor
//! [`SeriesWorker::for_metric`](super::SeriesWorker::for_metric); no variant
//! has behavior of its own.

use serde::{Deserialize, Serialize};

use crate::engine::{PidSelection, StreamPids};

/// A chart metric computed by the timestamp engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Raw PCR values.
    Pcr,
    /// Delta between consecutive PCR values.
    PcrDelta,
    /// PCR jitter.
    PcrJitter,
    /// Stream bitrate derived from PCR.
    Bitrate,
    /// Raw PTS values.
    Pts,
    /// Delta between consecutive PTS values.
    PtsDelta,
    /// Raw DTS values.
    Dts,
    /// Delta between consecutive DTS values.
    DtsDelta,
    /// PTS(n) - PCR(n).
    DiffPcrPts,
    /// DTS(n) - PCR(n).
    DiffPcrDts,
    /// PTS(n) - DTS(n).
    DiffPtsDts,
    /// Elementary-stream buffer level using PTS.
    BufferLevelPts,
    /// PES buffer level using PTS/DTS.
    BufferLevelPtsDts,
}

impl Metric {
    /// All metrics, in menu order.
    pub const ALL: [Metric; 13] = [
        Metric::Pcr,
        Metric::PcrDelta,
        Metric::PcrJitter,
        Metric::Bitrate,
        Metric::Pts,
        Metric::PtsDelta,
        Metric::Dts,
        Metric::DtsDelta,
        Metric::DiffPcrPts,
        Metric::DiffPcrDts,
        Metric::DiffPtsDts,
        Metric::BufferLevelPts,
        Metric::BufferLevelPtsDts,
    ];

    /// Display name of the chart series for this metric.
    pub fn series_name(self) -> &'static str {
        match self {
            Metric::Pcr => "Pcr",
            Metric::PcrDelta => "Pcr(n+1)-Pcr(n)",
            Metric::PcrJitter => "Jitter Pcr",
            Metric::Bitrate => "bitrate in B/s",
            Metric::Pts => "Pts",
            Metric::PtsDelta => "Pts(n+1)-Pts(n)",
            Metric::Dts => "Dts",
            Metric::DtsDelta => "Dts(n+1)-Dts(n)",
            Metric::DiffPcrPts => "Pts(n)-Pcr(n)",
            Metric::DiffPcrDts => "Dts(n)-Pcr(n)",
            Metric::DiffPtsDts => "Pts(n)-Dts(n)",
            Metric::BufferLevelPts => "ES buffer level using PTS",
            Metric::BufferLevelPtsDts => "PES buffer level using PTS/DTS",
        }
    }

    /// PID roles this metric forwards to the engine constructor.
    ///
    /// The PCR PID always fills the first role; PTS/DTS roles are filled
    /// only where the metric needs them.
    pub fn pid_selection(self, pids: StreamPids) -> PidSelection {
        match self {
            Metric::Pcr | Metric::PcrDelta | Metric::PcrJitter | Metric::Bitrate => {
                PidSelection::pcr_only(pids.pcr)
            }
            Metric::Pts | Metric::PtsDelta | Metric::DiffPcrPts | Metric::BufferLevelPts => {
                PidSelection {
                    pcr: pids.pcr,
                    pts: Some(pids.pts),
                    dts: None,
                }
            }
            Metric::Dts | Metric::DtsDelta | Metric::DiffPcrDts => PidSelection {
                pcr: pids.pcr,
                pts: None,
                dts: Some(pids.dts),
            },
            Metric::DiffPtsDts | Metric::BufferLevelPtsDts => PidSelection {
                pcr: pids.pcr,
                pts: Some(pids.pts),
                dts: Some(pids.dts),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIDS: StreamPids = StreamPids {
        pcr: 0x100,
        pts: 0x101,
        dts: 0x102,
    };

    #[test]
    fn table_covers_all_metrics_once() {
        assert_eq!(Metric::ALL.len(), 13);
        let mut names: Vec<&str> = Metric::ALL.iter().map(|m| m.series_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 13, "series names must be unique");
    }

    #[test]
    fn pcr_metrics_use_only_the_pcr_pid() {
        for metric in [Metric::Pcr, Metric::PcrDelta, Metric::PcrJitter, Metric::Bitrate] {
            let sel = metric.pid_selection(PIDS);
            assert_eq!(sel.pcr, 0x100);
            assert!(sel.pts.is_none());
            assert!(sel.dts.is_none());
        }
    }

    #[test]
    fn dts_metrics_leave_the_pts_role_empty() {
        for metric in [Metric::Dts, Metric::DtsDelta, Metric::DiffPcrDts] {
            let sel = metric.pid_selection(PIDS);
            assert_eq!(sel.pcr, 0x100);
            assert!(sel.pts.is_none());
            assert_eq!(sel.dts, Some(0x102));
        }
    }

    #[test]
    fn three_pid_metrics_fill_every_role() {
        for metric in [Metric::DiffPtsDts, Metric::BufferLevelPtsDts] {
            let sel = metric.pid_selection(PIDS);
            assert_eq!(sel.pcr, 0x100);
            assert_eq!(sel.pts, Some(0x101));
            assert_eq!(sel.dts, Some(0x102));
        }
    }

    #[test]
    fn metric_serde_round_trip() {
        let json = serde_json::to_string(&Metric::BufferLevelPtsDts).unwrap();
        assert_eq!(json, "\"buffer-level-pts-dts\"");
        let back: Metric = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Metric::BufferLevelPtsDts);
    }
}
