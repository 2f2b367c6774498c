//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// Path configuration for output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for exported series files.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Last transport-stream file opened.
    #[serde(default)]
    pub last_stream_path: String,
}

fn default_output_folder() -> String {
    "graph_output".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
            last_stream_path: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Show timestamps in log output.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            progress_step: default_progress_step(),
            show_timestamps: true,
        }
    }
}

/// Analysis settings shared by all chart workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Packets processed per engine window.
    #[serde(default = "default_window_packets")]
    pub window_packets: u64,

    /// Use presentation time (rather than packet index) on the X axis.
    #[serde(default = "default_true")]
    pub time_x_axis: bool,
}

fn default_window_packets() -> u64 {
    5000
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            window_packets: default_window_packets(),
            time_x_axis: true,
        }
    }
}

/// Identifies a settings section for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Analysis,
}

impl ConfigSection {
    /// All sections, in on-disk order.
    pub const ALL: [ConfigSection; 3] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Analysis,
    ];

    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Analysis => "analysis",
        }
    }

    /// Section for a TOML table name, if it is one of ours.
    pub fn from_table_name(name: &str) -> Option<ConfigSection> {
        Self::ALL.into_iter().find(|s| s.table_name() == name)
    }

    /// Comment line written above the section when generating a fresh file.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and log directories",
            ConfigSection::Logging => "Run log behavior",
            ConfigSection::Analysis => "Timestamp analysis settings",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let settings = Settings::default();
        assert_eq!(settings.analysis.window_packets, 5000);
        assert!(settings.analysis.time_x_axis);
        assert_eq!(settings.logging.progress_step, 20);
        assert_eq!(settings.paths.output_folder, "graph_output");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let settings: Settings =
            toml::from_str("[analysis]\nwindow_packets = 1000\n").unwrap();
        assert_eq!(settings.analysis.window_packets, 1000);
        assert!(settings.analysis.time_x_axis);
        assert!(settings.logging.compact);
    }

    #[test]
    fn table_names_round_trip() {
        for section in ConfigSection::ALL {
            assert_eq!(ConfigSection::from_table_name(section.table_name()), Some(section));
        }
        assert_eq!(ConfigSection::from_table_name("charts"), None);
    }
}
