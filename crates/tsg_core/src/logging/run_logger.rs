//! Per-run analysis log.
//!
//! Every analysis run writes its own log file, named after the run (series
//! names double as run names, so the filename is sanitized). An optional
//! callback mirrors each line to the GUI log pane.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::Level;

use crate::config::LoggingSettings;

/// Mirrors each emitted log line to the GUI.
pub type GuiLogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Behavior knobs for a [`RunLogger`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Most verbose level that still gets written.
    pub min_level: Level,
    /// Filter progress lines down to step buckets.
    pub compact: bool,
    /// Bucket width for compact progress filtering, in percent.
    pub progress_step: u32,
    /// Prefix each line with a wall-clock timestamp.
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            compact: true,
            progress_step: 20,
            show_timestamps: true,
        }
    }
}

impl LogConfig {
    /// Verbose configuration: debug level, every progress line.
    pub fn verbose() -> Self {
        Self {
            min_level: Level::DEBUG,
            compact: false,
            progress_step: 10,
            show_timestamps: true,
        }
    }

    /// Configuration from the persisted logging settings section.
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            min_level: Level::INFO,
            compact: settings.compact,
            progress_step: settings.progress_step,
            show_timestamps: settings.show_timestamps,
        }
    }
}

/// Log for one analysis run, written to its own file.
pub struct RunLogger {
    run_name: String,
    log_path: PathBuf,
    file: Mutex<Option<BufWriter<File>>>,
    gui: Option<GuiLogCallback>,
    config: LogConfig,
    /// Progress bucket of the last line that passed the compact filter.
    last_bucket: Mutex<Option<u32>>,
}

impl RunLogger {
    /// Open the log file for a run and write its header line.
    ///
    /// The file lands at `<log_dir>/<sanitized run name>.log`; a run name
    /// like `bitrate in B/s` is safe to use directly.
    pub fn new(
        run_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        gui: Option<GuiLogCallback>,
    ) -> io::Result<Self> {
        let run_name = run_name.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&run_name)));
        let mut writer = BufWriter::new(File::create(&log_path)?);
        writeln!(
            writer,
            "# {} started {}",
            run_name,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;

        Ok(Self {
            run_name,
            log_path,
            file: Mutex::new(Some(writer)),
            gui,
            config,
            last_bucket: Mutex::new(None),
        })
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::INFO, message);
    }

    pub fn debug(&self, message: &str) {
        self.emit(Level::DEBUG, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Level::WARN, &format!("[warn] {}", message));
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::ERROR, &format!("[error] {}", message));
    }

    /// Mark the start of a run phase.
    pub fn phase(&self, name: &str) {
        self.emit(Level::INFO, &format!(">>> {}", name));
    }

    /// Mark a successful completion.
    pub fn success(&self, message: &str) {
        self.emit(Level::INFO, &format!("[ok] {}", message));
    }

    /// Log a progress percentage.
    ///
    /// In compact mode a line is written when the value enters a new
    /// `progress_step` bucket; 100 always passes. Returns whether the line
    /// was written.
    pub fn progress(&self, percent: u32) -> bool {
        if self.config.compact {
            let bucket = percent / self.config.progress_step.max(1);
            let mut last = self.last_bucket.lock();
            if *last == Some(bucket) && percent < 100 {
                return false;
            }
            *last = Some(bucket);
        }

        self.emit(Level::INFO, &format!("progress {}%", percent));
        true
    }

    /// Record run parameters as a single JSON line.
    pub fn log_params_json<T: Serialize>(&self, params: &T) {
        match serde_json::to_string(params) {
            Ok(json) => self.info(&format!("parameters: {}", json)),
            Err(e) => self.warn(&format!("parameters not serializable: {}", e)),
        }
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and release the file handle. Further lines go only to the GUI.
    pub fn close(&self) {
        self.flush();
        *self.file.lock() = None;
    }

    fn emit(&self, level: Level, message: &str) {
        // Level ordering puts more verbose levels higher
        if level > self.config.min_level {
            return;
        }

        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S%.3f"), message)
        } else {
            message.to_string()
        };

        if let Some(ref mut writer) = *self.file.lock() {
            let _ = writeln!(writer, "{}", line);
        }
        if let Some(ref gui) = self.gui {
            gui(&line);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Turn a run name into a filename: anything outside `[A-Za-z0-9._-]`
/// becomes an underscore.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
