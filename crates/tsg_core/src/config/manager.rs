//! Settings file persistence.
//!
//! The on-disk format is one TOML table per settings section. Writes go
//! through a temp file and rename, so a crash never leaves a half-written
//! config. Section updates edit the existing document with `toml_edit`,
//! preserving user comments and formatting outside the updated table. A
//! file containing only known tables is never rewritten on load.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to parse config for editing: {0}")]
    Edit(#[from] toml_edit::TomlError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Loads, saves, and updates the settings file.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Manager for the given settings file.
    ///
    /// Starts with defaults in memory; nothing is read until
    /// [`load`](Self::load) or [`load_or_create`](Self::load_or_create).
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Changes stay in memory until `save()` or `update_section()`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load the settings file. Fails if it does not exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;
        Ok(())
    }

    /// Load the settings file, creating it with defaults when missing.
    ///
    /// Top-level tables that do not belong to any known section are dropped
    /// and the cleaned file written back. A file with only known tables is
    /// left untouched on disk, however it is formatted.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            self.settings = Settings::default();
            return self.save();
        }

        let content = fs::read_to_string(&self.config_path)?;
        let mut doc: DocumentMut = content.parse()?;
        let dropped = drop_unknown_tables(&mut doc);

        self.settings = toml::from_str(&doc.to_string())?;
        if dropped {
            self.atomic_write(&doc.to_string())?;
        }
        Ok(())
    }

    /// Create the output and log directories named in the settings.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        fs::create_dir_all(&self.settings.paths.output_folder)?;
        fs::create_dir_all(&self.settings.paths.logs_folder)?;
        Ok(())
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    /// Write the full settings to disk atomically, one commented table per
    /// section.
    pub fn save(&self) -> ConfigResult<()> {
        let mut content = String::from("# TS Graph configuration\n");
        for section in ConfigSection::ALL {
            content.push('\n');
            content.push_str("# ");
            content.push_str(section.comment());
            content.push('\n');
            content.push('[');
            content.push_str(section.table_name());
            content.push_str("]\n");
            content.push_str(&self.render_section(section)?);
        }

        self.atomic_write(&content)?;
        Ok(())
    }

    /// Rewrite one section of the on-disk file, leaving everything else
    /// (other tables, comments, formatting) as the user had it.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc: DocumentMut = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?.parse()?
        } else {
            DocumentMut::new()
        };

        let section_doc: DocumentMut = self.render_section(section)?.parse()?;
        doc[section.table_name()] = Item::Table(section_doc.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    fn render_section(&self, section: ConfigSection) -> ConfigResult<String> {
        let toml = match section {
            ConfigSection::Paths => toml::to_string_pretty(&self.settings.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
            ConfigSection::Analysis => toml::to_string_pretty(&self.settings.analysis)?,
        };
        Ok(toml)
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Sibling temp file so the rename stays on one filesystem
        let temp_path = self.config_path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.config_path)
    }
}

fn drop_unknown_tables(doc: &mut DocumentMut) -> bool {
    let unknown: Vec<String> = doc
        .iter()
        .map(|(key, _)| key.to_string())
        .filter(|key| ConfigSection::from_table_name(key).is_none())
        .collect();

    for key in &unknown {
        doc.remove(key);
    }
    !unknown.is_empty()
}
