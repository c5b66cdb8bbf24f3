//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Resolution order,
//! last one wins:
//!
//! 1. stock defaults ([`PipelineConfig::default`])
//! 2. the user's `config.toml`, merged key by key on top
//! 3. environment overrides for the three root folders
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [folders]
//! source = "data/source"    # Raw per-day inputs (read only)
//! archive = "data/archive"  # Canonical per-day storage
//! public = "data/public"    # Public mirror
//!
//! [canvas]
//! width = 3590
//! height = 3590
//!
//! [jpeg]
//! quality = 75              # 1-100
//! background = "#000000"    # Colour transparent pixels flatten onto
//!
//! [public]
//! mirror_current = false    # Also write artifacts into <public>/current
//!
//! [logging]
//! level = "info"            # trace, debug, info, warn, error
//! # file = "logs/dailycarto.log"
//! ```
//!
//! ## Environment
//!
//! | Variable | Overrides |
//! |---|---|
//! | `DATA_SOURCE_FOLDER` | `folders.source` |
//! | `DATA_ARCHIVE_FOLDER` | `folders.archive` |
//! | `DATA_PUBLIC_FOLDER` | `folders.public` |
//!
//! The binary loads a `.env` file before reading these, so a scheduler can
//! drop one next to the working directory.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Background, CanvasSize, EncodeOptions, Quality};
use crate::log::parse_level;
use crate::paths::Roots;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_SOURCE_FOLDER: &str = "DATA_SOURCE_FOLDER";
pub const ENV_ARCHIVE_FOLDER: &str = "DATA_ARCHIVE_FOLDER";
pub const ENV_PUBLIC_FOLDER: &str = "DATA_PUBLIC_FOLDER";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Root folders every date partition hangs off.
    pub folders: FoldersConfig,
    /// Output canvas size for composited images.
    pub canvas: CanvasConfig,
    /// JPEG encoding settings.
    pub jpeg: JpegConfig,
    /// Public fan-out settings.
    pub public: PublicConfig,
    /// Log level and optional log file.
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ConfigError::Validation(
                "canvas.width and canvas.height must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg.quality) {
            return Err(ConfigError::Validation("jpeg.quality must be 1-100".into()));
        }
        if parse_level(&self.logging.level).is_none() {
            return Err(ConfigError::Validation(format!(
                "logging.level '{}' is not one of trace, debug, info, warn, error",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// Override root folders from the environment. `lookup` is
    /// `std::env::var` in production and a map in tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty(ENV_SOURCE_FOLDER) {
            self.folders.source = PathBuf::from(v);
        }
        if let Some(v) = non_empty(ENV_ARCHIVE_FOLDER) {
            self.folders.archive = PathBuf::from(v);
        }
        if let Some(v) = non_empty(ENV_PUBLIC_FOLDER) {
            self.folders.public = PathBuf::from(v);
        }
    }

    pub fn roots(&self) -> Roots {
        Roots {
            source: self.folders.source.clone(),
            archive: self.folders.archive.clone(),
            public: self.folders.public.clone(),
        }
    }

    pub fn canvas_size(&self) -> CanvasSize {
        CanvasSize {
            width: self.canvas.width,
            height: self.canvas.height,
        }
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            quality: Quality::new(self.jpeg.quality),
            background: self.jpeg.background,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoldersConfig {
    pub source: PathBuf,
    pub archive: PathBuf,
    pub public: PathBuf,
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("data/source"),
            archive: PathBuf::from("data/archive"),
            public: PathBuf::from("data/public"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: CanvasSize::DEFAULT.width,
            height: CanvasSize::DEFAULT.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    /// Encoder quality, 1-100.
    pub quality: u32,
    /// `#rrggbb`; parsed on load, so a malformed colour is a TOML error.
    pub background: Background,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: u32::from(Quality::default().value()),
            background: Background::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublicConfig {
    /// Also mirror every artifact into `<public>/current`.
    pub mirror_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Append log lines to this file in addition to stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, deserialize, apply the
/// environment, then validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: PipelineConfig = merged.try_into()?;
    config.apply_env(env);
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when the file is
/// absent, with environment overrides from the process environment.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay, |key| std::env::var(key).ok())
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# dailycarto configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Root folders
# ---------------------------------------------------------------------------
# Each root holds one YYYY/MM/DD partition per day.
# Environment variables take precedence over these values:
#   DATA_SOURCE_FOLDER, DATA_ARCHIVE_FOLDER, DATA_PUBLIC_FOLDER
[folders]
# Raw per-day inputs. Never written to.
source = "data/source"
# Canonical per-day storage. A failed archive write fails the run.
archive = "data/archive"
# Public mirror. Write failures here are logged only.
public = "data/public"

# ---------------------------------------------------------------------------
# Composited image canvas
# ---------------------------------------------------------------------------
[canvas]
# Layers are drawn at (0, 0); pixels outside the canvas are clipped.
width = 3590
height = 3590

# ---------------------------------------------------------------------------
# JPEG output
# ---------------------------------------------------------------------------
[jpeg]
# Encoder quality (1-100).
quality = 75
# JPEG has no alpha: transparent pixels are flattened onto this colour.
background = "#000000"

# ---------------------------------------------------------------------------
# Public fan-out
# ---------------------------------------------------------------------------
[public]
# Also write every artifact into <public>/current.
mirror_current = false

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# One of: trace, debug, info, warn, error. RUST_LOG takes precedence.
level = "info"
# Append log lines to a file as well as stderr.
# file = "logs/dailycarto.log"
"##
}
