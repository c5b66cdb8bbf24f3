//! Shared test utilities.
//!
//! Fixture builders for source partitions, a small-canvas config rooted in a
//! temp directory, and a logger that records what it was told.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let config = test_config(tmp.path());
//! let src = source_partition(tmp.path(), "2024-03-05");
//! write_png_layer(&src.join("Key resources.png"), 16, 16, [200, 0, 0, 255]);
//! ```

use crate::config::PipelineConfig;
use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Source table with one column the public copy must drop (`text`).
pub const KEY_RESOURCES_CSV: &str = "\
rank,id,type,url,count,groups,text
1,x,url,http://a,5,G1,first
2,1234567890,tweet,https://twitter.com/i/status/1234567890,12,\"G1,G2\",second
";

// =========================================================================
// Fixture setup
// =========================================================================

/// Config with all three roots under `root` and a 16×16 canvas.
pub fn test_config(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.folders.source = root.join("source");
    config.folders.archive = root.join("archive");
    config.folders.public = root.join("public");
    config.canvas.width = 16;
    config.canvas.height = 16;
    config
}

/// Create and return `<root>/source/YYYY/MM/DD` for an ISO date.
pub fn source_partition(root: &Path, iso_date: &str) -> PathBuf {
    let dir = root.join("source").join(iso_date.replace('-', "/"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write a solid-colour RGBA PNG.
pub fn write_png_layer(path: &Path, width: u32, height: u32, pixel: [u8; 4]) {
    image::RgbaImage::from_pixel(width, height, image::Rgba(pixel))
        .save(path)
        .unwrap();
}

// =========================================================================
// Recording logger
// =========================================================================

/// Keeps every message so tests can assert on what was logged.
#[derive(Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    /// Whether a message at exactly `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.records.lock().unwrap().push((level, args.to_string()));
    }
}
