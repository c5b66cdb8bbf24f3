//! Layer decoding backend trait and shared types.
//!
//! The compositor only needs two things from the outside world: the size of
//! a layer file and its decoded RGBA pixels. [`ImageBackend`] is that seam.
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests swap in
//! [`tests::MockBackend`] to check stacking order without real files.

use image::RgbaImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

pub trait ImageBackend: Sync {
    /// Read the pixel dimensions of an image file without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode an image file into 8-bit RGBA.
    fn decode(&self, path: &Path) -> Result<RgbaImage, BackendError>;
}
