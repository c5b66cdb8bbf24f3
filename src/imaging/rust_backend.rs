//! Pure Rust backend on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (PNG, JPEG) | `image::ImageReader` with format guessed from content |

use super::backend::{BackendError, Dimensions, ImageBackend};
use image::{ImageReader, RgbaImage};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<RgbaImage, BackendError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_error(path, e))?;
        Ok(img.to_rgba8())
    }
}
