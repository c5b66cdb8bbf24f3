//! Layer compositing onto a fixed-size canvas.
//!
//! ```text
//! canvas (transparent, allocated once)
//!   ← layer 0 drawn at (0,0)
//!   ← layer 1 drawn at (0,0), alpha-blended over layer 0
//!   ← ...
//! ```
//!
//! Every layer is required. Existence is checked for all of them before the
//! first decode, so a missing legend fails the run before any pixel work and
//! nothing partial can reach the disk.

use super::backend::{BackendError, ImageBackend};
use super::encode;
use super::params::{CanvasSize, EncodeOptions, OutputFormat};
use crate::artifact::ImageArtifact;
use crate::log::Logger;
use crate::{log_debug, log_warn};
use image::RgbaImage;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Missing source layer '{layer}' at {path}")]
    SourceMissing { layer: String, path: PathBuf },
    #[error("No layers to compose")]
    NoLayers,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A named source raster, drawn in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub path: PathBuf,
}

impl Layer {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// The composed raster, ready to encode.
#[derive(Debug, Clone)]
pub struct Composite {
    canvas: RgbaImage,
}

impl Composite {
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn size(&self) -> CanvasSize {
        CanvasSize {
            width: self.canvas.width(),
            height: self.canvas.height(),
        }
    }

    /// Encode into an in-memory artifact.
    pub fn encode(
        &self,
        format: OutputFormat,
        options: &EncodeOptions,
    ) -> Result<ImageArtifact, BackendError> {
        let bytes = encode::encode(&self.canvas, format, options)?;
        Ok(ImageArtifact {
            bytes,
            width: self.canvas.width(),
            height: self.canvas.height(),
            format,
        })
    }

    /// Encode as PNG straight into `out`.
    pub fn write_png(&self, out: &mut dyn Write) -> Result<(), BackendError> {
        encode::write_png(&self.canvas, out)
    }
}

/// Fail with [`ComposeError::SourceMissing`] on the first absent layer.
pub fn check_layers(layers: &[Layer]) -> Result<(), ComposeError> {
    match layers.iter().find(|l| !l.path.is_file()) {
        Some(missing) => Err(ComposeError::SourceMissing {
            layer: missing.name.clone(),
            path: missing.path.clone(),
        }),
        None => Ok(()),
    }
}

/// Draw `layers` in order onto a fresh `size` canvas.
pub fn compose(
    backend: &dyn ImageBackend,
    size: CanvasSize,
    layers: &[Layer],
    logger: &dyn Logger,
) -> Result<Composite, ComposeError> {
    if layers.is_empty() {
        return Err(ComposeError::NoLayers);
    }
    check_layers(layers)?;

    let mut canvas = RgbaImage::new(size.width, size.height);
    for layer in layers {
        let dims = backend.identify(&layer.path)?;
        if dims.width != size.width || dims.height != size.height {
            log_warn!(
                logger,
                "Layer '{}' is {}x{}, canvas is {}; drawing at origin anyway.",
                layer.name,
                dims.width,
                dims.height,
                size
            );
        }
        let pixels = backend.decode(&layer.path)?;
        image::imageops::overlay(&mut canvas, &pixels, 0, 0);
        log_debug!(logger, "Layer '{}' drawn from {}.", layer.name, layer.path.display());
    }

    Ok(Composite { canvas })
}
