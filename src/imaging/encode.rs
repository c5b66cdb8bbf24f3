//! Raster encoding: in-memory buffers for JPEG/PNG, and a streaming PNG
//! writer that never holds the encoded file in memory.
//!
//! Writer failures surface as [`BackendError::Io`], not as encode errors, so
//! a full disk is reported as such.
//!
//! JPEG has no alpha channel. The canvas starts fully transparent, so before
//! encoding every pixel is blended onto the configured background colour.

use super::backend::BackendError;
use super::params::{Background, EncodeOptions, OutputFormat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageError, RgbImage, RgbaImage};
use std::io::Write;

/// Encode `canvas` into a byte buffer.
pub fn encode(
    canvas: &RgbaImage,
    format: OutputFormat,
    options: &EncodeOptions,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = flatten(canvas, options.background);
            JpegEncoder::new_with_quality(&mut buf, options.quality.value())
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(|e| BackendError::Encode(format!("JPEG: {e}")))?;
        }
        OutputFormat::Png => write_png(canvas, &mut buf)?,
    }
    Ok(buf)
}

/// Stream `canvas` as PNG into `writer`.
pub fn write_png<W: Write>(canvas: &RgbaImage, writer: W) -> Result<(), BackendError> {
    PngEncoder::new(writer)
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| match e {
            ImageError::IoError(io) => BackendError::Io(io),
            other => BackendError::Encode(format!("PNG: {other}")),
        })
}

/// Alpha-blend every pixel onto an opaque background.
fn flatten(canvas: &RgbaImage, background: Background) -> RgbImage {
    let bg = background.0;
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let [r, g, b, a] = canvas.get_pixel(x, y).0;
        let a = u32::from(a);
        let blend = |fg: u8, bg: u8| ((u32::from(fg) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8;
        image::Rgb([blend(r, bg[0]), blend(g, bg[1]), blend(b, bg[2])])
    })
}
