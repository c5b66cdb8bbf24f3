//! Image compositing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Decode layer** | `image::ImageReader` → RGBA8 |
//! | **Stack layers** | `image::imageops::overlay` at `(0,0)` |
//! | **Encode** | `JpegEncoder` (alpha flattened) / `PngEncoder` |
//!
//! The module is split into:
//! - **Parameters**: canvas size, quality, background, output format
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Compositor**: layer checks and stacking
//! - **Encode**: buffer and stream-to-file encoders

pub mod backend;
pub mod compositor;
mod encode;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use compositor::{ComposeError, Composite, Layer, compose};
pub use params::{Background, CanvasSize, EncodeOptions, OutputFormat, Quality};
pub use rust_backend::RustBackend;
