//! Produced artifacts and the [`Emit`] seam the publisher writes through.
//!
//! An artifact is immutable once built. The publisher never looks inside
//! one; it only asks it to emit itself at a path, so images and tables (and
//! the streamed PNG variant) go through the same archive/fan-out code.
//!
//! Every emit goes through [`write_atomically`]: bytes land in a temp file
//! next to the target, which is renamed over the target only once fully
//! written. A failed write leaves the previous file (or no file) in place,
//! never a truncated one that the cache gate would take for a finished day.

use crate::imaging::{BackendError, Composite, OutputFormat};
use crate::result::ArtifactKind;
use crate::table::Table;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
}

impl EmitError {
    pub fn path(&self) -> &Path {
        match self {
            EmitError::Io { path, .. } | EmitError::Encode { path, .. } => path,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        EmitError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Run `write` against a temp file in `path`'s directory, then rename it
/// onto `path`. On any error the temp file is removed and `path` is left
/// as it was.
///
/// Targets end up mode 0644 on unix, whatever the temp file default.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<(), EmitError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), EmitError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged: NamedTempFile = tempfile::Builder::new()
        .prefix(".dailycarto-")
        .tempfile_in(dir)
        .map_err(|e| EmitError::io(path, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| EmitError::io(path, e))?;
    }
    {
        let mut out = BufWriter::new(staged.as_file_mut());
        write(&mut out)?;
        out.flush().map_err(|e| EmitError::io(path, e))?;
    }
    staged
        .persist(path)
        .map_err(|e| EmitError::io(path, e.error))?;
    Ok(())
}

/// Something that can be written to a file.
pub trait Emit: Send + Sync {
    fn kind(&self) -> ArtifactKind;

    /// Write the artifact at `path`, replacing any previous file.
    fn emit(&self, path: &Path) -> Result<(), EmitError>;
}

/// An encoded raster held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl ImageArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Image(ImageArtifact),
    Table(Table),
}

impl Emit for Artifact {
    fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Image(_) => ArtifactKind::Image,
            Artifact::Table(_) => ArtifactKind::Table,
        }
    }

    fn emit(&self, path: &Path) -> Result<(), EmitError> {
        let bytes = match self {
            Artifact::Image(image) => std::borrow::Cow::Borrowed(image.bytes.as_slice()),
            Artifact::Table(table) => {
                let text = table.to_csv().map_err(|e| EmitError::Encode {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                std::borrow::Cow::Owned(text.into_bytes())
            }
        };
        write_atomically(path, |out| {
            out.write_all(&bytes).map_err(|e| EmitError::io(path, e))
        })
    }
}

/// A composite encoded as PNG at emit time, straight into each destination's
/// staged file. Each destination re-encodes; the encoded PNG is never held
/// in memory.
#[derive(Debug, Clone)]
pub struct PngStream(pub Arc<Composite>);

impl Emit for PngStream {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Image
    }

    fn emit(&self, path: &Path) -> Result<(), EmitError> {
        write_atomically(path, |out| {
            self.0.write_png(out).map_err(|e| match e {
                BackendError::Io(source) => EmitError::io(path, source),
                other => EmitError::Encode {
                    path: path.to_path_buf(),
                    message: other.to_string(),
                },
            })
        })
    }
}
