//! Archive write plus best-effort public fan-out.
//!
//! ```text
//! artifact ──► archive path        (hard gate: failure aborts, nothing public)
//!          └─► public path 1..n    (soft: each failure logged, loop continues)
//! ```
//!
//! The archive copy is the record of the day. Public copies are mirrors;
//! losing one degrades the public site for a day but must never hide the
//! fact that the archive is complete, so fan-out never turns into an error.
//! Destinations are written sequentially in the order given.

use crate::artifact::{Emit, EmitError};
use crate::log::Logger;
use crate::result::ArtifactKind;
use crate::{log_debug, log_error};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Archive write failed: {0}")]
    Archive(#[source] EmitError),
}

/// Result of writing one public destination.
#[derive(Debug)]
pub struct MirrorOutcome {
    pub path: PathBuf,
    pub result: Result<(), EmitError>,
}

impl MirrorOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-destination record of one artifact's fan-out.
#[derive(Debug)]
pub struct PublishReport {
    pub kind: ArtifactKind,
    pub mirrors: Vec<MirrorOutcome>,
}

impl PublishReport {
    pub fn failed_mirrors(&self) -> impl Iterator<Item = &MirrorOutcome> {
        self.mirrors.iter().filter(|m| !m.is_ok())
    }

    pub fn all_mirrored(&self) -> bool {
        self.mirrors.iter().all(MirrorOutcome::is_ok)
    }
}

pub struct Publisher {
    logger: Arc<dyn Logger>,
}

impl Publisher {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// The load-bearing write. No retry.
    pub fn write_archive(&self, artifact: &dyn Emit, path: &Path) -> Result<(), PublishError> {
        artifact.emit(path).map_err(|e| {
            log_error!(self.logger, "Archive write of {} failed: {}", path.display(), e);
            PublishError::Archive(e)
        })?;
        log_debug!(self.logger, "Archived {} at {}.", artifact.kind(), path.display());
        Ok(())
    }

    /// Write `artifact` to every public path in order. Never fails; each
    /// failure is logged and recorded in the report.
    pub fn fan_out(&self, artifact: &dyn Emit, public: &[PathBuf]) -> PublishReport {
        let mirrors = public
            .iter()
            .map(|path| {
                let result = artifact.emit(path);
                match &result {
                    Ok(()) => log_debug!(self.logger, "Mirrored {} to {}.", artifact.kind(), path.display()),
                    Err(e) => log_error!(self.logger, "Public write failed, continuing: {}", e),
                }
                MirrorOutcome {
                    path: path.clone(),
                    result,
                }
            })
            .collect();
        PublishReport {
            kind: artifact.kind(),
            mirrors,
        }
    }
}
