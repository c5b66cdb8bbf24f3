//! The outcome contract between preparation and publication.
//!
//! Every pipeline invocation ends in exactly one [`PipelineResult`]. Failures
//! are folded into `success: false` plus a message; they never escape as
//! errors or panics. The publication step must check `success` and that
//! every path in `paths` exists before posting anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which artifact a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Table,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Image => f.write_str("image"),
            ArtifactKind::Table => f.write_str("table"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    /// Archive path of each produced artifact. Empty on failure.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paths: BTreeMap<ArtifactKind, PathBuf>,
    pub message: String,
    /// True when the cache gate short-circuited the run.
    #[serde(default)]
    pub cached: bool,
}

impl PipelineResult {
    pub fn prepared(paths: BTreeMap<ArtifactKind, PathBuf>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            paths,
            message: message.into(),
            cached: false,
        }
    }

    pub fn cached(paths: BTreeMap<ArtifactKind, PathBuf>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            paths,
            message: message.into(),
            cached: true,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            paths: BTreeMap::new(),
            message: message.into(),
            cached: false,
        }
    }

    pub fn path(&self, kind: ArtifactKind) -> Option<&Path> {
        self.paths.get(&kind).map(PathBuf::as_path)
    }

    /// Paths referenced by the result that are not on disk.
    pub fn missing_paths(&self) -> Vec<&Path> {
        self.paths
            .values()
            .map(PathBuf::as_path)
            .filter(|p| !p.exists())
            .collect()
    }

    /// Successful and every referenced path exists: safe to publish.
    pub fn is_publishable(&self) -> bool {
        self.success && !self.paths.is_empty() && self.missing_paths().is_empty()
    }
}
