//! Date-partitioned directory layout.
//!
//! ```text
//! <source>/YYYY/MM/DD/      read-only input, never created
//! <archive>/YYYY/MM/DD/     canonical per-day storage
//! <public>/YYYY/MM/DD/      public mirror for that day
//! <public>/current/         public mirror of the latest day
//! ```
//!
//! [`PipelinePaths::derive`] is pure; [`plan`] derives and then creates every
//! non-source directory. Creation uses `create_dir_all`, so planning the same
//! day twice is a no-op the second time.

use crate::date::DateContext;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the public directory that mirrors the most recent day.
pub const CURRENT_DIR: &str = "current";

#[derive(Error, Debug)]
#[error("Could not create directory {path}: {source}")]
pub struct PathError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The three root folders every partition hangs off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    pub source: PathBuf,
    pub archive: PathBuf,
    pub public: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub source_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub public_dir_for_date: PathBuf,
    pub public_dir_current: PathBuf,
}

impl PipelinePaths {
    /// Derive all directories for `ctx` without touching the filesystem.
    pub fn derive(ctx: &DateContext, roots: &Roots) -> Self {
        let partition = ctx.partition();
        Self {
            source_dir: roots.source.join(&partition),
            archive_dir: roots.archive.join(&partition),
            public_dir_for_date: roots.public.join(&partition),
            public_dir_current: roots.public.join(CURRENT_DIR),
        }
    }

    /// Directories the pipeline writes to, in creation order.
    pub fn writable_dirs(&self) -> [&Path; 3] {
        [
            self.archive_dir.as_path(),
            self.public_dir_for_date.as_path(),
            self.public_dir_current.as_path(),
        ]
    }

    /// Create every writable directory. Existing directories are fine.
    pub fn ensure_dirs(&self) -> Result<(), PathError> {
        for dir in self.writable_dirs() {
            std::fs::create_dir_all(dir).map_err(|source| PathError {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Derive the paths for `ctx` and create the destination directories.
pub fn plan(ctx: &DateContext, roots: &Roots) -> Result<PipelinePaths, PathError> {
    let paths = PipelinePaths::derive(ctx, roots);
    paths.ensure_dirs()?;
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn roots_in(tmp: &TempDir) -> Roots {
        Roots {
            source: tmp.path().join("source"),
            archive: tmp.path().join("archive"),
            public: tmp.path().join("public"),
        }
    }

    fn ctx() -> DateContext {
        DateContext::resolve(Some("2024-03-05")).unwrap()
    }

    #[test]
    fn derive_builds_partitioned_paths() {
        let roots = Roots {
            source: "/data/src".into(),
            archive: "/data/archive".into(),
            public: "/var/www/data".into(),
        };
        let paths = PipelinePaths::derive(&ctx(), &roots);
        assert_eq!(paths.source_dir, PathBuf::from("/data/src/2024/03/05"));
        assert_eq!(paths.archive_dir, PathBuf::from("/data/archive/2024/03/05"));
        assert_eq!(
            paths.public_dir_for_date,
            PathBuf::from("/var/www/data/2024/03/05")
        );
        assert_eq!(
            paths.public_dir_current,
            PathBuf::from("/var/www/data/current")
        );
    }

    #[test]
    fn derive_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let roots = roots_in(&tmp);
        assert_eq!(
            PipelinePaths::derive(&ctx(), &roots),
            PipelinePaths::derive(&ctx(), &roots)
        );
    }

    #[test]
    fn plan_creates_destinations_but_not_source() {
        let tmp = TempDir::new().unwrap();
        let paths = plan(&ctx(), &roots_in(&tmp)).unwrap();

        assert!(paths.archive_dir.is_dir());
        assert!(paths.public_dir_for_date.is_dir());
        assert!(paths.public_dir_current.is_dir());
        assert!(!paths.source_dir.exists());
    }

    #[test]
    fn plan_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let roots = roots_in(&tmp);
        let first = plan(&ctx(), &roots).unwrap();
        std::fs::write(first.archive_dir.join("keep.txt"), "x").unwrap();

        let second = plan(&ctx(), &roots).unwrap();
        assert_eq!(first, second);
        assert!(second.archive_dir.join("keep.txt").exists());
    }

    #[test]
    fn plan_reports_the_directory_it_could_not_create() {
        let tmp = TempDir::new().unwrap();
        // A file where the archive root should be.
        std::fs::write(tmp.path().join("archive"), "not a dir").unwrap();

        let err = plan(&ctx(), &roots_in(&tmp)).unwrap_err();
        assert!(err.path.starts_with(tmp.path().join("archive")));
    }
}
