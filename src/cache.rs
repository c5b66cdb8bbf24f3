//! Cache gate for daily re-runs.
//!
//! The pipeline is meant to be fired by a scheduler, possibly several times a
//! day. Once a day's artifacts are archived, a re-run should cost nothing:
//! the gate sees that every archive target exists and answers with a ready
//! [`PipelineResult`] instead of recomputing.
//!
//! # Rules
//!
//! - `force = true` is always a miss.
//! - A hit requires **all** targets on disk. If a previous run died between
//!   writing the image and the table, only some targets exist; that is a
//!   miss and every target gets regenerated.
//!
//! The check is existence-only, not content-addressed: source files for a
//! past day are not expected to change, and corrections go through `force`.

use crate::result::{ArtifactKind, PipelineResult};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One expected output of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheDecision {
    /// Everything is already there. Carries the result to hand back.
    Hit(PipelineResult),
    /// Regenerate all targets. Carries why, for logging.
    Miss(MissReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    Forced,
    /// None of the targets exist.
    Absent,
    /// Some targets exist, these do not.
    Partial(Vec<PathBuf>),
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::Forced => f.write_str("force mode"),
            MissReason::Absent => f.write_str("no targets on disk"),
            MissReason::Partial(missing) => {
                write!(f, "partial previous run, {} target(s) missing", missing.len())
            }
        }
    }
}

/// Decide whether a run can be skipped.
///
/// `hit_message` becomes the message of the cached result.
pub fn check(force: bool, targets: &[Target], hit_message: &str) -> CacheDecision {
    if force {
        return CacheDecision::Miss(MissReason::Forced);
    }

    let missing: Vec<PathBuf> = targets
        .iter()
        .filter(|t| !t.path.is_file())
        .map(|t| t.path.clone())
        .collect();

    if targets.is_empty() || missing.len() == targets.len() {
        return CacheDecision::Miss(MissReason::Absent);
    }
    if !missing.is_empty() {
        return CacheDecision::Miss(MissReason::Partial(missing));
    }

    let paths: BTreeMap<ArtifactKind, PathBuf> = targets
        .iter()
        .map(|t| (t.kind, t.path.clone()))
        .collect();
    CacheDecision::Hit(PipelineResult::cached(paths, hit_message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn targets(tmp: &TempDir) -> Vec<Target> {
        vec![
            Target {
                kind: ArtifactKind::Image,
                path: tmp.path().join("key-resources.jpg"),
            },
            Target {
                kind: ArtifactKind::Table,
                path: tmp.path().join("key-resources.csv"),
            },
        ]
    }

    #[test]
    fn hit_when_all_targets_exist() {
        let tmp = TempDir::new().unwrap();
        let targets = targets(&tmp);
        for t in &targets {
            fs::write(&t.path, "data").unwrap();
        }

        match check(false, &targets, "existing") {
            CacheDecision::Hit(result) => {
                assert!(result.success);
                assert!(result.cached);
                assert_eq!(result.message, "existing");
                assert_eq!(result.path(ArtifactKind::Image), Some(targets[0].path.as_path()));
                assert_eq!(result.path(ArtifactKind::Table), Some(targets[1].path.as_path()));
            }
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[test]
    fn force_is_always_a_miss() {
        let tmp = TempDir::new().unwrap();
        let targets = targets(&tmp);
        for t in &targets {
            fs::write(&t.path, "data").unwrap();
        }
        assert_eq!(
            check(true, &targets, "m"),
            CacheDecision::Miss(MissReason::Forced)
        );
    }

    #[test]
    fn miss_when_nothing_exists() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            check(false, &targets(&tmp), "m"),
            CacheDecision::Miss(MissReason::Absent)
        );
    }

    #[test]
    fn partial_completion_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let targets = targets(&tmp);
        fs::write(&targets[0].path, "jpg only").unwrap();

        assert_eq!(
            check(false, &targets, "m"),
            CacheDecision::Miss(MissReason::Partial(vec![targets[1].path.clone()]))
        );
    }

    #[test]
    fn directory_in_place_of_target_is_not_a_hit() {
        let tmp = TempDir::new().unwrap();
        let targets = targets(&tmp);
        fs::write(&targets[0].path, "data").unwrap();
        fs::create_dir(&targets[1].path).unwrap();

        assert!(matches!(
            check(false, &targets, "m"),
            CacheDecision::Miss(MissReason::Partial(_))
        ));
    }

    #[test]
    fn empty_target_set_never_hits() {
        assert_eq!(
            check(false, &[], "m"),
            CacheDecision::Miss(MissReason::Absent)
        );
    }

    #[test]
    fn miss_reason_display() {
        assert_eq!(MissReason::Forced.to_string(), "force mode");
        assert_eq!(
            MissReason::Partial(vec!["a".into()]).to_string(),
            "partial previous run, 1 target(s) missing"
        );
    }
}
