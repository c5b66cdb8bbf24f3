//! Daily preparation pipeline.
//!
//! ```text
//! START → RESOLVE_CONTEXT → PLAN_PATHS → CHECK_CACHE ─┬─ hit ──────────────────────────────► DONE
//!                                                     └─ miss → LOAD_AND_COMPOSE → ARCHIVE_WRITE
//!                                                                 → PUBLIC_FANOUT → DONE
//! any failure up to and including ARCHIVE_WRITE ──► FAILED
//! ```
//!
//! A [`Job`] names its archive targets and knows how to turn a day's sources
//! into artifacts. The [`Pipeline`] owns everything else: dates, directories,
//! the cache gate, archive/public writes and the final [`PipelineResult`].
//!
//! `prepare` loads every source of a job before anything is written, so a
//! missing input never leaves a fresh half-written day in the archive.
//! Errors never escape [`Pipeline::run`]; they end up as
//! `PipelineResult { success: false, .. }`.

pub mod daily_carto;
pub mod key_resources;

pub use daily_carto::DailyCarto;
pub use key_resources::KeyResources;

use crate::artifact::Emit;
use crate::cache::{self, CacheDecision, Target};
use crate::config::PipelineConfig;
use crate::date::{DateContext, DateError};
use crate::imaging::{BackendError, ComposeError, ImageBackend, RustBackend};
use crate::log::Logger;
use crate::paths::{self, PathError, PipelinePaths};
use crate::publisher::{PublishError, Publisher};
use crate::result::{ArtifactKind, PipelineResult};
use crate::table::TableError;
use crate::{log_debug, log_error, log_info, log_warn};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failure categories reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    DateParse,
    SourceMissing,
    Parse,
    Write,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::DateParse => "date parse failure",
            FailureKind::SourceMissing => "source missing",
            FailureKind::Parse => "parse failure",
            FailureKind::Write => "write failure",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Date(#[from] DateError),
    #[error(transparent)]
    Plan(#[from] PathError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("Could not encode image: {0}")]
    Encode(#[source] BackendError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Date(_) => FailureKind::DateParse,
            PipelineError::Compose(ComposeError::SourceMissing { .. })
            | PipelineError::Table(TableError::SourceMissing(_)) => FailureKind::SourceMissing,
            PipelineError::Compose(_) | PipelineError::Table(TableError::Parse { .. }) => {
                FailureKind::Parse
            }
            PipelineError::Plan(_)
            | PipelineError::Encode(_)
            | PipelineError::Publish(_) => FailureKind::Write,
        }
    }
}

/// Pipeline states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveContext,
    PlanPaths,
    CheckCache,
    LoadAndCompose,
    ArchiveWrite,
    PublicFanout,
    Done,
    Failed,
}

/// Everything a job may read while preparing artifacts.
pub struct PrepareContext<'a> {
    pub date: &'a DateContext,
    pub paths: &'a PipelinePaths,
    pub config: &'a PipelineConfig,
    pub backend: &'a dyn ImageBackend,
    pub logger: &'a dyn Logger,
}

/// One artifact ready to be written: the full copy for the archive and the
/// copy the public directories get (the same object for images).
pub struct Prepared {
    pub kind: ArtifactKind,
    pub file_name: &'static str,
    pub archive: Arc<dyn Emit>,
    pub public: Arc<dyn Emit>,
}

/// A daily preparation.
pub trait Job {
    /// Short identifier, used for the CLI and log files.
    fn name(&self) -> &'static str;

    /// Human-readable name used in result messages.
    fn label(&self) -> &'static str;

    /// Archive file names the job produces, by kind.
    fn targets(&self) -> &'static [(ArtifactKind, &'static str)];

    /// Load sources and build every artifact. Must not write anything.
    fn prepare(&self, ctx: &PrepareContext<'_>) -> Result<Vec<Prepared>, PipelineError>;
}

pub struct Pipeline {
    config: PipelineConfig,
    backend: Box<dyn ImageBackend>,
    logger: Arc<dyn Logger>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, logger: Arc<dyn Logger>) -> Self {
        Self::with_backend(config, Box::new(RustBackend::new()), logger)
    }

    pub fn with_backend(
        config: PipelineConfig,
        backend: Box<dyn ImageBackend>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            config,
            backend,
            logger,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run `job` for `date` (today when `None`).
    pub fn run(&self, job: &dyn Job, date: Option<&str>, force: bool) -> PipelineResult {
        log_info!(self.logger, "***** {} *****", job.name());

        self.enter(Stage::ResolveContext);
        let ctx = match DateContext::resolve(date) {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(job, None, PipelineError::from(e)),
        };

        match self.run_for(job, &ctx, force) {
            Ok(result) => {
                self.enter(Stage::Done);
                result
            }
            Err(e) => self.fail(job, Some(&ctx), e),
        }
    }

    fn run_for(
        &self,
        job: &dyn Job,
        ctx: &DateContext,
        force: bool,
    ) -> Result<PipelineResult, PipelineError> {
        self.enter(Stage::PlanPaths);
        let paths = paths::plan(ctx, &self.config.roots())?;

        self.enter(Stage::CheckCache);
        let targets: Vec<Target> = job
            .targets()
            .iter()
            .map(|&(kind, file_name)| Target {
                kind,
                path: paths.archive_dir.join(file_name),
            })
            .collect();
        let hit_message = format!("{} existing for the {}.", job.label(), ctx);
        match cache::check(force, &targets, &hit_message) {
            CacheDecision::Hit(result) => {
                log_info!(self.logger, "{} retrieved for the {}.", job.label(), ctx);
                return Ok(result);
            }
            CacheDecision::Miss(reason) => {
                log_debug!(self.logger, "Cache miss for {}: {}.", job.name(), reason);
            }
        }

        self.enter(Stage::LoadAndCompose);
        let prepared = job.prepare(&PrepareContext {
            date: ctx,
            paths: &paths,
            config: &self.config,
            backend: self.backend.as_ref(),
            logger: self.logger.as_ref(),
        })?;

        let publisher = Publisher::new(self.logger.clone());

        self.enter(Stage::ArchiveWrite);
        let mut written = BTreeMap::new();
        for artifact in &prepared {
            let path = paths.archive_dir.join(artifact.file_name);
            publisher.write_archive(artifact.archive.as_ref(), &path)?;
            log_info!(self.logger, "{} {} archived for the {}.", job.label(), artifact.kind, ctx);
            written.insert(artifact.kind, path);
        }

        self.enter(Stage::PublicFanout);
        for artifact in &prepared {
            let destinations = self.public_destinations(&paths, artifact.file_name);
            let report = publisher.fan_out(artifact.public.as_ref(), &destinations);
            if !report.all_mirrored() {
                let failed: Vec<String> = report
                    .failed_mirrors()
                    .map(|m| m.path.display().to_string())
                    .collect();
                log_warn!(
                    self.logger,
                    "{} {}: {} of {} public copies failed ({}).",
                    job.label(),
                    report.kind,
                    failed.len(),
                    report.mirrors.len(),
                    failed.join(", ")
                );
            }
        }

        Ok(PipelineResult::prepared(
            written,
            format!("{} prepared for the {}.", job.label(), ctx),
        ))
    }

    /// Public copies of `file_name`, in write order.
    fn public_destinations(&self, paths: &PipelinePaths, file_name: &str) -> Vec<PathBuf> {
        let mut destinations = vec![paths.public_dir_for_date.join(file_name)];
        if self.config.public.mirror_current {
            destinations.push(paths.public_dir_current.join(file_name));
        }
        destinations
    }

    fn enter(&self, stage: Stage) {
        log_debug!(self.logger, "Stage: {:?}", stage);
    }

    fn fail(&self, job: &dyn Job, ctx: Option<&DateContext>, error: PipelineError) -> PipelineResult {
        self.enter(Stage::Failed);
        log_error!(self.logger, "{} failed ({}): {}", job.name(), error.kind(), error);
        let message = match ctx {
            Some(ctx) => format!("{} could not be prepared for the {}: {}", job.label(), ctx, error),
            None => format!("{} could not be prepared: {}", job.label(), error),
        };
        PipelineResult::failed(message)
    }
}
