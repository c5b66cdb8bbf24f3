//! # dailycarto
//!
//! Prepares the daily carto artifacts from pre-rendered per-day sources,
//! archives them, mirrors them to a public folder, and hands them to a
//! publication step.
//!
//! # Architecture: One Pipeline, Several Jobs
//!
//! Every job goes through the same state machine:
//!
//! ```text
//! RESOLVE_CONTEXT → PLAN_PATHS → CHECK_CACHE ─┬─ hit  → DONE
//!                                             └─ miss → LOAD_AND_COMPOSE
//!                                                        → ARCHIVE_WRITE → PUBLIC_FANOUT → DONE
//! ```
//!
//! and ends in exactly one [`result::PipelineResult`]. A job only says which
//! files it produces and how to build them from a day's sources; dates,
//! directories, caching and writes belong to [`pipeline::Pipeline`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`date`] | Resolves the target day into zero-padded `YYYY/MM/DD` parts |
//! | [`paths`] | Derives and creates source, archive and public directories |
//! | [`cache`] | Skips a day whose archive already holds every target |
//! | [`imaging`] | Layer compositing and JPEG/PNG encoding, pure Rust |
//! | [`table`] | CSV parsing, public column projection, re-serialization |
//! | [`artifact`] | Produced artifacts and the [`artifact::Emit`] write seam |
//! | [`publisher`] | Archive write (hard gate) then public fan-out (best effort) |
//! | [`result`] | The success/paths/message contract |
//! | [`pipeline`] | The state machine and the key resources / daily carto jobs |
//! | [`social`] | Publication step: post building and the [`social::Poster`] trait |
//! | [`config`] | `config.toml` loading, environment overrides, validation |
//! | [`log`] | Logger trait, `log_*!` macros, `tracing` adapter |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Archive Is Load-Bearing, the Public Mirror Is Not
//!
//! A failed archive write fails the run and nothing reaches the public
//! folder. Once the archive is written, a failing public copy is logged and
//! the run still succeeds: the archive is what the publication step reads
//! and what a re-run's cache gate checks.
//!
//! Files are staged and renamed into place, so a target on disk is always
//! complete. The cache gate only checks existence and relies on that.
//!
//! ## Load Everything Before Writing Anything
//!
//! A job loads, composes and parses all of its sources before the first
//! write. A missing legend or a ragged CSV leaves the day's archive exactly
//! as it was.
//!
//! ## No Ambient State
//!
//! Folders come in through [`config::PipelineConfig`], which the binary
//! builds from `config.toml` and the environment. Library code never reads
//! environment variables or installs a logging subscriber.

pub mod artifact;
pub mod cache;
pub mod config;
pub mod date;
pub mod imaging;
pub mod log;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod publisher;
pub mod result;
pub mod social;
pub mod table;

#[cfg(test)]
pub(crate) mod test_helpers;
