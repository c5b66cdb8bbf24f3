//! Publication step: turns a successful [`PipelineResult`] into posts.
//!
//! The preparation pipeline never talks to the social network. This module
//! takes its result, checks it is safe to publish (success and every path on
//! disk), builds the post or thread, and hands it to a [`Poster`].
//!
//! ## Key resources thread
//!
//! ```text
//! [0] Ressources clés d'hier. Chaque ressource est ... le 2024-03-04.   + image
//! [1] Ressource 1 (page web):\nhttps://...
//! [2] Ressource 2 (tweet):\nhttps://...
//! ```
//!
//! The posting response is saved as `key-resources-result.json` next to the
//! archived CSV. Failing to save it is only logged: the posts are out.
//!
//! Only [`LogPoster`] ships here; it writes the posts to the log instead of
//! sending them.

use crate::date::DateContext;
use crate::log::Logger;
use crate::result::{ArtifactKind, PipelineResult};
use crate::table::{Row, read_table};
use crate::{log_debug, log_error, log_info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("Media upload failed for {path}: {message}")]
    Upload { path: PathBuf, message: String },
    #[error("Posting failed: {0}")]
    Post(String),
}

/// One post of a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_ids: Vec<String>,
}

impl Post {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media_ids: Vec::new(),
        }
    }

    pub fn with_media(text: impl Into<String>, media_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media_ids: vec![media_id.into()],
        }
    }
}

/// Social-media client.
pub trait Poster {
    /// Upload a file, returning the media id to attach to a post.
    fn upload_media(&self, path: &Path) -> Result<String, PostError>;

    /// Post `posts` as a thread (a single post when there is one).
    fn post(&self, posts: &[Post]) -> Result<serde_json::Value, PostError>;
}

/// Poster that only logs. Media ids are `media-1`, `media-2`, ...
pub struct LogPoster {
    logger: Arc<dyn Logger>,
    uploads: AtomicUsize,
}

impl LogPoster {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            uploads: AtomicUsize::new(0),
        }
    }
}

impl Poster for LogPoster {
    fn upload_media(&self, path: &Path) -> Result<String, PostError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        log_info!(self.logger, "Upload {} as media-{}", path.display(), n);
        Ok(format!("media-{n}"))
    }

    fn post(&self, posts: &[Post]) -> Result<serde_json::Value, PostError> {
        for (i, post) in posts.iter().enumerate() {
            log_info!(self.logger, "Post {}/{}: {:?} {:?}", i + 1, posts.len(), post.text, post.media_ids);
        }
        let data: Vec<serde_json::Value> = posts
            .iter()
            .enumerate()
            .map(|(i, post)| serde_json::json!({ "id": (i + 1).to_string(), "text": post.text }))
            .collect();
        Ok(serde_json::json!({ "data": data }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostOutcome {
    pub success: bool,
    pub message: String,
}

impl PostOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// =============================================================================
// Post text
// =============================================================================

/// Intro post of the key resources thread. `date` is the run date; the
/// resources described are the previous day's.
pub fn key_resources_intro(date: &DateContext) -> String {
    format!(
        "Ressources clés d'hier. Chaque ressource est la plus échangée dans sa zone du débat politique le {}.",
        date.previous_day()
    )
}

/// `Ressource {rank} ({type}):\n{url}`, with `url` typed resources shown as
/// "page web".
pub fn resource_post_text(row: &Row) -> String {
    let field = |name: &str| row.get(name).map(String::as_str).unwrap_or("");
    let kind = match field("type") {
        "url" => "page web",
        other => other,
    };
    format!("Ressource {} ({}):\n{}", field("rank"), kind, field("url"))
}

/// `<dir>/key-resources.csv` → `<dir>/key-resources-result.json`.
pub fn result_file_path(table_path: &Path) -> PathBuf {
    let stem = table_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    table_path.with_file_name(format!("{stem}-result.json"))
}

// =============================================================================
// Publication
// =============================================================================

/// Refuse anything that is not a success with every referenced file present.
fn check_publishable(result: &PipelineResult, what: &str, logger: &dyn Logger) -> Result<(), PostOutcome> {
    if result.is_publishable() {
        return Ok(());
    }
    if !result.success {
        log_error!(logger, "{} preparation failed, nothing to post: {}", what, result.message);
        return Err(PostOutcome::failed(format!("Could not post {what}: preparation failed.")));
    }
    for path in result.missing_paths() {
        log_error!(logger, "Could not post {}: {} does not exist.", what, path.display());
    }
    Err(PostOutcome::failed(format!("Could not post {what}: missing files.")))
}

/// Post the daily carto image on its own.
pub fn publish_daily_carto(
    result: &PipelineResult,
    poster: &dyn Poster,
    logger: &dyn Logger,
) -> PostOutcome {
    if let Err(outcome) = check_publishable(result, "the daily carto", logger) {
        return outcome;
    }
    let Some(image) = result.path(ArtifactKind::Image) else {
        log_error!(logger, "Could not post: the daily carto image is missing from the result.");
        return PostOutcome::failed("Could not post the daily carto: no image.");
    };

    let posted = poster
        .upload_media(image)
        .and_then(|media_id| poster.post(&[Post::with_media("", media_id)]));
    match posted {
        Ok(response) => {
            log_info!(logger, "Daily carto posted.");
            log_debug!(logger, "Response: {}", response);
            PostOutcome::ok("Daily carto posted.")
        }
        Err(e) => {
            log_error!(logger, "Could not post the daily carto: {}", e);
            PostOutcome::failed(format!("Could not post the daily carto: {e}"))
        }
    }
}

/// Post the key resources thread and save the response next to the CSV.
pub fn publish_key_resources(
    result: &PipelineResult,
    date: &DateContext,
    poster: &dyn Poster,
    logger: &dyn Logger,
) -> PostOutcome {
    if let Err(outcome) = check_publishable(result, "the key resources", logger) {
        return outcome;
    }
    let (Some(image), Some(table_path)) = (
        result.path(ArtifactKind::Image),
        result.path(ArtifactKind::Table),
    ) else {
        log_error!(logger, "Could not post: the key resources need both an image and a table.");
        return PostOutcome::failed("Could not post the key resources: image or table missing.");
    };

    let table = match read_table(table_path) {
        Ok(table) => table,
        Err(e) => {
            log_error!(logger, "The key resources CSV could not be loaded: {}", e);
            return PostOutcome::failed(format!("Could not post the key resources: {e}"));
        }
    };

    let posted = poster.upload_media(image).and_then(|media_id| {
        let mut posts = vec![Post::with_media(key_resources_intro(date), media_id)];
        posts.extend(table.rows().iter().map(|row| Post::text(resource_post_text(row))));
        poster.post(&posts)
    });
    let response = match posted {
        Ok(response) => response,
        Err(e) => {
            log_error!(logger, "Could not post the key resources thread: {}", e);
            return PostOutcome::failed(format!("Could not post the key resources: {e}"));
        }
    };
    log_info!(logger, "Key resources thread posted ({} resources).", table.len());

    let result_file = result_file_path(table_path);
    match serde_json::to_string(&response)
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(&result_file, json).map_err(|e| e.to_string()))
    {
        Ok(()) => log_debug!(logger, "Posting result saved at {}.", result_file.display()),
        Err(e) => log_error!(
            logger,
            "The posting result could not be saved at {}: {}",
            result_file.display(),
            e
        ),
    }

    PostOutcome::ok("Key resources thread posted.")
}
