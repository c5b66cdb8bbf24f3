//! Key resources: one pre-rendered PNG and its CSV.
//!
//! | Source (`<source>/YYYY/MM/DD/`) | Archive | Public |
//! |---|---|---|
//! | `Key resources.png` | `key-resources.jpg` | same JPEG |
//! | `key_resources.csv` | `key-resources.csv` (full) | `key-resources.csv` (projected) |

use super::{Job, PipelineError, PrepareContext, Prepared};
use crate::artifact::{Artifact, Emit};
use crate::imaging::compositor::check_layers;
use crate::imaging::{Layer, OutputFormat, compose};
use crate::log_debug;
use crate::result::ArtifactKind;
use crate::table::{ProjectionRule, read_table};
use std::sync::Arc;

pub const SOURCE_IMAGE: &str = "Key resources.png";
pub const SOURCE_TABLE: &str = "key_resources.csv";
pub const TARGET_IMAGE: &str = "key-resources.jpg";
pub const TARGET_TABLE: &str = "key-resources.csv";

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyResources;

impl Job for KeyResources {
    fn name(&self) -> &'static str {
        "key-resources"
    }

    fn label(&self) -> &'static str {
        "Key resources"
    }

    fn targets(&self) -> &'static [(ArtifactKind, &'static str)] {
        &[
            (ArtifactKind::Image, TARGET_IMAGE),
            (ArtifactKind::Table, TARGET_TABLE),
        ]
    }

    fn prepare(&self, ctx: &PrepareContext<'_>) -> Result<Vec<Prepared>, PipelineError> {
        let layers = [Layer::new("Key resources", ctx.paths.source_dir.join(SOURCE_IMAGE))];
        // Both sources must be present before the (slow) compositing starts.
        check_layers(&layers)?;
        let table = read_table(&ctx.paths.source_dir.join(SOURCE_TABLE))?;
        log_debug!(ctx.logger, "Loaded {} key resources for the {}.", table.len(), ctx.date);

        let composite = compose(ctx.backend, ctx.config.canvas_size(), &layers, ctx.logger)?;
        let image = composite
            .encode(OutputFormat::Jpeg, &ctx.config.encode_options())
            .map_err(PipelineError::Encode)?;
        let image: Arc<dyn Emit> = Arc::new(Artifact::Image(image));

        let public_table = table.project(&ProjectionRule::key_resources());

        Ok(vec![
            Prepared {
                kind: ArtifactKind::Image,
                file_name: TARGET_IMAGE,
                archive: image.clone(),
                public: image,
            },
            Prepared {
                kind: ArtifactKind::Table,
                file_name: TARGET_TABLE,
                archive: Arc::new(Artifact::Table(table)),
                public: Arc::new(Artifact::Table(public_table)),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::DateContext;
    use crate::imaging::backend::tests::MockBackend;
    use crate::log::NoOpLogger;
    use crate::paths::PipelinePaths;
    use crate::pipeline::{FailureKind, Pipeline};
    use crate::test_helpers::{KEY_RESOURCES_CSV, source_partition, test_config};
    use tempfile::TempDir;

    fn pipeline(tmp: &TempDir, backend: MockBackend) -> Pipeline {
        Pipeline::with_backend(test_config(tmp.path()), Box::new(backend), Arc::new(NoOpLogger))
    }

    #[test]
    fn writes_jpeg_and_both_tables() {
        let tmp = TempDir::new().unwrap();
        let src = source_partition(tmp.path(), "2024-03-05");
        std::fs::write(src.join(SOURCE_IMAGE), b"").unwrap();
        std::fs::write(src.join(SOURCE_TABLE), KEY_RESOURCES_CSV).unwrap();
        let backend = MockBackend::new().with_layer(SOURCE_IMAGE, 16, 16, [200, 0, 0, 255]);

        let result = pipeline(&tmp, backend).run(&KeyResources, Some("2024-03-05"), false);
        assert!(result.success, "{}", result.message);

        let archive = tmp.path().join("archive/2024/03/05");
        let public = tmp.path().join("public/2024/03/05");
        assert_eq!(result.path(ArtifactKind::Image), Some(archive.join(TARGET_IMAGE).as_path()));
        assert_eq!(result.path(ArtifactKind::Table), Some(archive.join(TARGET_TABLE).as_path()));

        assert_eq!(
            std::fs::read_to_string(archive.join(TARGET_TABLE)).unwrap(),
            KEY_RESOURCES_CSV
        );
        let public_csv = std::fs::read_to_string(public.join(TARGET_TABLE)).unwrap();
        assert!(public_csv.starts_with("rank,id,type,url,broadcast_by_mps,bcing_mps_group\n"));
        assert_eq!(
            std::fs::read(archive.join(TARGET_IMAGE)).unwrap(),
            std::fs::read(public.join(TARGET_IMAGE)).unwrap()
        );
    }

    #[test]
    fn missing_csv_fails_before_compositing() {
        let tmp = TempDir::new().unwrap();
        let src = source_partition(tmp.path(), "2024-03-05");
        std::fs::write(src.join(SOURCE_IMAGE), b"").unwrap();
        let backend = MockBackend::new().with_layer(SOURCE_IMAGE, 4, 4, [1, 1, 1, 255]);

        let config = test_config(tmp.path());
        let date = DateContext::resolve(Some("2024-03-05")).unwrap();
        let paths = PipelinePaths::derive(&date, &config.roots());
        let err = KeyResources
            .prepare(&PrepareContext {
                date: &date,
                paths: &paths,
                config: &config,
                backend: &backend,
                logger: &NoOpLogger,
            })
            .err()
            .unwrap();

        assert_eq!(err.kind(), FailureKind::SourceMissing);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn missing_png_fails_closed() {
        let tmp = TempDir::new().unwrap();
        let src = source_partition(tmp.path(), "2024-03-05");
        std::fs::write(src.join(SOURCE_TABLE), KEY_RESOURCES_CSV).unwrap();

        let result = pipeline(&tmp, MockBackend::new()).run(&KeyResources, Some("2024-03-05"), false);
        assert!(!result.success);
        assert!(result.message.contains(SOURCE_IMAGE));
        assert!(!tmp.path().join("archive/2024/03/05").join(TARGET_TABLE).exists());
    }
}
