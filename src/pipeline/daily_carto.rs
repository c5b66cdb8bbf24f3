//! Daily carto: the map layer with its legend on top, as PNG.

use super::{Job, PipelineError, PrepareContext, Prepared};
use crate::artifact::{Emit, PngStream};
use crate::imaging::{Layer, compose};
use crate::result::ArtifactKind;
use std::sync::Arc;

pub const SOURCE_CARTO: &str = "Carto Twitter.png";
pub const SOURCE_LEGEND: &str = "Legend Twitter.png";
pub const TARGET_IMAGE: &str = "daily-carto.png";

#[derive(Debug, Clone, Copy, Default)]
pub struct DailyCarto;

impl Job for DailyCarto {
    fn name(&self) -> &'static str {
        "daily-carto"
    }

    fn label(&self) -> &'static str {
        "Daily carto"
    }

    fn targets(&self) -> &'static [(ArtifactKind, &'static str)] {
        &[(ArtifactKind::Image, TARGET_IMAGE)]
    }

    fn prepare(&self, ctx: &PrepareContext<'_>) -> Result<Vec<Prepared>, PipelineError> {
        let source = &ctx.paths.source_dir;
        let layers = [
            Layer::new("Carto", source.join(SOURCE_CARTO)),
            Layer::new("Legend", source.join(SOURCE_LEGEND)),
        ];
        let composite = compose(ctx.backend, ctx.config.canvas_size(), &layers, ctx.logger)?;

        // PNG is encoded straight into each destination file.
        let image: Arc<dyn Emit> = Arc::new(PngStream(Arc::new(composite)));
        Ok(vec![Prepared {
            kind: ArtifactKind::Image,
            file_name: TARGET_IMAGE,
            archive: image.clone(),
            public: image,
        }])
    }
}
