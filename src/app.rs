use std::time::{Duration, Instant};

use serde::Serialize;

use crate::atlas::Atlas;
use crate::diagnostics::Diagnostics;
use crate::error::CatalogError;
use crate::pipeline::{CatalogOutput, PipelineSummary, run_pipeline};
use crate::source::CatalogSource;

#[derive(Debug, Clone, Serialize)]
pub struct LoadResult {
    pub generated_at: String,
    #[serde(flatten)]
    pub output: CatalogOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub generated_at: String,
    pub summary: PipelineSummary,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Serialize)]
pub struct AtlasesResult {
    pub generated_at: String,
    pub atlases: Vec<Atlas>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<S: CatalogSource> {
    source: S,
}

impl<S: CatalogSource> App<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetches both inputs to completion, then runs the pipeline once.
    pub fn load(&self, sink: &dyn ProgressSink) -> Result<LoadResult, CatalogError> {
        sink.event(ProgressEvent {
            message: "phase=Fetch; loading catalogue dataset".to_string(),
            elapsed: None,
        });
        let start = Instant::now();
        let dataset = self.source.load_dataset()?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Fetch; {} atlases, {} schemas",
                dataset.atlases.len(),
                dataset.schemas.len()
            ),
            elapsed: Some(start.elapsed()),
        });

        let start = Instant::now();
        let metadata = self.source.load_atlas_metadata()?;
        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {} atlas metadata entries", metadata.len()),
            elapsed: Some(start.elapsed()),
        });

        sink.event(ProgressEvent {
            message: "phase=Resolve; resolving entity graph".to_string(),
            elapsed: None,
        });
        let start = Instant::now();
        let output = run_pipeline(&dataset, &metadata)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Resolve; kept {} of {} files, {} atlases",
                output.summary.kept_files, output.summary.files, output.summary.kept_atlases
            ),
            elapsed: Some(start.elapsed()),
        });

        Ok(LoadResult {
            generated_at: chrono::Utc::now().to_rfc3339(),
            output,
        })
    }

    pub fn summary(&self, sink: &dyn ProgressSink) -> Result<SummaryResult, CatalogError> {
        let loaded = self.load(sink)?;
        Ok(SummaryResult {
            generated_at: loaded.generated_at,
            summary: loaded.output.summary,
            diagnostics: loaded.output.diagnostics,
        })
    }

    pub fn atlases(&self, sink: &dyn ProgressSink) -> Result<AtlasesResult, CatalogError> {
        let loaded = self.load(sink)?;
        Ok(AtlasesResult {
            generated_at: loaded.generated_at,
            atlases: loaded.output.atlases,
        })
    }
}
