//! Sequential analysis of many tracks.
//!
//! Every item runs in its own span tagged with the batch run id. A failing
//! item is recorded and the batch moves on.

use super::{AnalyzerError, TrackAnalyzer, WrittenFiles};
use crate::storage::AnalyzerConfig;
use std::path::{Path, PathBuf};
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// One item that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub processed: usize,
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
    /// Files written by the successful items
    pub written: Vec<WrittenFiles>,
}

impl BatchReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            processed: 0,
            succeeded: 0,
            failures: Vec::new(),
            written: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Analyze every track in `paths`, writing results into `output_dir` under
/// the input's file name.
///
/// Each track gets the regression run first and the ratio run when that
/// finds no slope on a climbing track.
pub fn analyze_batch<P: AsRef<Path>>(
    paths: &[P],
    config: &AnalyzerConfig,
    output_dir: &Path,
) -> BatchReport {
    let mut report = BatchReport::new();
    info!(
        "Batch {}: analyzing {} tracks into {}",
        report.run_id,
        paths.len(),
        output_dir.display()
    );

    for path in paths {
        let path = path.as_ref();
        report.processed += 1;
        let span = info_span!("batch_item", run = %report.run_id, item = report.processed);
        match analyze_one(path, config, output_dir, span.clone()) {
            Ok(written) => {
                report.succeeded += 1;
                report.written.push(written);
            }
            Err(e) => {
                let _guard = span.entered();
                warn!("Failed to analyze {}: {}", path.display(), e);
                report.failures.push(BatchFailure {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Batch {}: {} processed, {} succeeded",
        report.run_id, report.processed, report.succeeded
    );
    report
}

fn analyze_one(
    path: &Path,
    config: &AnalyzerConfig,
    output_dir: &Path,
    span: tracing::Span,
) -> Result<WrittenFiles, AnalyzerError> {
    let file_name = path.file_name().unwrap_or(path.as_os_str());
    let output = output_dir.join(file_name).with_extension("gpx");

    let mut analyzer = TrackAnalyzer::new(path, config.clone()).with_span(span);
    analyzer.analyze_with_fallback()?;
    analyzer.write(&output)
}
