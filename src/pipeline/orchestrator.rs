//! Serial end-to-end run: enumerate, analyze each file, aggregate once.

use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::aggregate::ModuleAggregator;
use super::analyze::FileAnalyzer;
use super::enumerate::enumerate;
use super::{FileRecord, ModuleSummary, SkippedFile};
use crate::error::AggregateError;
use crate::ports::{FileSystem, ProgressEvent, ProgressSink};

/// Drives a whole-project analysis one file at a time.
///
/// Serial scheduling keeps progress percentages exact and stays friendly to
/// upstream rate limits; the fixed pause only delays this task.
pub struct Orchestrator<'a> {
    fs: &'a dyn FileSystem,
    progress: &'a dyn ProgressSink,
    analyzer: &'a FileAnalyzer<'a>,
    aggregator: &'a ModuleAggregator<'a>,
    inter_call_delay: Duration,
    cancel: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator that pauses `inter_call_delay` between files.
    pub fn new(
        fs: &'a dyn FileSystem,
        progress: &'a dyn ProgressSink,
        analyzer: &'a FileAnalyzer<'a>,
        aggregator: &'a ModuleAggregator<'a>,
        inter_call_delay: Duration,
    ) -> Self {
        Self {
            fs,
            progress,
            analyzer,
            aggregator,
            inter_call_delay,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` to stop the run at the next file boundary.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Analyzes every file under `root` and returns the project summary.
    ///
    /// Per-file read and analysis failures are logged and listed in
    /// [`ModuleSummary::skipped`]; they never abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Cancelled`] if cancellation is observed at a
    /// file boundary or before aggregation, and [`AggregateError::Gateway`]
    /// if the final reduce request fails.
    pub async fn run_analysis(&self, root: &Path) -> Result<ModuleSummary, AggregateError> {
        let files = enumerate(self.fs, root);
        let total = files.len();
        if total == 0 {
            tracing::info!(root = %root.display(), "no analyzable files");
            return Ok(ModuleSummary::starved(root, Vec::new(), Vec::new()));
        }

        tracing::info!(root = %root.display(), total, "starting serial analysis");

        let mut analyses = Vec::with_capacity(total);
        let mut skipped = Vec::new();

        for (index, path) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(AggregateError::Cancelled { completed: index, total });
            }

            let record = FileRecord::new(root, path);
            tracing::info!(
                "[{}/{total}] analyzing {} ({})",
                index + 1,
                record.relative_path,
                record.category
            );

            match self.fs.read_to_string(path) {
                Ok(content) => match self.analyzer.analyze(&content, &record).await {
                    Ok(result) => analyses.push((record, result)),
                    Err(e) => {
                        tracing::error!(file = %record.relative_path, error = %e, "skipping file");
                        skipped.push(SkippedFile {
                            path: record.relative_path,
                            reason: e.to_string(),
                        });
                    }
                },
                Err(e) => {
                    tracing::error!(file = %record.relative_path, error = %e, "unreadable file");
                    skipped.push(SkippedFile {
                        path: record.relative_path,
                        reason: format!("unreadable: {e}"),
                    });
                }
            }

            self.progress.emit(ProgressEvent::after(index + 1, total));

            if index + 1 < total && !self.inter_call_delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(self.inter_call_delay) => {}
                    () = self.cancel.cancelled() => {}
                }
            }
        }

        if self.cancel.is_cancelled() {
            return Err(AggregateError::Cancelled { completed: total, total });
        }

        tracing::info!(analyzed = analyses.len(), skipped = skipped.len(), "aggregating");
        self.aggregator.aggregate(root, &analyses, skipped, Vec::new()).await
    }
}
