//! `horizon folder` command.

use std::path::Path;

use crate::context::ServiceContext;
use crate::pipeline::AggregationStrategy;
use crate::service::AnalysisService;

use super::{render_summary, Output};

/// Execute the `folder` command: summarize one folder as a module.
///
/// # Errors
///
/// Returns an error string if the summary request exhausts its retries.
pub async fn run(
    service: &AnalysisService<'_>,
    ctx: &ServiceContext,
    path: &Path,
    strategy: AggregationStrategy,
    output: &Output,
) -> Result<(), String> {
    if !ctx.fs.is_dir(path) {
        return Err(format!("not a directory: {}", path.display()));
    }
    let summary = service.analyze_folder(path, strategy).await.map_err(|e| e.to_string())?;
    output.emit(ctx, &summary, || render_summary(&summary))
}
