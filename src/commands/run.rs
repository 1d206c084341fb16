//! `horizon run` command.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::context::ServiceContext;
use crate::service::AnalysisService;

use super::{render_summary, Output};

/// Execute the `run` command: serial whole-project analysis.
///
/// Ctrl-C stops the run at the next file boundary.
///
/// # Errors
///
/// Returns an error string if the run is cancelled or the final summary
/// request fails.
pub async fn run(
    service: AnalysisService<'_>,
    ctx: &ServiceContext,
    root: &Path,
    output: &Output,
) -> Result<(), String> {
    if !ctx.fs.is_dir(root) {
        return Err(format!("not a directory: {}", root.display()));
    }

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping after the current file");
                cancel.cancel();
            }
        }
    });

    let service = service.with_cancellation(cancel);
    let outcome = service.run_analysis(root).await;
    watcher.abort();

    let summary = outcome.map_err(|e| e.to_string())?;
    output.emit(ctx, &summary, || render_summary(&summary))
}
