//! `horizon file` command.

use std::fmt::Write as _;
use std::path::Path;

use crate::context::ServiceContext;
use crate::pipeline::AnalysisResult;
use crate::service::AnalysisService;

use super::Output;

/// Execute the `file` command: analyze one file and print its analysis.
///
/// # Errors
///
/// Returns an error string if the file cannot be read or analyzed.
pub async fn run(
    service: &AnalysisService<'_>,
    ctx: &ServiceContext,
    root: &Path,
    path: &Path,
    output: &Output,
) -> Result<(), String> {
    let result = service.analyze_path(root, path).await.map_err(|e| e.to_string())?;
    output.emit(ctx, &result, || render(&result))
}

fn render(result: &AnalysisResult) -> String {
    let mut out = result.overview.clone();
    if let Some(depth) = &result.technical_depth {
        let _ = write!(out, "\n\nTechnical depth:\n{depth}");
    }
    if let Some(exports) = &result.exports {
        let _ = write!(out, "\n\nExports: {exports}");
    }
    if !result.symbols.is_empty() {
        out.push_str("\n\nSymbols:");
        for symbol in &result.symbols {
            let _ = write!(out, "\n  {} ({}): {}", symbol.name, symbol.kind, symbol.description);
        }
    }
    out
}
