//! Command dispatch and handlers.

pub mod file;
pub mod folder;
pub mod run;
pub mod tree;

use std::env;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command};
use crate::config::AnalysisConfig;
use crate::context::ServiceContext;
use crate::pipeline::ModuleSummary;
use crate::service::AnalysisService;

/// Where and how a command's result is shown.
#[derive(Debug, Clone, Default)]
pub struct Output {
    /// Print JSON instead of text.
    pub json: bool,
    /// Write the JSON result to this file as well.
    pub path: Option<PathBuf>,
}

impl Output {
    /// Prints `value` as JSON or as `text`, then writes the `--output` file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn emit<T: Serialize>(
        &self,
        ctx: &ServiceContext,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> Result<(), String> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| format!("failed to serialize result: {e}"))?;
        if self.json {
            println!("{json}");
        } else {
            println!("{}", text());
        }
        if let Some(path) = &self.path {
            ctx.fs
                .write(path, &json)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            tracing::info!(path = %path.display(), "result written");
        }
        Ok(())
    }
}

/// Dispatch a parsed command line to its handler.
///
/// When `HORIZON_RECORD` is set to a directory path, `llm` and `fs` port
/// interactions are recorded to per-port cassette files in that directory.
///
/// # Errors
///
/// Returns an error string if configuration is invalid or the command fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let mut config = AnalysisConfig::from_env().map_err(|e| e.to_string())?;
    cli.overrides.apply(&mut config);

    let (ctx, session) = if let Ok(path) = env::var("HORIZON_RECORD") {
        let project = command_root(&cli.command);
        let (ctx, session) =
            ServiceContext::recording_at(PathBuf::from(path), project, &config.base_url)?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(&config.base_url), None)
    };

    let output = Output { json: cli.json, path: cli.output.clone() };
    let result = dispatch_with_context(&cli.command, &ctx, config, &output);

    if let Some(session) = session {
        // recorders are shared with the adapters
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context.
///
/// # Errors
///
/// Returns an error string if the runtime cannot start or the command fails.
pub fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    config: AnalysisConfig,
    output: &Output,
) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start async runtime: {e}"))?;

    let service = AnalysisService::new(ctx, config);
    runtime.block_on(async {
        match command {
            Command::File { path, root } => file::run(&service, ctx, root, path, output).await,
            Command::Folder { path, strategy } => {
                folder::run(&service, ctx, path, *strategy, output).await
            }
            Command::Run { root } => run::run(service, ctx, root, output).await,
            Command::Tree { root } => tree::run(&service, ctx, root, output),
        }
    })
}

fn command_root(command: &Command) -> &Path {
    match command {
        Command::Folder { path, .. } => path,
        Command::File { root, .. } | Command::Run { root } | Command::Tree { root } => root,
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}

/// Text rendering shared by `folder` and `run`.
pub(crate) fn render_summary(summary: &ModuleSummary) -> String {
    let mut out = summary.narrative.clone();
    if let Some(diagram) = &summary.diagram {
        out.push_str("\n\n```mermaid\n");
        out.push_str(diagram);
        out.push_str("\n```");
    }
    if !summary.skipped.is_empty() {
        out.push_str("\n\nSkipped:");
        for file in &summary.skipped {
            let _ = write!(out, "\n  {}: {}", file.path, file.reason);
        }
    }
    if !summary.omitted.is_empty() {
        let _ = write!(out, "\n\nOmitted ({} over the file cap):", summary.omitted.len());
        for path in &summary.omitted {
            let _ = write!(out, "\n  {path}");
        }
    }
    out
}
