//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AnalysisConfig;
use crate::pipeline::AggregationStrategy;

/// Top-level CLI parser for `horizon`.
#[derive(Debug, Parser)]
#[command(name = "horizon", version, about = "Summarize a codebase with an LLM, file by file")]
pub struct Cli {
    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Also write the JSON result to this file.
    #[arg(long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overrides for environment configuration.
    #[command(flatten)]
    pub overrides: Overrides,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a single source file.
    File {
        /// File to analyze.
        path: PathBuf,
        /// Project root the file is named and classified against.
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Summarize one folder as a module.
    Folder {
        /// Folder to summarize.
        path: PathBuf,
        /// How per-file analyses are presented to the summary request.
        #[arg(long, value_enum, default_value_t = AggregationStrategy::Flatten)]
        strategy: AggregationStrategy,
    },
    /// Analyze a whole project serially and summarize it.
    Run {
        /// Project root.
        #[arg(default_value = ".")]
        root: PathBuf,
    },
    /// Print the folder tree of a project.
    Tree {
        /// Project root.
        #[arg(default_value = ".")]
        root: PathBuf,
    },
}

/// Flags that take precedence over `HORIZON_*` variables.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Model identifier.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Maximum files per folder summary.
    #[arg(long, global = true, value_name = "N")]
    pub max_files: Option<usize>,

    /// Per-file character budget.
    #[arg(long, global = true, value_name = "N")]
    pub max_chars: Option<usize>,

    /// Pause between files in `run`, in milliseconds.
    #[arg(long, global = true, value_name = "MS")]
    pub delay_ms: Option<u64>,
}

impl Overrides {
    /// Applies the flags that were given to `config`.
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(model) = &self.model {
            config.model.clone_from(model);
        }
        if let Some(n) = self.max_files {
            config.max_files = n;
        }
        if let Some(n) = self.max_chars {
            config.max_chars = n;
        }
        if let Some(ms) = self.delay_ms {
            config.inter_call_delay = std::time::Duration::from_millis(ms);
        }
    }
}
