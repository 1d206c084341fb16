//! Codebase analysis pipeline: enumerate, map each file, reduce per folder.
//!
//! Data flows strictly downward:
//!
//! ```text
//! enumerate ─▶ analyze (gateway + cache) ─▶ aggregate (gateway) ─▶ caller
//! ```

pub mod aggregate;
pub mod analyze;
pub mod cache;
pub mod enumerate;
pub mod gateway;
pub mod orchestrator;

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use aggregate::{AggregationLimits, AggregationStrategy, ModuleAggregator};
pub use analyze::FileAnalyzer;
pub use cache::AnalysisCache;
pub use gateway::{CompletionGateway, CredentialPool, RetryPolicy};
pub use orchestrator::Orchestrator;

/// Coarse role of a file, used only as prompt context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileCategory {
    /// Application entry / main process code.
    Main,
    /// UI rendering code.
    Renderer,
    /// Bridge scripts loaded ahead of the renderer.
    Preload,
    /// Build, tooling and configuration files.
    Config,
    /// Everything else.
    Logic,
}

impl FileCategory {
    /// Classifies by lower-cased path substrings; first match wins.
    #[must_use]
    pub fn classify(relative_path: &str) -> Self {
        let p = relative_path.to_lowercase();
        if p.contains("main") {
            Self::Main
        } else if p.contains("renderer") {
            Self::Renderer
        } else if p.contains("preload") {
            Self::Preload
        } else if p.contains("node") || p.contains("config") {
            Self::Config
        } else {
            Self::Logic
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Main => "Main Process",
            Self::Renderer => "Renderer Process",
            Self::Preload => "Preload Script",
            Self::Config => "Config/System",
            Self::Logic => "Logic Module",
        })
    }
}

/// Identity of one analyzable file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path; the cache key.
    pub path: PathBuf,
    /// Path relative to the analysis root, `/`-separated.
    pub relative_path: String,
    /// Prompt-context category.
    pub category: FileCategory,
}

impl FileRecord {
    /// Builds a record for `path` relative to `root`.
    ///
    /// Paths outside `root` keep their full form as the relative path.
    #[must_use]
    pub fn new(root: &Path, path: &Path) -> Self {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative_path = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        let relative_path = if relative_path.is_empty() {
            path.file_name().map_or_else(String::new, |n| n.to_string_lossy().into_owned())
        } else {
            relative_path
        };
        let category = FileCategory::classify(&relative_path);
        Self { path: path.to_path_buf(), relative_path, category }
    }
}

/// One named item a file declares.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Symbol {
    /// Identifier.
    pub name: String,
    /// Function, class, constant, ...
    #[serde(default)]
    pub kind: String,
    /// One-line role description.
    #[serde(default)]
    pub description: String,
}

/// Structured per-file analysis returned by the map stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// What the file is for.
    pub overview: String,
    /// Notable implementation details.
    #[serde(default, alias = "technical_depth", skip_serializing_if = "Option::is_none")]
    pub technical_depth: Option<String>,
    /// What the file exposes to the rest of the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<String>,
    /// Declared items in source order.
    #[serde(default)]
    pub symbols: Vec<Symbol>,
}

impl AnalysisResult {
    /// First non-empty line of the overview.
    #[must_use]
    pub fn headline(&self) -> &str {
        self.overview.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
    }
}

/// A file left out of an aggregation context, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedFile {
    /// Path relative to the aggregation root.
    pub path: String,
    /// Human-readable cause.
    pub reason: String,
}

/// Project- or folder-level narrative produced by the reduce stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleSummary {
    /// Responsibilities and collaboration of the module's parts.
    pub narrative: String,
    /// Directed-graph description (Mermaid `graph TD` notation).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram: Option<String>,
    /// `true` when no usable per-file analysis reached the reduce stage.
    #[serde(default)]
    pub empty: bool,
    /// Files excluded from the context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    /// Files beyond the per-aggregation cap, in enumeration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<String>,
}

impl ModuleSummary {
    /// The explicit empty-result summary for a starved reduce step.
    #[must_use]
    pub fn starved(folder: &Path, skipped: Vec<SkippedFile>, omitted: Vec<String>) -> Self {
        let narrative = if skipped.is_empty() {
            format!("No analyzable files found under {}.", folder.display())
        } else {
            format!(
                "No file under {} could be analyzed ({} skipped); nothing to summarize.",
                folder.display(),
                skipped.len()
            )
        };
        Self { narrative, diagram: None, empty: true, skipped, omitted }
    }
}
