//! Reduce stage: fold per-file analyses into a module narrative.
//!
//! A folder summary re-enumerates the folder from its path, caps the file
//! list, runs the map stage concurrently (reusing cached analyses), and
//! issues exactly one reduce request. Files that could not be analyzed are
//! reported in the summary instead of failing it; only an empty result set
//! short-circuits, and then without any upstream call.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use futures::future::join_all;
use serde::Deserialize;

use super::analyze::{strip_code_fences, truncate_chars, FileAnalyzer};
use super::enumerate::enumerate;
use super::gateway::CompletionGateway;
use super::{AnalysisResult, FileRecord, ModuleSummary, SkippedFile};
use crate::config::AnalysisConfig;
use crate::error::AggregateError;
use crate::ports::{ChatMessage, FileSystem};

const REDUCE_PROMPT: &str = "\
You are a software architect. From the per-file analyses provided, describe the responsibilities \
of each part of the project and how the parts collaborate. Respond with a single JSON object and \
nothing else (no Markdown, no code fences):
{
  \"narrative\": \"a detailed description of responsibilities and collaboration\",
  \"diagram\": \"graph TD\\nsubgraph Module\\n...\\nend\"
}
The diagram uses Mermaid flowchart notation: one node per component, directed edges for calls or data flow.";

/// How per-file analyses are presented to the reduce request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AggregationStrategy {
    /// One entry per file with overview, exports and technical depth.
    #[default]
    Flatten,
    /// A folders-first tree of relative paths annotated with one-line overviews.
    Structure,
}

/// Bounds applied to a single aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationLimits {
    /// Files analyzed per folder; the rest are omitted.
    pub max_files: usize,
    /// Files larger than this many bytes are skipped.
    pub max_file_bytes: usize,
    /// Character cap on the reduce context document.
    pub max_context_chars: usize,
}

impl Default for AggregationLimits {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for AggregationLimits {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            max_files: config.max_files,
            max_file_bytes: config.max_file_bytes,
            max_context_chars: config.max_context_chars,
        }
    }
}

/// Produces [`ModuleSummary`] values for folders or precomputed result sets.
pub struct ModuleAggregator<'a> {
    fs: &'a dyn FileSystem,
    analyzer: &'a FileAnalyzer<'a>,
    gateway: &'a CompletionGateway<'a>,
    limits: AggregationLimits,
    strategy: AggregationStrategy,
}

impl<'a> ModuleAggregator<'a> {
    /// Creates an aggregator using the flatten strategy.
    pub fn new(
        fs: &'a dyn FileSystem,
        analyzer: &'a FileAnalyzer<'a>,
        gateway: &'a CompletionGateway<'a>,
        limits: AggregationLimits,
    ) -> Self {
        Self { fs, analyzer, gateway, limits, strategy: AggregationStrategy::default() }
    }

    /// Selects how analyses are rendered into the reduce context.
    #[must_use]
    pub fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Summarizes everything analyzable under `folder`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Gateway`] only if the reduce request itself
    /// exhausts its retry budget.
    pub async fn summarize_folder(&self, folder: &Path) -> Result<ModuleSummary, AggregateError> {
        let mut files = enumerate(self.fs, folder);
        let omitted: Vec<String> = if files.len() > self.limits.max_files {
            files
                .split_off(self.limits.max_files)
                .iter()
                .map(|path| FileRecord::new(folder, path).relative_path)
                .collect()
        } else {
            Vec::new()
        };
        if !omitted.is_empty() {
            tracing::warn!(
                folder = %folder.display(),
                analyzed = files.len(),
                omitted = omitted.len(),
                "file cap reached, excluding remaining files from aggregation"
            );
        }

        let mut skipped = Vec::new();
        let mut inputs = Vec::with_capacity(files.len());
        for path in &files {
            let record = FileRecord::new(folder, path);
            match self.fs.read_to_string(path) {
                Err(e) => {
                    tracing::warn!(file = %record.relative_path, error = %e, "unreadable file");
                    skipped.push(SkippedFile {
                        path: record.relative_path,
                        reason: format!("unreadable: {e}"),
                    });
                }
                Ok(content) if content.len() > self.limits.max_file_bytes => {
                    skipped.push(SkippedFile {
                        reason: format!(
                            "{} bytes exceeds the {}-byte ceiling",
                            content.len(),
                            self.limits.max_file_bytes
                        ),
                        path: record.relative_path,
                    });
                }
                Ok(content) => inputs.push((record, content)),
            }
        }

        let outcomes = join_all(inputs.iter().map(|(record, content)| async move {
            (record, self.analyzer.analyze(content, record).await)
        }))
        .await;

        let mut analyses = Vec::with_capacity(outcomes.len());
        for (record, outcome) in outcomes {
            match outcome {
                Ok(result) => analyses.push((record.clone(), result)),
                Err(e) => {
                    tracing::warn!(file = %record.relative_path, error = %e, "analysis failed");
                    skipped.push(SkippedFile {
                        path: record.relative_path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.aggregate(folder, &analyses, skipped, omitted).await
    }

    /// Reduces already-computed analyses into one summary.
    ///
    /// With zero analyses this returns [`ModuleSummary::starved`] and makes
    /// no upstream call.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Gateway`] if the reduce request fails.
    pub async fn aggregate(
        &self,
        folder: &Path,
        analyses: &[(FileRecord, AnalysisResult)],
        skipped: Vec<SkippedFile>,
        omitted: Vec<String>,
    ) -> Result<ModuleSummary, AggregateError> {
        if analyses.is_empty() {
            tracing::warn!(folder = %folder.display(), "no usable analyses, skipping reduce request");
            return Ok(ModuleSummary::starved(folder, skipped, omitted));
        }

        let context = match self.strategy {
            AggregationStrategy::Flatten => render_entries(analyses),
            AggregationStrategy::Structure => render_structure(analyses),
        };
        let context = fit_context(folder, &context, self.limits.max_context_chars);

        tracing::info!(
            folder = %folder.display(),
            files = analyses.len(),
            skipped = skipped.len(),
            "requesting module summary"
        );
        let raw = self
            .gateway
            .complete(vec![
                ChatMessage::system(REDUCE_PROMPT),
                ChatMessage::user(format!("Module: {}\nData:\n{context}", folder.display())),
            ])
            .await?;

        let (narrative, diagram) = parse_summary(&raw);
        Ok(ModuleSummary { narrative, diagram, empty: false, skipped, omitted })
    }
}

/// Caps the reduce context at `max_chars`, warning when analyses are cut off.
fn fit_context<'c>(folder: &Path, context: &'c str, max_chars: usize) -> &'c str {
    let fitted = truncate_chars(context, max_chars);
    if fitted.len() < context.len() {
        tracing::warn!(
            folder = %folder.display(),
            max_chars,
            dropped_chars = context[fitted.len()..].chars().count(),
            "summary context truncated, later analyses are cut off"
        );
    }
    fitted
}

/// One block per file: name, one-line overview, exports, technical depth.
fn render_entries(analyses: &[(FileRecord, AnalysisResult)]) -> String {
    let mut doc = String::new();
    for (record, result) in analyses {
        let _ = writeln!(doc, "## {} ({})", record.relative_path, record.category);
        let _ = writeln!(doc, "Overview: {}", result.headline());
        if let Some(exports) = &result.exports {
            let _ = writeln!(doc, "Exports: {exports}");
        }
        if let Some(depth) = &result.technical_depth {
            let _ = writeln!(doc, "Technical depth: {depth}");
        }
        doc.push('\n');
    }
    doc
}

#[derive(Default)]
struct DirNode<'r> {
    dirs: BTreeMap<&'r str, DirNode<'r>>,
    files: BTreeMap<&'r str, &'r str>,
}

/// Folders before files, alphabetical within each level.
fn render_structure(analyses: &[(FileRecord, AnalysisResult)]) -> String {
    let mut root = DirNode::default();
    for (record, result) in analyses {
        let mut parts: Vec<&str> = record.relative_path.split('/').collect();
        let Some(file) = parts.pop() else { continue };
        let mut node = &mut root;
        for dir in parts {
            node = node.dirs.entry(dir).or_default();
        }
        node.files.insert(file, result.headline());
    }

    let mut out = String::new();
    write_tree(&root, 0, &mut out);
    out
}

fn write_tree(node: &DirNode<'_>, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for (name, child) in &node.dirs {
        let _ = writeln!(out, "{indent}{name}/");
        write_tree(child, depth + 1, out);
    }
    for (name, headline) in &node.files {
        let _ = writeln!(out, "{indent}{name}: {headline}");
    }
}

#[derive(Deserialize)]
struct ReduceReply {
    #[serde(alias = "story")]
    narrative: String,
    #[serde(default, alias = "mermaid")]
    diagram: Option<String>,
}

/// Reads a `{narrative, diagram}` reply; anything else is a plain narrative.
fn parse_summary(raw: &str) -> (String, Option<String>) {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<ReduceReply>(cleaned) {
        Ok(reply) => {
            let diagram = reply.diagram.filter(|d| !d.trim().is_empty());
            (reply.narrative, diagram)
        }
        Err(e) => {
            tracing::debug!(error = %e, "reduce reply is not structured, using it as narrative");
            (cleaned.to_string(), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::pipeline::cache::AnalysisCache;
    use crate::pipeline::gateway::{CredentialPool, RetryPolicy};
    use crate::pipeline::FileCategory;
    use crate::ports::{CompletionRequest, CompletionResponse, FsError, LlmClient, LlmFuture};

    fn entry(path: &str, overview: &str) -> (FileRecord, AnalysisResult) {
        (
            FileRecord {
                path: PathBuf::from(format!("/p/{path}")),
                relative_path: path.into(),
                category: FileCategory::classify(path),
            },
            AnalysisResult {
                overview: overview.into(),
                technical_depth: Some("depth".into()),
                exports: None,
                symbols: vec![],
            },
        )
    }

    #[test]
    fn structure_lists_folders_before_files_alphabetically() {
        let analyses = vec![
            entry("z.ts", "Zed."),
            entry("src/b.ts", "Bee.\nsecond line"),
            entry("src/a/x.ts", "Ex."),
            entry("a.ts", "Ay."),
        ];
        let tree = render_structure(&analyses);
        assert_eq!(tree, "src/\n  a/\n    x.ts: Ex.\n  b.ts: Bee.\na.ts: Ay.\nz.ts: Zed.\n");
    }

    #[test]
    fn entries_include_overview_and_depth() {
        let doc = render_entries(&[entry("src/main.ts", "Entry point.")]);
        assert!(doc.contains("## src/main.ts (Main Process)"));
        assert!(doc.contains("Overview: Entry point."));
        assert!(doc.contains("Technical depth: depth"));
        assert!(!doc.contains("Exports:"));
    }

    #[test]
    fn structured_reply_yields_narrative_and_diagram() {
        let (narrative, diagram) =
            parse_summary("```json\n{\"narrative\":\"N\",\"diagram\":\"graph TD\\nA-->B\"}\n```");
        assert_eq!(narrative, "N");
        assert_eq!(diagram.as_deref(), Some("graph TD\nA-->B"));
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let (narrative, diagram) = parse_summary(r#"{"story":"S","mermaid":"graph TD"}"#);
        assert_eq!(narrative, "S");
        assert_eq!(diagram.as_deref(), Some("graph TD"));
    }

    #[test]
    fn free_text_reply_is_the_narrative() {
        let (narrative, diagram) = parse_summary("The app has three layers.");
        assert_eq!(narrative, "The app has three layers.");
        assert!(diagram.is_none());
    }

    #[test]
    fn blank_diagram_is_dropped() {
        let (_, diagram) = parse_summary(r#"{"narrative":"N","diagram":"  "}"#);
        assert!(diagram.is_none());
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    struct BufferWriter(Arc<Mutex<Vec<u8>>>);

    impl<'w> MakeWriter<'w> for SharedBuffer {
        type Writer = BufferWriter;

        fn make_writer(&'w self) -> Self::Writer {
            BufferWriter(Arc::clone(&self.0))
        }
    }

    impl io::Write for BufferWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured_logs(f: impl FnOnce()) -> String {
        let sink = SharedBuffer::default();
        let subscriber =
            tracing_subscriber::fmt().with_writer(sink.clone()).with_ansi(false).finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = sink.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn oversized_context_is_cut_with_a_warning() {
        let logs = captured_logs(|| {
            assert_eq!(fit_context(Path::new("/p"), "abcdefgh", 5), "abcde");
        });
        assert!(logs.contains("WARN"));
        assert!(logs.contains("summary context truncated"));
        assert!(logs.contains("dropped_chars=3"));
    }

    #[test]
    fn context_within_the_cap_is_untouched_and_silent() {
        let logs = captured_logs(|| {
            assert_eq!(fit_context(Path::new("/p"), "abc", 5), "abc");
        });
        assert!(logs.is_empty());
    }

    /// Flat `/proj` folder with one file of each kind of trouble.
    struct Troubled;

    impl FileSystem for Troubled {
        fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
            match path.file_name().and_then(|n| n.to_str()) {
                Some("locked.ts") => Err("permission denied".into()),
                Some("big.ts") => Ok("x".repeat(20)),
                _ => Ok("export {};".into()),
            }
        }

        fn write(&self, _path: &Path, _contents: &str) -> Result<(), FsError> {
            Ok(())
        }

        fn list_dir(&self, _path: &Path) -> Result<Vec<String>, FsError> {
            Ok(vec!["bad.ts".into(), "big.ts".into(), "good.ts".into(), "locked.ts".into()])
        }

        fn is_dir(&self, path: &Path) -> bool {
            path == Path::new("/proj")
        }
    }

    /// Garbles the reply for `bad.ts`; everything else parses.
    #[derive(Default)]
    struct ByFile {
        prompts: Mutex<Vec<String>>,
    }

    impl LlmClient for ByFile {
        fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
            let prompt = request.messages[1].content.clone();
            self.prompts.lock().unwrap().push(prompt.clone());
            let text = if prompt.starts_with("Module:") {
                r#"{"narrative":"One healthy file."}"#
            } else if prompt.contains("File: bad.ts") {
                "no analysis today"
            } else {
                r#"{"overview":"Fine.","symbols":[]}"#
            };
            Box::pin(async move { Ok(CompletionResponse { text: text.into() }) })
        }
    }

    #[tokio::test]
    async fn troubled_files_are_skipped_and_the_rest_summarized() {
        let llm = ByFile::default();
        let gateway =
            CompletionGateway::new(&llm, CredentialPool::new(vec!["k".into()]), RetryPolicy::immediate());
        let cache = AnalysisCache::new(16);
        let analyzer = FileAnalyzer::new(&gateway, &cache, 6_000);
        let limits = AggregationLimits { max_files: 30, max_file_bytes: 10, max_context_chars: 10_000 };
        let aggregator = ModuleAggregator::new(&Troubled, &analyzer, &gateway, limits);

        let summary = aggregator.summarize_folder(Path::new("/proj")).await.unwrap();

        assert!(!summary.empty);
        assert_eq!(summary.narrative, "One healthy file.");
        let reasons: BTreeMap<&str, &str> =
            summary.skipped.iter().map(|s| (s.path.as_str(), s.reason.as_str())).collect();
        assert_eq!(reasons.keys().copied().collect::<Vec<_>>(), vec!["bad.ts", "big.ts", "locked.ts"]);
        assert!(reasons["big.ts"].contains("20 bytes exceeds the 10-byte ceiling"));
        assert!(reasons["locked.ts"].contains("unreadable: permission denied"));
        assert!(reasons["bad.ts"].contains("failed to parse"));

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        let reduce = prompts.iter().find(|p| p.starts_with("Module:")).unwrap();
        assert!(reduce.contains("good.ts"));
        assert!(!reduce.contains("bad.ts"));
    }
}
