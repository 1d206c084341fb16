//! The operations the pipeline exposes to its callers.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::config::AnalysisConfig;
use crate::context::ServiceContext;
use crate::error::{AggregateError, AnalysisError};
use crate::pipeline::enumerate::{build_tree, FileNode};
use crate::pipeline::{
    AggregationLimits, AggregationStrategy, AnalysisCache, AnalysisResult, CompletionGateway,
    CredentialPool, FileAnalyzer, FileRecord, ModuleAggregator, ModuleSummary, Orchestrator,
    RetryPolicy,
};

/// One analysis session: a gateway with its credential pool, and the cache.
///
/// All I/O goes through the borrowed [`ServiceContext`], so a session works
/// with live, recording and replaying adapters alike.
pub struct AnalysisService<'a> {
    ctx: &'a ServiceContext,
    config: AnalysisConfig,
    gateway: CompletionGateway<'a>,
    cache: AnalysisCache,
    cancel: CancellationToken,
}

impl<'a> AnalysisService<'a> {
    /// Creates a session from `config`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, config: AnalysisConfig) -> Self {
        let policy = RetryPolicy {
            backoff: config.backoff,
            attempts_per_credential: config.attempts_per_credential,
        };
        let gateway = CompletionGateway::new(
            ctx.llm.as_ref(),
            CredentialPool::new(config.api_keys.clone()),
            policy,
        )
        .with_model(config.model.clone(), config.temperature);
        let cache = AnalysisCache::new(config.cache_capacity);

        Self { ctx, config, gateway, cache, cancel: CancellationToken::new() }
    }

    /// Honors `cancel` at each per-file boundary of [`Self::run_analysis`].
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The session's analysis cache.
    #[must_use]
    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Analyzes one file's `content`, identified by its absolute `path`.
    ///
    /// The file is named and classified relative to its own folder; use
    /// [`Self::analyze_file_in`] to classify it the way `run` does.
    ///
    /// # Errors
    ///
    /// See [`FileAnalyzer::analyze`].
    pub async fn analyze_file(
        &self,
        content: &str,
        path: &Path,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_file_in(path.parent().unwrap_or(path), content, path).await
    }

    /// Analyzes `content` as the file at `path` inside the project `root`.
    ///
    /// # Errors
    ///
    /// See [`FileAnalyzer::analyze`].
    pub async fn analyze_file_in(
        &self,
        root: &Path,
        content: &str,
        path: &Path,
    ) -> Result<AnalysisResult, AnalysisError> {
        let record = FileRecord::new(root, path);
        self.analyzer().analyze(content, &record).await
    }

    /// Reads and analyzes the file at `path` inside the project `root`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Io`] if the file cannot be read, otherwise
    /// see [`FileAnalyzer::analyze`].
    pub async fn analyze_path(
        &self,
        root: &Path,
        path: &Path,
    ) -> Result<AnalysisResult, AnalysisError> {
        let content = self.ctx.fs.read_to_string(path).map_err(|e| AnalysisError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.analyze_file_in(root, &content, path).await
    }

    /// Summarizes the folder at `path`, re-enumerating it.
    ///
    /// # Errors
    ///
    /// See [`ModuleAggregator::summarize_folder`].
    pub async fn analyze_folder(
        &self,
        path: &Path,
        strategy: AggregationStrategy,
    ) -> Result<ModuleSummary, AggregateError> {
        let analyzer = self.analyzer();
        let aggregator = self.aggregator(&analyzer).with_strategy(strategy);
        aggregator.summarize_folder(path).await
    }

    /// Runs the serial whole-project analysis with progress reporting.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run_analysis`].
    pub async fn run_analysis(&self, root: &Path) -> Result<ModuleSummary, AggregateError> {
        let analyzer = self.analyzer();
        let aggregator = self.aggregator(&analyzer);
        let orchestrator = Orchestrator::new(
            self.ctx.fs.as_ref(),
            self.ctx.progress.as_ref(),
            &analyzer,
            &aggregator,
            self.config.inter_call_delay,
        )
        .with_cancellation(self.cancel.clone());
        orchestrator.run_analysis(root).await
    }

    /// The folder tree under `root`.
    #[must_use]
    pub fn folder_tree(&self, root: &Path) -> FileNode {
        build_tree(self.ctx.fs.as_ref(), root)
    }

    fn analyzer(&self) -> FileAnalyzer<'_> {
        FileAnalyzer::new(&self.gateway, &self.cache, self.config.max_chars)
    }

    fn aggregator<'s>(&'s self, analyzer: &'s FileAnalyzer<'s>) -> ModuleAggregator<'s> {
        ModuleAggregator::new(
            self.ctx.fs.as_ref(),
            analyzer,
            &self.gateway,
            AggregationLimits::from(&self.config),
        )
    }
}
