//! Map stage: one structured analysis per file.

use super::cache::AnalysisCache;
use super::gateway::CompletionGateway;
use super::{AnalysisResult, FileRecord};
use crate::error::AnalysisError;
use crate::ports::ChatMessage;

const SYSTEM_PROMPT: &str = "\
You are a senior software engineer documenting a codebase. Analyze the given source file and \
respond with a single JSON object and nothing else. Do not wrap it in Markdown or code fences.
The object must have exactly this shape:
{
  \"overview\": \"one or two sentences on the file's role in the project\",
  \"technicalDepth\": \"notable implementation details, patterns and dependencies\",
  \"exports\": \"what the file exposes to the rest of the project\",
  \"symbols\": [{\"name\": \"...\", \"kind\": \"function|class|type|constant|...\", \"description\": \"...\"}]
}";

/// Analyzes single files through the gateway, consulting the cache first.
pub struct FileAnalyzer<'a> {
    gateway: &'a CompletionGateway<'a>,
    cache: &'a AnalysisCache,
    max_chars: usize,
}

impl<'a> FileAnalyzer<'a> {
    /// Creates an analyzer that truncates input to `max_chars` characters.
    pub fn new(gateway: &'a CompletionGateway<'a>, cache: &'a AnalysisCache, max_chars: usize) -> Self {
        Self { gateway, cache, max_chars }
    }

    /// Analyzes `content` as the file described by `record`.
    ///
    /// A cache hit returns the stored analysis without an upstream call.
    /// Successful analyses are cached; failures are not.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Gateway`] when the retry budget is spent and
    /// [`AnalysisError::MalformedResponse`] when the reply is not the expected JSON.
    pub async fn analyze(
        &self,
        content: &str,
        record: &FileRecord,
    ) -> Result<AnalysisResult, AnalysisError> {
        if let Some(hit) = self.cache.get(&record.path) {
            tracing::debug!(file = %record.relative_path, "analysis cache hit");
            return Ok(hit);
        }

        let code = truncate_chars(content, self.max_chars);
        if code.len() < content.len() {
            tracing::debug!(
                file = %record.relative_path,
                max_chars = self.max_chars,
                "truncated file content before analysis"
            );
        }

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Category: {}\nFile: {}\nCode:\n{code}",
                record.category, record.relative_path
            )),
        ];

        let raw = self
            .gateway
            .complete(messages)
            .await
            .map_err(|source| AnalysisError::Gateway { path: record.path.clone(), source })?;

        let result = parse_analysis(&raw).map_err(|reason| AnalysisError::MalformedResponse {
            path: record.path.clone(),
            reason,
        })?;

        self.cache.put(&record.path, result.clone());
        Ok(result)
    }
}

/// Parses a fence-stripped reply into an [`AnalysisResult`].
fn parse_analysis(raw: &str) -> Result<AnalysisResult, String> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| e.to_string())
}

/// Removes a Markdown code fence wrapping the reply, if present.
///
/// Handles an optional language tag (```` ```json ````), surrounding
/// whitespace, and a missing closing fence. Unfenced text is only trimmed.
#[must_use]
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag line
    let body = after_open.split_once('\n').map_or(after_open, |(_, rest)| rest);
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Returns at most the first `max_chars` characters of `s`.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}
