//! Service context bundling all port trait objects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::llm::LiveLlmClient;
use crate::adapters::live::progress::{SilentProgress, StderrProgress};
use crate::adapters::recording::{RecordingFileSystem, RecordingLlmClient};
use crate::adapters::replaying::{ReplayingFileSystem, ReplayingLlmClient};
use crate::cassette::config::CassetteConfig;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::ports::filesystem::FileSystem;
use crate::ports::llm::LlmClient;
use crate::ports::progress::ProgressSink;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, replaying, recording).
pub struct ServiceContext {
    /// Filesystem for enumeration and file reads.
    pub fs: Box<dyn FileSystem>,
    /// LLM client for chat completions.
    pub llm: Box<dyn LlmClient>,
    /// Progress display for serial runs.
    pub progress: Box<dyn ProgressSink>,
}

impl ServiceContext {
    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn new(
        fs: Box<dyn FileSystem>,
        llm: Box<dyn LlmClient>,
        progress: Box<dyn ProgressSink>,
    ) -> Self {
        Self { fs, llm, progress }
    }

    /// Creates a live context talking to the completion API at `base_url`.
    #[must_use]
    pub fn live(base_url: &str) -> Self {
        Self {
            fs: Box::new(LiveFileSystem),
            llm: Box::new(LiveLlmClient::new(base_url)),
            progress: Box::new(StderrProgress),
        }
    }

    /// Creates a live context whose `llm` and `fs` traffic is recorded into a
    /// new session directory under `base`.
    ///
    /// Drop the context before calling [`RecordingSession::finish`].
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be created.
    pub fn recording_at(
        base: PathBuf,
        project: &Path,
        base_url: &str,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(&base, project)?;
        let ctx = Self {
            fs: Box::new(RecordingFileSystem::new(
                Box::new(LiveFileSystem),
                Arc::clone(&session.fs),
            )),
            llm: Box::new(RecordingLlmClient::new(
                Box::new(LiveLlmClient::new(base_url)),
                Arc::clone(&session.llm),
            )),
            progress: Box::new(StderrProgress),
        };
        Ok((ctx, session))
    }

    /// Creates a replaying context from a monolithic cassette file.
    ///
    /// Both ports are served by the same cassette, each with its own cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;

        Ok(Self {
            fs: Box::new(ReplayingFileSystem::new(CassetteReplayer::new(&cassette))),
            llm: Box::new(ReplayingLlmClient::new(CassetteReplayer::new(&cassette))),
            progress: Box::new(SilentProgress),
        })
    }

    /// Creates a replaying context from per-port cassette files.
    ///
    /// Ports without a configured cassette use the live adapter, so a
    /// recorded `llm` cassette can be replayed against a real project tree.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn replaying_from(config: &CassetteConfig, base_url: &str) -> Result<Self, String> {
        let replayers = config.load_all()?;

        Ok(Self {
            fs: match replayers.fs {
                Some(r) => Box::new(ReplayingFileSystem::new(r)),
                None => Box::new(LiveFileSystem),
            },
            llm: match replayers.llm {
                Some(r) => Box::new(ReplayingLlmClient::new(r)),
                None => Box::new(LiveLlmClient::new(base_url)),
            },
            progress: Box::new(SilentProgress),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Interaction;
    use crate::ports::{ChatMessage, CompletionRequest};
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let yaml = serde_yaml::to_string(&Cassette::from_interactions("test", interactions)).unwrap();
        std::fs::write(path, yaml).unwrap();
    }

    #[tokio::test]
    async fn replaying_context_from_monolithic_cassette() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.cassette.yaml");
        write_cassette(
            &path,
            vec![
                Interaction::new("fs", "list_dir", json!({"path": "/p"}), json!({"ok": ["a.ts"]})),
                Interaction::new("llm", "complete", json!({}), json!({"ok": {"text": "hi"}})),
            ],
        );

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert_eq!(ctx.fs.list_dir(Path::new("/p")).unwrap(), vec!["a.ts"]);

        let request = CompletionRequest {
            model: "m".into(),
            messages: vec![ChatMessage::user("x")],
            temperature: 0.1,
            credential: String::new(),
        };
        assert_eq!(ctx.llm.complete(&request).await.unwrap().text, "hi");
    }

    #[test]
    fn replaying_from_falls_back_to_live_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let llm_path = dir.path().join("llm.cassette.yaml");
        write_cassette(&llm_path, vec![]);
        std::fs::write(dir.path().join("real.ts"), "x").unwrap();

        let config = CassetteConfig { llm: Some(llm_path), fs: None };
        let ctx = ServiceContext::replaying_from(&config, "http://localhost:1").unwrap();
        let listing = ctx.fs.list_dir(dir.path()).unwrap();
        assert!(listing.contains(&"real.ts".to_string()));
    }

    #[test]
    fn missing_cassette_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceContext::replaying(&dir.path().join("nope.yaml")).err().unwrap();
        assert!(err.contains("Failed to read cassette file"));
    }

    #[test]
    fn recording_context_writes_session_on_finish() {
        let base = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        std::fs::write(project.path().join("a.ts"), "x").unwrap();

        let (ctx, session) = ServiceContext::recording_at(
            base.path().to_path_buf(),
            project.path(),
            "http://localhost:1",
        )
        .unwrap();
        let _ = ctx.fs.list_dir(project.path()).unwrap();
        drop(ctx);

        let out = session.finish().unwrap();
        let fs_yaml = std::fs::read_to_string(out.join("fs.cassette.yaml")).unwrap();
        assert!(fs_yaml.contains("list_dir"));
        assert!(fs_yaml.contains("a.ts"));
    }
}
