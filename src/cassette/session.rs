//! One recording run: an `llm` and an `fs` cassette in a shared directory.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use super::recorder::CassetteRecorder;

/// Port names recorded by a session, in cassette-file order.
pub const RECORDED_PORTS: [&str; 2] = ["llm", "fs"];

/// Recorders shared with the recording adapters of one run.
///
/// Cassettes land in `<base>/<project>-<timestamp>/<port>.cassette.yaml`.
pub struct RecordingSession {
    /// Recorder for LLM interactions.
    pub llm: Arc<Mutex<CassetteRecorder>>,
    /// Recorder for filesystem interactions.
    pub fs: Arc<Mutex<CassetteRecorder>>,
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Opens a session directory under `base` for the analyzed `project`.
    ///
    /// The project's git commit, when there is one, is stamped on every cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub fn new(base: &Path, project: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let label = project_label(project);
        let output_dir = base.join(format!("{label}-{timestamp}"));

        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }
        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let commit = get_commit_hash(project);
        let recorder = |port: &str| {
            Arc::new(Mutex::new(CassetteRecorder::new(
                output_dir.join(format!("{port}.cassette.yaml")),
                format!("{label}-{timestamp}-{port}"),
                commit.as_str(),
            )))
        };
        let (llm, fs) = (recorder(RECORDED_PORTS[0]), recorder(RECORDED_PORTS[1]));

        tracing::info!(dir = %output_dir.display(), "recording port interactions");
        Ok(Self { llm, fs, output_dir })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes every cassette and returns the session directory.
    ///
    /// Adapters holding recorder references must be dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if a recorder is still shared or a file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        for (port, shared) in RECORDED_PORTS.into_iter().zip([self.llm, self.fs]) {
            let recorder = Arc::try_unwrap(shared)
                .map_err(|_| format!("Recording adapter for {port} still has references"))?
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner);
            recorder.finish().map_err(|e| format!("Failed to write {port} cassette: {e}"))?;
        }
        Ok(self.output_dir)
    }
}

fn project_label(project: &Path) -> String {
    std::fs::canonicalize(project)
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .map_or_else(|| "session".to_string(), |n| n.to_string_lossy().into_owned())
}

/// Commit of the analyzed project, or `"unknown"` outside a git checkout.
fn get_commit_hash(project: &Path) -> String {
    let hash = std::process::Command::new("git")
        .arg("-C")
        .arg(project)
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string());

    hash.unwrap_or_else(|| {
        tracing::warn!(project = %project.display(), "no git commit found, stamping cassettes 'unknown'");
        "unknown".to_string()
    })
}
