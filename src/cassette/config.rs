//! Cassette configuration for composable per-port replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Per-port cassette file paths. Ports without a cassette path fall back to
/// the live adapter during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Path to the LLM port cassette file.
    pub llm: Option<PathBuf>,
    /// Path to the filesystem port cassette file.
    pub fs: Option<PathBuf>,
}

/// Per-port replayers, each with its own interaction stream.
pub struct PortReplayers {
    /// Replayer for the LLM port.
    pub llm: Option<CassetteReplayer>,
    /// Replayer for the filesystem port.
    pub fs: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// Config for a directory written by a recording session
    /// (`llm.cassette.yaml`, `fs.cassette.yaml`). Missing files are skipped.
    #[must_use]
    pub fn from_session_dir(dir: &Path) -> Self {
        let existing = |port: &str| {
            let path = dir.join(format!("{port}.cassette.yaml"));
            path.is_file().then_some(path)
        };
        Self { llm: existing("llm"), fs: existing("fs") }
    }

    /// Load a single cassette file and create a replayer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cassette(path: &Path) -> Result<CassetteReplayer, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
        Ok(CassetteReplayer::new(&cassette))
    }

    /// Load all configured per-port cassette files and create replayers.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette file cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        Ok(PortReplayers {
            llm: self.llm.as_deref().map(Self::load_cassette).transpose()?,
            fs: self.fs.as_deref().map(Self::load_cassette).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let cassette = Cassette::from_interactions("test", interactions);
        let yaml = serde_yaml::to_string(&cassette).unwrap();
        std::fs::write(path, yaml).unwrap();
    }

    #[test]
    fn session_dir_picks_up_existing_cassettes() {
        let dir = tempfile::tempdir().unwrap();
        write_cassette(&dir.path().join("llm.cassette.yaml"), vec![]);

        let config = CassetteConfig::from_session_dir(dir.path());
        assert_eq!(config.llm, Some(dir.path().join("llm.cassette.yaml")));
        assert!(config.fs.is_none());
    }

    #[test]
    fn load_per_port_cassettes() {
        let dir = tempfile::tempdir().unwrap();

        let llm_path = dir.path().join("llm.cassette.yaml");
        write_cassette(
            &llm_path,
            vec![Interaction::new(
                "llm",
                "complete",
                json!({}),
                json!({"ok": {"text": "world"}}),
            )],
        );

        let fs_path = dir.path().join("fs.cassette.yaml");
        write_cassette(
            &fs_path,
            vec![Interaction::new("fs", "list_dir", json!({"path": "/a"}), json!({"ok": ["b"]}))],
        );

        let config = CassetteConfig { llm: Some(llm_path), fs: Some(fs_path) };
        let mut replayers = config.load_all().unwrap();

        let llm = replayers.llm.as_mut().unwrap();
        assert_eq!(llm.next_interaction("llm", "complete").output["ok"]["text"], "world");

        let fs = replayers.fs.as_mut().unwrap();
        assert_eq!(fs.next_interaction("fs", "list_dir").output, json!({"ok": ["b"]}));
    }

    #[test]
    fn unreadable_cassette_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = CassetteConfig { llm: Some(dir.path().join("missing.yaml")), fs: None };
        let err = config.load_all().err().unwrap();
        assert!(err.contains("Failed to read cassette file"));
    }
}
