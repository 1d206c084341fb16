//! Captures one port's interactions and persists them as a YAML cassette.

use std::path::PathBuf;

use chrono::Utc;

use super::format::{Cassette, Interaction};

/// Builds a [`Cassette`] in memory, stamped when recording starts.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    cassette: Cassette,
}

impl CassetteRecorder {
    /// Starts an empty cassette that [`Self::finish`] writes to `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        let cassette = Cassette {
            name: name.into(),
            recorded_at: Utc::now(),
            commit: commit.into(),
            interactions: Vec::new(),
        };
        Self { path: path.into(), cassette }
    }

    /// Appends one interaction; `seq` follows arrival order.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let mut interaction = Interaction::new(port, method, input, output);
        interaction.seq = self.cassette.interactions.len() as u64;
        self.cassette.interactions.push(interaction);
    }

    /// Claims the next `seq` for a call whose output is not known yet.
    ///
    /// Slots keep request order when replies finish out of order; pass the
    /// returned slot to [`Self::fill`] once the output arrives.
    pub fn reserve(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
    ) -> usize {
        let slot = self.cassette.interactions.len();
        self.record(port, method, input, serde_json::Value::Null);
        slot
    }

    /// Sets the output of a slot returned by [`Self::reserve`].
    pub fn fill(&mut self, slot: usize, output: serde_json::Value) {
        match self.cassette.interactions.get_mut(slot) {
            Some(interaction) => interaction.output = output,
            None => tracing::warn!(slot, "fill for an unreserved cassette slot"),
        }
    }

    /// Number of interactions captured so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cassette.interactions.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cassette.interactions.is_empty()
    }

    /// Serializes the cassette to its path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        let yaml = serde_yaml::to_string(&self.cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        tracing::debug!(
            path = %self.path.display(),
            interactions = self.cassette.interactions.len(),
            "cassette written"
        );
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_and_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "test-recording", "deadbeef");
        assert!(recorder.is_empty());
        recorder.record(
            "llm",
            "complete",
            json!({"model": "m"}),
            json!({"ok": {"text": "{}"}}),
        );
        recorder.record("fs", "list_dir", json!({"path": "/p"}), json!({"ok": ["a.ts"]}));
        assert_eq!(recorder.len(), 2);

        let result_path = recorder.finish().expect("finish should succeed");
        assert_eq!(result_path, path);

        let content = std::fs::read_to_string(&path).unwrap();
        let cassette: Cassette = serde_yaml::from_str(&content).unwrap();

        assert_eq!(cassette.name, "test-recording");
        assert_eq!(cassette.commit, "deadbeef");
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].seq, 0);
        assert_eq!(cassette.interactions[1].seq, 1);
        assert_eq!(cassette.interactions[1].port, "fs");
    }

    #[test]
    fn reserved_slots_keep_request_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm.cassette.yaml");
        let mut recorder = CassetteRecorder::new(&path, "t", "c");

        let slow = recorder.reserve("llm", "complete", json!({"file": "a.ts"}));
        let fast = recorder.reserve("llm", "complete", json!({"file": "b.ts"}));
        recorder.fill(fast, json!({"ok": {"text": "about b.ts"}}));
        recorder.fill(slow, json!({"ok": {"text": "about a.ts"}}));

        let content = std::fs::read_to_string(recorder.finish().unwrap()).unwrap();
        let cassette: Cassette = serde_yaml::from_str(&content).unwrap();
        assert_eq!(cassette.interactions[0].input, json!({"file": "a.ts"}));
        assert_eq!(cassette.interactions[0].output["ok"]["text"], "about a.ts");
        assert_eq!(cassette.interactions[1].seq, 1);
        assert_eq!(cassette.interactions[1].output["ok"]["text"], "about b.ts");
    }
}
