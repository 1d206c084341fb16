//! Replaying adapter for the `FileSystem` port.

use std::path::Path;
use std::sync::Mutex;

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::filesystem::{FileSystem, FsError};

/// Replays recorded filesystem operations from a cassette.
pub struct ReplayingFileSystem {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingFileSystem {
    /// Creates a new replaying filesystem from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

fn boxed_error(value: serde_json::Value) -> FsError {
    match value {
        serde_json::Value::String(msg) => msg.into(),
        other => other.to_string().into(),
    }
}

impl FileSystem for ReplayingFileSystem {
    fn read_to_string(&self, _path: &Path) -> Result<String, FsError> {
        let output = next_output(&self.replayer, "fs", "read_to_string");
        replay_result(output, "fs::read_to_string", boxed_error)
    }

    fn write(&self, _path: &Path, _contents: &str) -> Result<(), FsError> {
        let output = next_output(&self.replayer, "fs", "write");
        if let Some(err) = output.get("err") {
            return Err(boxed_error(err.clone()));
        }
        Ok(())
    }

    fn list_dir(&self, _path: &Path) -> Result<Vec<String>, FsError> {
        let output = next_output(&self.replayer, "fs", "list_dir");
        replay_result(output, "fs::list_dir", boxed_error)
    }

    fn is_dir(&self, _path: &Path) -> bool {
        next_output(&self.replayer, "fs", "is_dir").as_bool().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use serde_json::json;

    fn make_fs(interactions: Vec<Interaction>) -> ReplayingFileSystem {
        ReplayingFileSystem::new(CassetteReplayer::new(&Cassette::from_interactions(
            "fs",
            interactions,
        )))
    }

    #[test]
    fn replaying_fs_read_to_string() {
        let fs = make_fs(vec![Interaction::new(
            "fs",
            "read_to_string",
            json!({"path": "/p/a.ts"}),
            json!({"ok": "export const a = 1;"}),
        )]);
        assert_eq!(fs.read_to_string(Path::new("/p/a.ts")).unwrap(), "export const a = 1;");
    }

    #[test]
    fn replaying_fs_read_to_string_error() {
        let fs = make_fs(vec![Interaction::new(
            "fs",
            "read_to_string",
            json!({"path": "/missing"}),
            json!({"err": "file not found"}),
        )]);
        let err = fs.read_to_string(Path::new("/missing")).unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn replaying_fs_listing_and_stat() {
        let fs = make_fs(vec![
            Interaction::new("fs", "list_dir", json!({"path": "/p"}), json!({"ok": ["src"]})),
            Interaction::new("fs", "is_dir", json!({"path": "/p/src"}), json!(true)),
        ]);
        assert_eq!(fs.list_dir(Path::new("/p")).unwrap(), vec!["src"]);
        assert!(fs.is_dir(Path::new("/p/src")));
    }
}
