//! Recording adapter for the `FileSystem` port.

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::json;

use super::{record_interaction, record_result};
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{FileSystem, FsError};

/// Records filesystem interactions while delegating to an inner implementation.
pub struct RecordingFileSystem {
    inner: Box<dyn FileSystem>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingFileSystem {
    /// Creates a new recording filesystem wrapping the given implementation.
    pub fn new(inner: Box<dyn FileSystem>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }

    fn capture<T: Serialize>(&self, method: &str, path: &Path, result: &Result<T, FsError>) {
        let input = json!({ "path": path.display().to_string() });
        record_result(&self.recorder, "fs", method, &input, result);
    }
}

impl FileSystem for RecordingFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, FsError> {
        let result = self.inner.read_to_string(path);
        self.capture("read_to_string", path, &result);
        result
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        let result = self.inner.write(path, contents);
        // size only
        let input = json!({ "path": path.display().to_string(), "bytes": contents.len() });
        record_result(&self.recorder, "fs", "write", &input, &result);
        result
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let result = self.inner.list_dir(path);
        self.capture("list_dir", path, &result);
        result
    }

    fn is_dir(&self, path: &Path) -> bool {
        let is_dir = self.inner.is_dir(path);
        let input = json!({ "path": path.display().to_string() });
        record_interaction(&self.recorder, "fs", "is_dir", &input, &is_dir);
        is_dir
    }
}
