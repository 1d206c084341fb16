//! Filesystem port: the only way the pipeline touches project files.

use std::path::Path;

/// Error type shared by every [`FileSystem`] implementation.
pub type FsError = Box<dyn std::error::Error + Send + Sync>;

/// Directory walking, file reads, and result writes.
///
/// Entry names from [`FileSystem::list_dir`] are bare names, not paths; the
/// caller joins them onto the directory.
pub trait FileSystem: Send + Sync {
    /// Reads a whole file as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, FsError>;

    /// Creates or replaces `path` with `contents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn write(&self, path: &Path, contents: &str) -> Result<(), FsError>;

    /// Entry names of a directory, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a readable directory.
    fn list_dir(&self, path: &Path) -> Result<Vec<String>, FsError>;

    /// `true` for directories; missing or unreadable entries are not.
    fn is_dir(&self, path: &Path) -> bool;
}
