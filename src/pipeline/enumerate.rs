//! Recursive discovery of analyzable source files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ports::FileSystem;

/// Extensions (lower-case, without the dot) considered analyzable.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "json", "py", "java", "go", "rs", "c", "h", "cpp", "hpp", "cs", "kt",
    "swift", "rb", "php", "toml", "yaml", "yml",
];

/// Directory names never descended into. Hidden directories are skipped too.
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", "dist", "out", "build", "target"];

/// Returns `true` if a directory with this name must not be traversed.
#[must_use]
pub fn is_excluded_dir(name: &str) -> bool {
    name.starts_with('.') || EXCLUDED_DIRS.contains(&name)
}

/// Returns `true` if the file name carries an allow-listed extension.
#[must_use]
pub fn is_source_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.iter().any(|c| c.eq_ignore_ascii_case(ext)))
}

/// Lists analyzable files under `root`, depth-first, in directory-entry order.
///
/// Unreadable subtrees are logged and skipped; an unreadable root yields an
/// empty list.
pub fn enumerate(fs: &dyn FileSystem, root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(fs, root, &mut files);
    tracing::debug!(root = %root.display(), count = files.len(), "enumerated source files");
    files
}

fn walk(fs: &dyn FileSystem, dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs.list_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for name in entries {
        let path = dir.join(&name);
        if fs.is_dir(&path) {
            if !is_excluded_dir(&name) {
                walk(fs, &path, files);
            }
        } else if is_source_file(&name) {
            files.push(path);
        }
    }
}

/// Whether a tree node is a file or a folder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A regular file.
    File,
    /// A directory.
    Folder,
}

/// One node of the project folder tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileNode {
    /// Absolute path.
    pub id: PathBuf,
    /// Entry name.
    pub name: String,
    /// File or folder.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Children of a folder, in directory-entry order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

/// Builds the folder tree under `root`, dropping excluded and hidden directories.
///
/// Every file is kept regardless of extension. Unreadable folders appear
/// without children.
pub fn build_tree(fs: &dyn FileSystem, root: &Path) -> FileNode {
    let name = root
        .file_name()
        .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());

    if !fs.is_dir(root) {
        return FileNode { id: root.to_path_buf(), name, kind: NodeKind::File, children: vec![] };
    }

    let children = match fs.list_dir(root) {
        Ok(entries) => entries
            .into_iter()
            .filter(|entry| !is_excluded_dir(entry))
            .map(|entry| build_tree(fs, &root.join(entry)))
            .collect(),
        Err(e) => {
            tracing::warn!(dir = %root.display(), error = %e, "unreadable folder in tree");
            Vec::new()
        }
    };

    FileNode { id: root.to_path_buf(), name, kind: NodeKind::Folder, children }
}
