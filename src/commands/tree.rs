//! `horizon tree` command.

use std::path::Path;

use crate::context::ServiceContext;
use crate::pipeline::enumerate::{FileNode, NodeKind};
use crate::service::AnalysisService;

use super::Output;

/// Execute the `tree` command: print the project folder tree.
///
/// # Errors
///
/// Returns an error string if `root` is not a directory or the output
/// file cannot be written.
pub fn run(
    service: &AnalysisService<'_>,
    ctx: &ServiceContext,
    root: &Path,
    output: &Output,
) -> Result<(), String> {
    if !ctx.fs.is_dir(root) {
        return Err(format!("not a directory: {}", root.display()));
    }
    let tree = service.folder_tree(root);
    output.emit(ctx, &tree, || {
        let mut out = String::new();
        render(&tree, 0, &mut out);
        out.trim_end().to_string()
    })
}

fn render(node: &FileNode, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&node.name);
    if node.kind == NodeKind::Folder {
        out.push('/');
    }
    out.push('\n');
    for child in &node.children {
        render(child, depth + 1, out);
    }
}
