//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::Command;

fn run_horizon(args: &[&str]) -> std::process::Output {
    run_horizon_with(args, &[])
}

fn run_horizon_with(args: &[&str], env: &[(&str, &str)]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_horizon");
    let mut command = Command::new(bin);
    command
        .args(args)
        .env_remove("HORIZON_RECORD")
        .env_remove("HORIZON_API_KEYS")
        .env_remove("MIMO_API_KEY")
        .env("HORIZON_LOG", "error");
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("failed to run horizon binary")
}

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "export {};").unwrap();
}

#[test]
fn help_lists_subcommands() {
    let output = run_horizon(&["--help"]);
    let text = String::from_utf8_lossy(&output.stderr);
    for command in ["file", "folder", "run", "tree"] {
        assert!(text.contains(command), "help is missing {command}: {text}");
    }
}

#[test]
fn unknown_subcommand_fails() {
    let output = run_horizon(&["frobnicate"]);
    assert!(!output.status.success());
}

#[test]
fn tree_json_lists_project_entries() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "src/a.ts");
    touch(dir.path(), "node_modules/pkg/index.js");

    let output = run_horizon(&["tree", dir.path().to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["type"], "folder");
    let children = tree["children"].as_array().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["name"], "src");
    assert_eq!(children[0]["children"][0]["name"], "a.ts");
}

#[test]
fn tree_text_output_is_indented() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "src/a.ts");

    let output = run_horizon(&["tree", dir.path().to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("  src/\n    a.ts"));
}

#[test]
fn run_on_empty_project_reports_nothing_to_summarize() {
    let dir = tempfile::tempdir().unwrap();
    let out_file = dir.path().join("summary.json");

    let output = run_horizon(&[
        "run",
        dir.path().to_str().unwrap(),
        "--output",
        out_file.to_str().unwrap(),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("No analyzable files found"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out_file).unwrap()).unwrap();
    assert_eq!(written["empty"], true);
}

#[test]
fn run_without_credentials_skips_files_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a.ts");

    let output = run_horizon(&["run", dir.path().to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["empty"], true);
    assert_eq!(summary["skipped"][0]["path"], "a.ts");
}

#[test]
fn file_without_credentials_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "a.ts");

    let output = run_horizon(&["file", dir.path().join("a.ts").to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("credential"), "unexpected stderr: {stderr}");
}

#[test]
fn folder_on_missing_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_horizon(&["folder", dir.path().join("missing").to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("not a directory"));
}

#[test]
fn invalid_numeric_setting_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output =
        run_horizon_with(&["tree", dir.path().to_str().unwrap()], &[("HORIZON_MAX_FILES", "lots")]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("HORIZON_MAX_FILES"));
}
