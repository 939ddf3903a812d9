// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the depyard CLI commands
//!
//! These stay away from the network: every manifest here is either empty
//! or holds only records the installer rejects before running a VCS.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Run depyard inside `project` with an isolated install root and config dir
fn depyard(project: &Path, root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("depyard").unwrap();
    cmd.current_dir(project)
        .env("DEPYARD_ROOT", root)
        .env("XDG_CONFIG_HOME", root.join("config"))
        .env_remove("DEPYARD_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

fn make_test_dirs() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("project");
    let root = dir.path().join("root");
    fs::create_dir_all(&project).unwrap();
    (dir, project, root)
}

#[test]
fn test_init_creates_empty_manifest() {
    let (_dir, project, root) = make_test_dirs();

    depyard(&project, &root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    assert_eq!(fs::read_to_string(project.join("deps.json")).unwrap(), "{}\n");

    // A second init must not overwrite
    depyard(&project, &root)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_create_is_an_alias_of_init() {
    let (_dir, project, root) = make_test_dirs();
    depyard(&project, &root).arg("create").assert().success();
    assert!(project.join("deps.json").is_file());
}

#[test]
fn test_install_is_the_default_command() {
    let (_dir, project, root) = make_test_dirs();
    fs::write(project.join("deps.json"), "{}\n").unwrap();

    depyard(&project, &root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Installing:"));

    assert!(root.join(".depyard.cache").is_file());
}

#[test]
fn test_skip_cache_leaves_no_cache_file() {
    let (_dir, project, root) = make_test_dirs();
    fs::write(project.join("deps.json"), "{}\n").unwrap();

    depyard(&project, &root).args(["install", "--skip-cache"]).assert().success();
    assert!(!root.join(".depyard.cache").exists());
}

#[test]
fn test_install_without_manifest_fails() {
    let (_dir, project, root) = make_test_dirs();

    depyard(&project, &root)
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load manifest"));
}

#[test]
fn test_invalid_record_exits_nonzero() {
    let (_dir, project, root) = make_test_dirs();
    fs::write(
        project.join("deps.json"),
        r#"{"vendored": {"repo": "https://example.com/v.git", "type": "git-clone"}}"#,
    )
    .unwrap();

    depyard(&project, &root)
        .arg("install")
        .assert()
        .failure()
        .stdout(predicate::str::contains("requires an 'alias'"));
}

#[test]
fn test_path_flag_points_at_manifest() {
    let (_dir, project, root) = make_test_dirs();
    let elsewhere = project.join("nested");
    fs::create_dir_all(&elsewhere).unwrap();
    fs::write(elsewhere.join("deps.json"), "{}\n").unwrap();

    depyard(&project, &root)
        .args(["install", "--path"])
        .arg(elsewhere.join("deps.json"))
        .assert()
        .success();
}

#[test]
fn test_add_rejects_unknown_type() {
    let (_dir, project, root) = make_test_dirs();
    fs::write(project.join("deps.json"), "{}\n").unwrap();

    depyard(&project, &root)
        .args(["add", "lib", "--repo", "example.com/lib", "--type", "svn"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid type 'svn'"));

    assert_eq!(fs::read_to_string(project.join("deps.json")).unwrap(), "{}\n");
}

#[test]
fn test_add_git_clone_requires_alias() {
    let (_dir, project, root) = make_test_dirs();
    fs::write(project.join("deps.json"), "{}\n").unwrap();

    depyard(&project, &root)
        .args(["add", "lib", "--repo", "https://example.com/lib.git", "--type", "git-clone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("alias"));

    assert_eq!(fs::read_to_string(project.join("deps.json")).unwrap(), "{}\n");
}

#[test]
fn test_update_unknown_nickname_fails() {
    let (_dir, project, root) = make_test_dirs();
    fs::write(project.join("deps.json"), "{}\n").unwrap();

    depyard(&project, &root)
        .args(["update", "missing", "master"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'missing' not found"));
}

#[test]
fn test_show_frozen_empty_manifest() {
    let (_dir, project, root) = make_test_dirs();
    fs::write(project.join("deps.json"), "{}\n").unwrap();

    depyard(&project, &root)
        .args(["show-frozen", "--recursive"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("NOTE"));
}

#[test]
fn test_completions() {
    let (_dir, project, root) = make_test_dirs();

    depyard(&project, &root)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("depyard"));
}

#[test]
fn test_explicit_config_file_is_read() {
    let (_dir, project, root) = make_test_dirs();
    fs::write(project.join("deps.json"), "{}\n").unwrap();
    let custom_root = project.join("custom-root");
    let config = project.join("depyard.toml");
    fs::write(&config, format!("root = {:?}\n", custom_root.display().to_string())).unwrap();

    // --root would win over the file, so drop the environment root
    let mut cmd = depyard(&project, &root);
    cmd.env_remove("DEPYARD_ROOT")
        .arg("--config")
        .arg(&config)
        .arg("install")
        .assert()
        .success();

    assert!(custom_root.join(".depyard.cache").is_file());
}
