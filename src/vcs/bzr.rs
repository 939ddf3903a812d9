// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Bazaar backend
//!
//! A bzr branch has a single linear mainline, spelled `trunk` in manifests.
//! Fetching pulls the mainline forward; checkout pins the tree to a revision.

use super::{clone_with, installed_dir, log_clean_failure, CommandRunner, VcsError, VersionControl};
use crate::types::{Dependency, DependencyKind};
use std::sync::Arc;

/// Drives the `bzr` command line
pub struct Bazaar {
    runner: Arc<dyn CommandRunner>,
}

/// Map a manifest version to a bzr revision spec
fn revision_spec(version: &str) -> &str {
    if version == DependencyKind::Bzr.default_version() {
        "-1"
    } else {
        version
    }
}

/// Revision id from `bzr revision-info` output (`<revno> <revid>`)
fn parse_revision_id(out: &str) -> Option<String> {
    let line = out.lines().next()?;
    let mut fields = line.split_whitespace();
    let revno = fields.next()?;
    Some(fields.next().unwrap_or(revno).to_string())
}

impl Bazaar {
    /// Bazaar backend on top of `runner`
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn bzr(&self, dep: &Dependency, args: &[&str]) -> Result<String, VcsError> {
        let dir = installed_dir(dep)?;
        self.runner.run(Some(dir), "bzr", args)
    }

    fn revision_id(&self, dep: &Dependency, version: &str) -> Result<String, VcsError> {
        let arg = format!("--revision={}", revision_spec(version));
        let out = self.bzr(dep, &["revision-info", &arg])?;
        parse_revision_id(&out).ok_or_else(|| VcsError::CommandFailed {
            command: format!("bzr revision-info {arg}"),
            status: None,
            output: "no revision in output".into(),
        })
    }
}

impl VersionControl for Bazaar {
    fn name(&self) -> &'static str {
        "bzr"
    }

    fn clone_repo(&self, dep: &Dependency) -> Result<(), VcsError> {
        clone_with(self.runner.as_ref(), dep, "bzr", "branch")
    }

    fn fetch(&self, dep: &Dependency) -> Result<(), VcsError> {
        self.bzr(dep, &["pull"]).map(|_| ())
    }

    fn update(&self, _dep: &Dependency) -> Result<(), VcsError> {
        // Linear history: `fetch` already moved the mainline.
        Ok(())
    }

    fn try_checkout(&self, dep: &Dependency) -> Result<(), VcsError> {
        let arg = format!("--revision={}", revision_spec(&dep.version));
        self.bzr(dep, &["update", &arg]).map(|_| ())
    }

    fn clean(&self, dep: &Dependency) {
        log_clean_failure(dep, self.bzr(dep, &["revert", "--no-backup"]));
        log_clean_failure(dep, self.bzr(dep, &["clean-tree", "--unknown", "--force"]));
    }

    fn last_commit_on_branch(&self, dep: &Dependency, branch: &str) -> Result<String, VcsError> {
        if branch != DependencyKind::Bzr.default_version() {
            return Err(VcsError::NotABranch {
                branch: branch.into(),
                repository: dep.repository.clone(),
            });
        }
        self.revision_id(dep, branch)
    }

    fn resolve_to_commit(&self, dep: &Dependency) -> Result<String, VcsError> {
        self.revision_id(dep, &dep.version)
    }
}
