// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Mercurial backend

use super::{clone_with, installed_dir, log_clean_failure, CommandRunner, VcsError, VersionControl};
use crate::types::Dependency;
use std::sync::Arc;

/// Drives the `hg` command line
pub struct Mercurial {
    runner: Arc<dyn CommandRunner>,
}

impl Mercurial {
    /// Mercurial backend on top of `runner`
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn hg(&self, dep: &Dependency, args: &[&str]) -> Result<String, VcsError> {
        let dir = installed_dir(dep)?;
        self.runner.run(Some(dir), "hg", args)
    }

    /// Whether `name` is a named branch known to the working copy
    pub fn is_branch(&self, dep: &Dependency, name: &str) -> Result<bool, VcsError> {
        let out = self.hg(dep, &["branches", "--quiet"])?;
        Ok(out.lines().map(str::trim).any(|b| b == name))
    }
}

impl VersionControl for Mercurial {
    fn name(&self) -> &'static str {
        "hg"
    }

    fn clone_repo(&self, dep: &Dependency) -> Result<(), VcsError> {
        clone_with(self.runner.as_ref(), dep, "hg", "clone")
    }

    fn fetch(&self, dep: &Dependency) -> Result<(), VcsError> {
        self.hg(dep, &["pull"]).map(|_| ())
    }

    fn update(&self, _dep: &Dependency) -> Result<(), VcsError> {
        // `hg update <branch>` in checkout already lands on the pulled head.
        Ok(())
    }

    fn try_checkout(&self, dep: &Dependency) -> Result<(), VcsError> {
        self.hg(dep, &["update", &dep.version]).map(|_| ())
    }

    fn clean(&self, dep: &Dependency) {
        log_clean_failure(dep, self.hg(dep, &["revert", "--all", "--no-backup"]));
        log_clean_failure(dep, self.hg(dep, &["purge", "--config", "extensions.purge="]));
    }

    fn last_commit_on_branch(&self, dep: &Dependency, branch: &str) -> Result<String, VcsError> {
        if !self.is_branch(dep, branch)? {
            return Err(VcsError::NotABranch {
                branch: branch.into(),
                repository: dep.repository.clone(),
            });
        }
        Ok(self.hg(dep, &["log", "--rev", branch, "--template", "{node}"])?.trim().to_string())
    }

    fn resolve_to_commit(&self, dep: &Dependency) -> Result<String, VcsError> {
        Ok(self
            .hg(dep, &["log", "--rev", &dep.version, "--template", "{node}"])?
            .trim()
            .to_string())
    }
}
