// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Git backend, used for both `git` and `git-clone` dependencies

use super::{clone_with, installed_dir, log_clean_failure, CommandRunner, VcsError, VersionControl};
use crate::types::Dependency;
use std::sync::Arc;

/// Drives the `git` command line
pub struct Git {
    runner: Arc<dyn CommandRunner>,
}

impl Git {
    /// Git backend on top of `runner`
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn git(&self, dep: &Dependency, args: &[&str]) -> Result<String, VcsError> {
        let dir = installed_dir(dep)?;
        self.runner.run(Some(dir), "git", args)
    }

    /// Whether `name` is a branch on the `origin` remote
    pub fn is_branch(&self, dep: &Dependency, name: &str) -> Result<bool, VcsError> {
        let out = self.git(dep, &["branch", "-r"])?;
        let found = remote_branches(&out).any(|b| b == name);
        Ok(found)
    }
}

/// Branch names from `git branch -r` output.
///
/// Handles `origin/HEAD -> origin/master` and branch names containing `/`.
fn remote_branches(out: &str) -> impl Iterator<Item = &str> {
    out.lines()
        .filter_map(|line| line.trim().split(" -> ").next())
        .filter_map(|remote_ref| remote_ref.split_once('/').map(|(_, branch)| branch))
        .filter(|branch| !branch.is_empty() && *branch != "HEAD")
}

impl VersionControl for Git {
    fn name(&self) -> &'static str {
        "git"
    }

    fn clone_repo(&self, dep: &Dependency) -> Result<(), VcsError> {
        clone_with(self.runner.as_ref(), dep, "git", "clone")
    }

    fn fetch(&self, dep: &Dependency) -> Result<(), VcsError> {
        self.git(dep, &["fetch", "origin"]).map(|_| ())
    }

    fn update(&self, dep: &Dependency) -> Result<(), VcsError> {
        if self.is_branch(dep, &dep.version)? {
            self.git(dep, &["pull", "--ff-only", "origin", &dep.version])?;
        }
        Ok(())
    }

    fn try_checkout(&self, dep: &Dependency) -> Result<(), VcsError> {
        self.git(dep, &["checkout", &dep.version]).map(|_| ())
    }

    fn clean(&self, dep: &Dependency) {
        log_clean_failure(dep, self.git(dep, &["reset", "--hard", "HEAD"]));
        log_clean_failure(dep, self.git(dep, &["clean", "-fd"]));
    }

    fn last_commit_on_branch(&self, dep: &Dependency, branch: &str) -> Result<String, VcsError> {
        if !self.is_branch(dep, branch)? {
            return Err(VcsError::NotABranch {
                branch: branch.into(),
                repository: dep.repository.clone(),
            });
        }
        let remote_ref = format!("refs/remotes/origin/{branch}");
        Ok(self.git(dep, &["rev-parse", &remote_ref])?.trim().to_string())
    }

    fn resolve_to_commit(&self, dep: &Dependency) -> Result<String, VcsError> {
        let rev = format!("{}^{{commit}}", dep.version);
        Ok(self.git(dep, &["rev-parse", &rev])?.trim().to_string())
    }
}
