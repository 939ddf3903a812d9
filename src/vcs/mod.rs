// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Version-control backends
//!
//! Each supported kind implements [`VersionControl`]. Backends know nothing
//! about the dependency graph: they run commands against one dependency's
//! install directory, which every operation receives explicitly. The
//! process-wide current directory is never changed.

mod bzr;
mod git;
mod hg;
pub mod mock;
mod runner;

pub use bzr::Bazaar;
pub use git::Git;
pub use hg::Mercurial;
pub use runner::{command_line, CommandRunner, SystemRunner};

use crate::types::{Dependency, DependencyKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from version-control operations
#[derive(Debug, Error)]
pub enum VcsError {
    /// The program could not be started at all
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully
    #[error("$ {command} failed{}", failure_detail(.status, .output))]
    CommandFailed {
        /// Command line
        command: String,
        /// Exit code, if the process exited normally
        status: Option<i32>,
        /// Captured stderr and stdout
        output: String,
    },

    /// The requested name is not a live remote branch
    #[error("'{branch}' is not a valid branch of {repository}")]
    NotABranch {
        /// Requested branch
        branch: String,
        /// Repository identity
        repository: String,
    },

    /// The operation needs an installed working copy
    #[error("{repository} is not installed at {}", .path.display())]
    NotInstalled {
        /// Repository identity
        repository: String,
        /// Expected install directory
        path: PathBuf,
    },

    /// Filesystem error while preparing a working copy
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

fn failure_detail(status: &Option<i32>, output: &str) -> String {
    let mut detail = status.map(|c| format!(" (exit {c})")).unwrap_or_default();
    if !output.is_empty() {
        detail.push_str(":\n");
        detail.push_str(output);
    }
    detail
}

/// Capability set every version-control kind provides
pub trait VersionControl: Send + Sync {
    /// Program name, for diagnostics
    fn name(&self) -> &'static str;

    /// Create the working copy unless the install path already exists
    fn clone_repo(&self, dep: &Dependency) -> Result<(), VcsError>;

    /// Update knowledge of the remote without touching the working tree
    fn fetch(&self, dep: &Dependency) -> Result<(), VcsError>;

    /// Advance the working copy when `dep.version` names a trackable branch
    fn update(&self, dep: &Dependency) -> Result<(), VcsError>;

    /// One attempt at moving the working tree to `dep.version`
    fn try_checkout(&self, dep: &Dependency) -> Result<(), VcsError>;

    /// Move the working tree to `dep.version`.
    ///
    /// A failed first attempt is followed by exactly one fetch and exactly
    /// one more attempt, for versions not yet known locally.
    fn checkout(&self, dep: &Dependency) -> Result<(), VcsError> {
        match self.try_checkout(dep) {
            Ok(()) => Ok(()),
            Err(first) => {
                debug!("{}: checkout of {} failed, fetching and retrying: {}", dep.nickname, dep.version, first);
                if let Err(e) = self.fetch(dep) {
                    warn!("{}: fetch before checkout retry failed: {}", dep.nickname, e);
                }
                self.try_checkout(dep)
            }
        }
    }

    /// Discard local modifications and untracked files; failures are only logged
    fn clean(&self, dep: &Dependency);

    /// Newest commit on the remote `branch`
    fn last_commit_on_branch(&self, dep: &Dependency, branch: &str) -> Result<String, VcsError>;

    /// Render `dep.version` to an immutable commit identifier
    fn resolve_to_commit(&self, dep: &Dependency) -> Result<String, VcsError>;
}

/// Install directory of `dep`, which must already exist
pub(crate) fn installed_dir(dep: &Dependency) -> Result<&Path, VcsError> {
    if dep.path.is_dir() {
        Ok(&dep.path)
    } else {
        Err(VcsError::NotInstalled {
            repository: dep.repository.clone(),
            path: dep.path.clone(),
        })
    }
}

/// Run `program subcommand <url> <path>` unless the install path exists
pub(crate) fn clone_with(
    runner: &dyn CommandRunner,
    dep: &Dependency,
    program: &str,
    subcommand: &str,
) -> Result<(), VcsError> {
    if dep.path.exists() {
        debug!("{} already present at {}", dep.repository, dep.path.display());
        return Ok(());
    }
    if let Some(parent) = dep.path.parent() {
        fs::create_dir_all(parent).map_err(|source| VcsError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let url = dep.clone_url();
    let dest = dep.path.to_string_lossy();
    runner.run(None, program, &[subcommand, &url, &dest]).map(|_| ())
}

/// Log a failed best-effort step
pub(crate) fn log_clean_failure(dep: &Dependency, result: Result<String, VcsError>) {
    if let Err(e) = result {
        warn!("{}: clean failed: {}", dep.nickname, e);
    }
}

/// One backend instance per kind, sharing a command runner
pub struct Backends {
    git: Git,
    hg: Mercurial,
    bzr: Bazaar,
}

impl Backends {
    /// Backends driving the given runner
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            git: Git::new(Arc::clone(&runner)),
            hg: Mercurial::new(Arc::clone(&runner)),
            bzr: Bazaar::new(runner),
        }
    }

    /// Backends that spawn real processes
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner))
    }

    /// Backend handling `kind`
    #[must_use]
    pub fn for_kind(&self, kind: DependencyKind) -> &dyn VersionControl {
        match kind {
            DependencyKind::Git | DependencyKind::GitClone => &self.git,
            DependencyKind::Hg => &self.hg,
            DependencyKind::Bzr => &self.bzr,
        }
    }
}
