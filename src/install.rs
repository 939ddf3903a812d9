// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Recursive installation of a manifest's dependency graph
//!
//! Every dependency is cloned if missing, optionally cleaned, refreshed
//! when the staleness cache says so, checked out at its requested version,
//! and then searched for a nested manifest to descend into. One
//! [`ConflictTracker`] spans the whole traversal: a repository seen again
//! at the same version is already satisfied, while a second, different
//! version stops the run.

use crate::cache::StalenessCache;
use crate::manifest::{find_upward, Manifest, MANIFEST_FILE};
use crate::types::Dependency;
use crate::ui::Printer;
use crate::vcs::{Backends, VcsError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fatal install errors; everything else is counted as a problem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    /// One repository requested at two versions in a single run
    #[error("duplicate dependency with different versions: {repository} requested at {requested}, already installed at {installed}")]
    Conflict {
        /// Repository identity
        repository: String,
        /// Version requested by the entry being visited
        requested: String,
        /// Version installed earlier in this run
        installed: String,
    },
}

/// Outcome of visiting a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// First time this run; install it
    New,
    /// Already installed at this version this run; skip it
    Satisfied,
}

/// Repository to version installed during the current run
#[derive(Debug, Clone, Default)]
pub struct ConflictTracker {
    installed: BTreeMap<String, String>,
}

impl ConflictTracker {
    /// Empty tracker for a new run
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request for `repository` at `version`
    pub fn visit(&mut self, repository: &str, version: &str) -> Result<Visit, InstallError> {
        match self.installed.get(repository) {
            None => {
                self.installed.insert(repository.into(), version.into());
                Ok(Visit::New)
            }
            Some(installed) if installed == version => Ok(Visit::Satisfied),
            Some(installed) => Err(InstallError::Conflict {
                repository: repository.into(),
                requested: version.into(),
                installed: installed.clone(),
            }),
        }
    }

    /// Version recorded for `repository`, if visited
    #[must_use]
    pub fn installed_version(&self, repository: &str) -> Option<&str> {
        self.installed.get(repository).map(String::as_str)
    }

    /// Number of distinct repositories visited
    #[must_use]
    pub fn len(&self) -> usize {
        self.installed.len()
    }

    /// Whether nothing has been visited
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }
}

/// Per-run install switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOptions {
    /// Discard local changes in each working copy before checkout
    pub clean: bool,
    /// Descend into nested manifests
    pub recursive: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            clean: false,
            recursive: true,
        }
    }
}

/// Drives one install run
pub struct Installer<'a> {
    root: PathBuf,
    backends: &'a Backends,
    cache: &'a mut StalenessCache,
    printer: Printer,
    options: InstallOptions,
}

impl<'a> Installer<'a> {
    /// Installer placing working copies under `root`
    pub fn new(
        root: impl Into<PathBuf>,
        backends: &'a Backends,
        cache: &'a mut StalenessCache,
        printer: Printer,
        options: InstallOptions,
    ) -> Self {
        Self {
            root: root.into(),
            backends,
            cache,
            printer,
            options,
        }
    }

    /// Install root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Install `manifest` and everything it transitively requires.
    ///
    /// Returns the number of recoverable problems, or the conflict that
    /// stopped the run.
    pub fn install(&mut self, manifest: &Manifest) -> Result<usize, InstallError> {
        info!("Installing from {}", manifest.path.display());
        self.printer.heading("Installing:");

        let mut tracker = ConflictTracker::new();
        let problems = self.install_manifest(manifest, &mut tracker, 0)?;

        info!(
            "Installed {} repositories with {} problem(s)",
            tracker.len(),
            problems
        );
        Ok(problems)
    }

    fn install_manifest(
        &mut self,
        manifest: &Manifest,
        tracker: &mut ConflictTracker,
        depth: usize,
    ) -> Result<usize, InstallError> {
        let mut problems = 0;

        for (nickname, record) in &manifest.dependencies {
            let dep = match record.resolve(nickname, &self.root) {
                Ok(dep) => dep,
                Err(e) => {
                    warn!("{} (defined in {})", e, manifest.path.display());
                    self.printer.problem(depth, &format!("Error: {e}"));
                    problems += 1;
                    continue;
                }
            };

            if tracker.visit(&dep.repository, &dep.version)? == Visit::Satisfied {
                debug!("Skipping previously installed dependency: {}", dep.repository);
                continue;
            }

            problems += self.install_dependency(&dep, tracker, depth)?;
        }

        Ok(problems)
    }

    fn install_dependency(
        &mut self,
        dep: &Dependency,
        tracker: &mut ConflictTracker,
        depth: usize,
    ) -> Result<usize, InstallError> {
        let start = Instant::now();
        let stale = self.cache.is_stale(&dep.repository, dep.skip_cache);
        self.printer.dependency(depth, dep, stale);

        let vcs = self.backends.for_kind(dep.kind);
        let mut problems = 0;

        if let Err(e) = vcs.clone_repo(dep) {
            self.report(depth, dep, "clone", &e);
            return Ok(1);
        }
        if !dep.path.is_dir() {
            warn!("{}: {} is missing after clone", dep.nickname, dep.path.display());
            return Ok(1);
        }

        if self.options.clean {
            vcs.clean(dep);
        }

        if stale {
            debug!("{}: repository is stale, fetching", dep.nickname);
            if let Err(e) = vcs.fetch(dep) {
                self.report(depth, dep, "fetch", &e);
                problems += 1;
            }
        }

        if let Err(e) = vcs.checkout(dep) {
            self.report(depth, dep, "checkout", &e);
            problems += 1;
        } else if stale {
            if let Err(e) = vcs.update(dep) {
                self.report(depth, dep, "update", &e);
                problems += 1;
            }
        }

        debug!(
            "{}: time to install {:.3}s",
            dep.nickname,
            start.elapsed().as_secs_f64()
        );

        if self.options.recursive {
            problems += self.descend(dep, tracker, depth)?;
        }
        Ok(problems)
    }

    /// Install the manifest found at or above `dep`'s install directory
    fn descend(
        &mut self,
        dep: &Dependency,
        tracker: &mut ConflictTracker,
        depth: usize,
    ) -> Result<usize, InstallError> {
        let Some(path) = find_upward(&dep.path, MANIFEST_FILE) else {
            return Ok(0);
        };

        match Manifest::load(&path) {
            Ok(nested) => {
                debug!("{}: descending into {}", dep.nickname, path.display());
                self.install_manifest(&nested, tracker, depth + 1)
            }
            Err(e) => {
                warn!("Error reading deps for {}: {}", dep.nickname, e);
                self.printer.problem(depth + 1, &format!("Error: {e}"));
                Ok(1)
            }
        }
    }

    fn report(&self, depth: usize, dep: &Dependency, step: &str, err: &VcsError) {
        warn!("{}: {} failed: {}", dep.nickname, step, err);
        self.printer.problem(depth + 1, &format!("{step} failed: {err}"));
    }
}
