// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scriptable command runner for tests and benchmarks
//!
//! [`MockRunner`] records every command instead of spawning it. Clone
//! commands create the destination directory (optionally dropping a fixture
//! `deps.json` into it), so the installer sees a working copy appear exactly
//! as it would with the real tools.

use super::{command_line, CommandRunner, VcsError};
use crate::manifest::MANIFEST_FILE;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One command seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// Working directory the command was run in
    pub dir: Option<PathBuf>,
    /// Full command line
    pub line: String,
}

#[derive(Default)]
struct MockState {
    calls: Vec<RecordedCommand>,
    failures: Vec<(String, usize)>,
    responses: Vec<(String, String)>,
    manifests: HashMap<String, String>,
}

/// Command runner that records instead of executing
#[derive(Default)]
pub struct MockRunner {
    state: Mutex<MockState>,
}

impl MockRunner {
    /// A runner where every command succeeds with empty output
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next `times` commands whose line starts with `prefix`
    #[must_use]
    pub fn failing(self, prefix: &str, times: usize) -> Self {
        self.lock().failures.push((prefix.into(), times));
        self
    }

    /// Answer commands whose line starts with `prefix` with `stdout`
    #[must_use]
    pub fn responding(self, prefix: &str, stdout: &str) -> Self {
        self.lock().responses.push((prefix.into(), stdout.into()));
        self
    }

    /// Write `manifest` as `deps.json` into the working copy cloned from `url`
    #[must_use]
    pub fn with_manifest(self, url: &str, manifest: &str) -> Self {
        self.lock().manifests.insert(url.into(), manifest.into());
        self
    }

    /// Every command run so far
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCommand> {
        self.lock().calls.clone()
    }

    /// Command lines run so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lock().calls.iter().map(|c| c.line.clone()).collect()
    }

    /// How many commands started with `prefix`
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.line.starts_with(prefix)).count()
    }

    /// Forget recorded commands, keeping scripted behavior
    pub fn clear(&self) {
        self.lock().calls.clear();
    }
}

fn is_clone(program: &str, args: &[&str]) -> bool {
    matches!(
        (program, args.first().copied()),
        ("git" | "hg", Some("clone")) | ("bzr", Some("branch"))
    )
}

impl CommandRunner for MockRunner {
    fn run(&self, dir: Option<&Path>, program: &str, args: &[&str]) -> Result<String, VcsError> {
        let line = command_line(program, args);
        let mut state = self.lock();
        state.calls.push(RecordedCommand {
            dir: dir.map(Path::to_path_buf),
            line: line.clone(),
        });

        if let Some(failure) = state
            .failures
            .iter_mut()
            .find(|(prefix, remaining)| *remaining > 0 && line.starts_with(prefix.as_str()))
        {
            failure.1 -= 1;
            return Err(VcsError::CommandFailed {
                command: line,
                status: Some(1),
                output: "scripted failure".into(),
            });
        }

        if is_clone(program, args) && args.len() == 3 {
            let dest = PathBuf::from(args[2]);
            fs::create_dir_all(&dest).map_err(|source| VcsError::Io {
                path: dest.clone(),
                source,
            })?;
            if let Some(manifest) = state.manifests.get(args[1]) {
                let path = dest.join(MANIFEST_FILE);
                fs::write(&path, manifest).map_err(|source| VcsError::Io { path, source })?;
            }
        }

        Ok(state
            .responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, stdout)| stdout.clone())
            .unwrap_or_default())
    }
}
