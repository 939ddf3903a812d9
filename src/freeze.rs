// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Resolve installed dependencies to immutable commit identifiers
//!
//! Reads local working copies only; the result reflects the remote only as
//! of the last install.

use crate::manifest::{find_upward, Manifest, MANIFEST_FILE};
use crate::vcs::{Backends, VcsError};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that stop a freeze
#[derive(Debug, Error)]
pub enum FreezeError {
    /// An installed dependency could not be resolved to a commit
    #[error("cannot resolve {nickname} ({repository}) to a commit: {source}")]
    Resolve {
        /// Manifest nickname
        nickname: String,
        /// Repository identity
        repository: String,
        /// Underlying backend error
        source: VcsError,
    },
}

/// A repository pinned to the commit currently checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenEntry {
    /// Repository identity
    pub repository: String,
    /// Commit identifier
    pub commit: String,
}

/// Result of a freeze
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frozen {
    /// Pinned repositories in traversal order
    pub entries: Vec<FrozenEntry>,
    /// Invalid records and unreadable nested manifests that were skipped
    pub problems: usize,
}

impl fmt::Display for Frozen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} {}", entry.repository, entry.commit)?;
        }
        Ok(())
    }
}

/// Pin every dependency of `manifest`, descending into nested manifests when
/// `recursive` is set
pub fn freeze(manifest: &Manifest, backends: &Backends, root: &Path, recursive: bool) -> Result<Frozen, FreezeError> {
    let mut frozen = Frozen::default();
    let mut seen = BTreeSet::new();
    freeze_into(manifest, backends, root, recursive, &mut seen, &mut frozen)?;
    Ok(frozen)
}

fn freeze_into(
    manifest: &Manifest,
    backends: &Backends,
    root: &Path,
    recursive: bool,
    seen: &mut BTreeSet<String>,
    frozen: &mut Frozen,
) -> Result<(), FreezeError> {
    for (nickname, record) in &manifest.dependencies {
        if recursive && seen.contains(record.repo.trim()) {
            continue;
        }

        let dep = match record.resolve(nickname, root) {
            Ok(dep) => dep,
            Err(e) => {
                warn!("{} (defined in {})", e, manifest.path.display());
                frozen.problems += 1;
                continue;
            }
        };

        let commit = backends
            .for_kind(dep.kind)
            .resolve_to_commit(&dep)
            .map_err(|source| FreezeError::Resolve {
                nickname: dep.nickname.clone(),
                repository: dep.repository.clone(),
                source,
            })?;
        debug!("{} resolves to {}", dep.repository, commit);

        frozen.entries.push(FrozenEntry {
            repository: dep.repository.clone(),
            commit,
        });

        if !recursive {
            continue;
        }
        seen.insert(dep.repository.clone());

        if let Some(path) = find_upward(&dep.path, MANIFEST_FILE) {
            match Manifest::load(&path) {
                Ok(nested) => freeze_into(&nested, backends, root, recursive, seen, frozen)?,
                Err(e) => {
                    warn!("Error reading deps for {}: {}", dep.nickname, e);
                    frozen.problems += 1;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DependencyKind, DependencyRecord};
    use crate::vcs::mock::MockRunner;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn make_test_manifest(dir: &Path, deps: &[(&str, DependencyRecord)]) -> Manifest {
        let mut manifest = Manifest::new(dir.join(MANIFEST_FILE));
        for (nickname, record) in deps {
            manifest.insert_new(nickname, record.clone()).unwrap();
        }
        manifest
    }

    #[test]
    fn test_freeze_top_level() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("example.com/a")).unwrap();
        let manifest = make_test_manifest(
            root.path(),
            &[
                ("a", DependencyRecord::new("example.com/a", DependencyKind::Git, "v1")),
                ("bad", DependencyRecord::new("https://example.com/c.git", DependencyKind::GitClone, "")),
            ],
        );
        let runner = Arc::new(MockRunner::new().responding("git rev-parse", "abc\n"));
        let backends = Backends::new(runner.clone());

        let frozen = freeze(&manifest, &backends, root.path(), false).unwrap();
        assert_eq!(frozen.to_string(), "example.com/a abc\n");
        assert_eq!(frozen.problems, 1);
        assert_eq!(runner.lines(), vec!["git rev-parse v1^{commit}"]);
    }

    #[test]
    fn test_freeze_recursive_lists_shared_repository_once() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("example.com/a");
        let b = root.path().join("example.com/b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();

        // a and b both depend on each other
        make_test_manifest(&a, &[("b", DependencyRecord::new("example.com/b", DependencyKind::Git, "v1"))])
            .save()
            .unwrap();
        make_test_manifest(&b, &[("a", DependencyRecord::new("example.com/a", DependencyKind::Git, "v1"))])
            .save()
            .unwrap();

        let top = make_test_manifest(
            root.path(),
            &[
                ("a", DependencyRecord::new("example.com/a", DependencyKind::Git, "v1")),
                ("b", DependencyRecord::new("example.com/b", DependencyKind::Git, "v1")),
            ],
        );
        let backends = Backends::new(Arc::new(MockRunner::new().responding("git rev-parse", "abc\n")));

        let frozen = freeze(&top, &backends, root.path(), true).unwrap();
        let repos: Vec<_> = frozen.entries.iter().map(|e| e.repository.as_str()).collect();
        assert_eq!(repos, vec!["example.com/a", "example.com/b"]);
        assert_eq!(frozen.problems, 0);
    }

    #[test]
    fn test_freeze_missing_install_is_error() {
        let root = TempDir::new().unwrap();
        let manifest = make_test_manifest(
            root.path(),
            &[("a", DependencyRecord::new("example.com/a", DependencyKind::Hg, ""))],
        );
        let backends = Backends::new(Arc::new(MockRunner::new()));

        let err = freeze(&manifest, &backends, root.path(), false).unwrap_err();
        assert!(matches!(
            err,
            FreezeError::Resolve {
                source: VcsError::NotInstalled { .. },
                ..
            }
        ));
    }
}
