// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Depyard library - install a project's dependency graph at pinned versions
//!
//! A project lists its dependencies in a `deps.json` manifest: nickname to
//! repository, version and version-control kind. Installing places each
//! repository on disk at the requested version, then descends into the
//! dependency's own manifest. A repository requested at two different
//! versions anywhere in the graph stops the whole run.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod commands;
pub mod config;
pub mod freeze;
pub mod install;
pub mod manifest;
pub mod ui;
pub mod vcs;

/// Dependency records as written in a manifest, and their validated form
pub mod types {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::path::{Component, Path, PathBuf};
    use thiserror::Error;

    // =========================================================================
    // Dependency Kinds
    // =========================================================================

    /// Supported version-control kinds
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum DependencyKind {
        /// Git repository installed at a path derived from its import path
        Git,
        /// Git repository installed at an explicit alias path
        GitClone,
        /// Mercurial repository
        Hg,
        /// Bazaar branch (linear history)
        Bzr,
    }

    impl DependencyKind {
        /// Every kind, in the order they are listed to users
        pub const ALL: [Self; 4] = [Self::Git, Self::GitClone, Self::Hg, Self::Bzr];

        /// Parse a kind from its manifest spelling
        #[must_use]
        pub fn parse(s: &str) -> Option<Self> {
            match s.trim() {
                "git" => Some(Self::Git),
                "git-clone" => Some(Self::GitClone),
                "hg" => Some(Self::Hg),
                "bzr" => Some(Self::Bzr),
                _ => None,
            }
        }

        /// Manifest spelling of this kind
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Git => "git",
                Self::GitClone => "git-clone",
                Self::Hg => "hg",
                Self::Bzr => "bzr",
            }
        }

        /// Version used when a record leaves `version` empty
        #[must_use]
        pub fn default_version(&self) -> &'static str {
            match self {
                Self::Git | Self::GitClone => "master",
                Self::Hg => "tip",
                Self::Bzr => "trunk",
            }
        }

        /// Whether records of this kind must carry an `alias`
        #[must_use]
        pub fn requires_alias(&self) -> bool {
            matches!(self, Self::GitClone)
        }

        /// Comma separated list of valid kinds, for diagnostics
        #[must_use]
        pub fn valid_names() -> String {
            Self::ALL
                .iter()
                .map(DependencyKind::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    impl fmt::Display for DependencyKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    // =========================================================================
    // Manifest Records
    // =========================================================================

    /// Reasons a manifest record cannot be installed
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum DependencyError {
        /// The `type` field names no supported kind
        #[error("dependency {nickname}: unknown repository type '{kind}' (valid types: {valid})")]
        UnknownKind {
            /// Manifest nickname
            nickname: String,
            /// The unrecognized type string
            kind: String,
            /// Valid type names
            valid: String,
        },

        /// A `git-clone` record has no alias to install into
        #[error("dependency {nickname}: repo '{repo}' of type git-clone requires an 'alias' field")]
        MissingAlias {
            /// Manifest nickname
            nickname: String,
            /// Repository identity
            repo: String,
        },

        /// An alias was given for a kind whose path derives from the repository
        #[error("dependency {nickname}: type {kind} installs by repository path and does not accept an 'alias'")]
        UnexpectedAlias {
            /// Manifest nickname
            nickname: String,
            /// The record's kind
            kind: DependencyKind,
        },

        /// The `repo` field is empty
        #[error("dependency {nickname}: missing 'repo' field")]
        MissingRepository {
            /// Manifest nickname
            nickname: String,
        },

        /// A value passed to the VCS tool would be parsed as an option
        #[error("dependency {nickname}: {field} '{value}' must not start with '-'")]
        OptionLike {
            /// Manifest nickname
            nickname: String,
            /// Which field held the value
            field: &'static str,
            /// The offending value
            value: String,
        },

        /// The install path would land outside the install root
        #[error("dependency {nickname}: install path '{path}' must be relative and stay inside the install root")]
        UnsafePath {
            /// Manifest nickname
            nickname: String,
            /// The offending path
            path: String,
        },
    }

    /// Refuse `value` if a VCS command line would read it as a flag
    pub fn check_argument(nickname: &str, field: &'static str, value: &str) -> Result<(), DependencyError> {
        if value.starts_with('-') {
            return Err(DependencyError::OptionLike {
                nickname: nickname.into(),
                field,
                value: value.into(),
            });
        }
        Ok(())
    }

    fn is_false(b: &bool) -> bool {
        !*b
    }

    /// One manifest entry, exactly as serialized in `deps.json`
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DependencyRecord {
        /// Repository identity (URL or import path); the deduplication key
        pub repo: String,
        /// Branch, tag or commit; empty means the kind's default
        #[serde(default, skip_serializing_if = "String::is_empty")]
        pub version: String,
        /// Version-control kind, kept raw so an unknown kind only rejects this entry
        #[serde(rename = "type", default)]
        pub kind: String,
        /// Install path relative to the install root (git-clone only)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub alias: Option<String>,
        /// Always refresh this dependency from the network
        #[serde(rename = "skip-cache", default, skip_serializing_if = "is_false")]
        pub skip_cache: bool,
    }

    impl DependencyRecord {
        /// Build a record for the given repository and kind
        #[must_use]
        pub fn new(repo: &str, kind: DependencyKind, version: &str) -> Self {
            Self {
                repo: repo.into(),
                version: version.into(),
                kind: kind.as_str().into(),
                alias: None,
                skip_cache: false,
            }
        }

        /// Set the alias path
        #[must_use]
        pub fn with_alias(mut self, alias: &str) -> Self {
            self.alias = Some(alias.into());
            self
        }

        /// Validate this record and place it under `root`
        pub fn resolve(&self, nickname: &str, root: &Path) -> Result<Dependency, DependencyError> {
            let kind = DependencyKind::parse(&self.kind).ok_or_else(|| DependencyError::UnknownKind {
                nickname: nickname.into(),
                kind: self.kind.clone(),
                valid: DependencyKind::valid_names(),
            })?;

            let repository = self.repo.trim();
            if repository.is_empty() {
                return Err(DependencyError::MissingRepository {
                    nickname: nickname.into(),
                });
            }
            check_argument(nickname, "repo", repository)?;

            let alias = self.alias.as_deref().map(str::trim).filter(|a| !a.is_empty());
            let relative = match (kind.requires_alias(), alias) {
                (true, Some(alias)) => PathBuf::from(alias),
                (true, None) => {
                    return Err(DependencyError::MissingAlias {
                        nickname: nickname.into(),
                        repo: repository.into(),
                    })
                }
                (false, Some(_)) => {
                    return Err(DependencyError::UnexpectedAlias {
                        nickname: nickname.into(),
                        kind,
                    })
                }
                (false, None) => install_dir_for(repository),
            };

            let relative = contained_relative(&relative).ok_or_else(|| DependencyError::UnsafePath {
                nickname: nickname.into(),
                path: relative.display().to_string(),
            })?;

            let version = match self.version.trim() {
                "" => kind.default_version().to_string(),
                v => v.to_string(),
            };
            check_argument(nickname, "version", &version)?;

            Ok(Dependency {
                nickname: nickname.into(),
                repository: repository.into(),
                version,
                kind,
                path: root.join(relative),
                skip_cache: self.skip_cache,
            })
        }
    }

    /// Relative install directory derived from a repository identity.
    ///
    /// `https://github.com/o/r.git`, `git@github.com:o/r.git` and
    /// `github.com/o/r` all land in `github.com/o/r`.
    #[must_use]
    pub fn install_dir_for(repository: &str) -> PathBuf {
        let (rest, had_scheme) = match repository.split_once("://") {
            Some((_, rest)) => (rest, true),
            None => (repository, false),
        };
        let rest = match rest.split_once('@') {
            Some((user, host)) if !user.contains('/') => host,
            _ => rest,
        };
        let rest = if had_scheme || rest.starts_with('/') {
            rest.to_string()
        } else {
            rest.replacen(':', "/", 1)
        };
        let rest = rest.trim_start_matches('/').trim_end_matches('/');
        let rest = rest.strip_suffix(".git").unwrap_or(rest);
        PathBuf::from(rest)
    }

    /// Keep only normal components; `None` for absolute paths, `..` or empty paths
    fn contained_relative(p: &Path) -> Option<PathBuf> {
        let mut out = PathBuf::new();
        for c in p.components() {
            match c {
                Component::Normal(seg) => out.push(seg),
                Component::CurDir => {}
                Component::Prefix(_) | Component::RootDir | Component::ParentDir => return None,
            }
        }
        if out.as_os_str().is_empty() {
            None
        } else {
            Some(out)
        }
    }

    // =========================================================================
    // Validated Dependency
    // =========================================================================

    /// A validated manifest entry with its install location
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Dependency {
        /// Manifest nickname
        pub nickname: String,
        /// Repository identity
        pub repository: String,
        /// Requested version with the kind's default applied
        pub version: String,
        /// Version-control kind
        pub kind: DependencyKind,
        /// Absolute install directory
        pub path: PathBuf,
        /// Per-dependency cache bypass
        pub skip_cache: bool,
    }

    impl Dependency {
        /// Location handed to the VCS clone command
        #[must_use]
        pub fn clone_url(&self) -> String {
            let r = self.repository.as_str();
            let is_url = r.contains("://");
            let is_scp = r.split_once(':').is_some_and(|(host, _)| host.contains('@'));
            let is_path = r.starts_with('/') || r.starts_with('.');
            if is_url || is_scp || is_path {
                r.to_string()
            } else {
                format!("https://{r}")
            }
        }

        /// Same dependency pinned to another version
        #[must_use]
        pub fn with_version(&self, version: &str) -> Self {
            Self {
                version: version.into(),
                ..self.clone()
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_default_versions() {
            let root = Path::new("/deps");
            let git = DependencyRecord::new("github.com/a/b", DependencyKind::Git, "")
                .resolve("b", root)
                .unwrap();
            assert_eq!(git.version, "master");

            let hg = DependencyRecord::new("bitbucket.org/a/b", DependencyKind::Hg, " ")
                .resolve("b", root)
                .unwrap();
            assert_eq!(hg.version, "tip");

            let bzr = DependencyRecord::new("launchpad.net/b", DependencyKind::Bzr, "")
                .resolve("b", root)
                .unwrap();
            assert_eq!(bzr.version, "trunk");
        }

        #[test]
        fn test_git_clone_requires_alias() {
            let record = DependencyRecord::new("https://example.com/x.git", DependencyKind::GitClone, "v1");
            let err = record.resolve("x", Path::new("/deps")).unwrap_err();
            assert!(matches!(err, DependencyError::MissingAlias { .. }));

            let dep = record.with_alias("vendor/x").resolve("x", Path::new("/deps")).unwrap();
            assert_eq!(dep.path, PathBuf::from("/deps/vendor/x"));
            assert_eq!(dep.clone_url(), "https://example.com/x.git");
        }

        #[test]
        fn test_alias_rejected_for_derived_kinds() {
            let record = DependencyRecord::new("github.com/a/b", DependencyKind::Git, "v1").with_alias("elsewhere");
            let err = record.resolve("b", Path::new("/deps")).unwrap_err();
            assert!(matches!(err, DependencyError::UnexpectedAlias { kind: DependencyKind::Git, .. }));
        }

        #[test]
        fn test_unknown_kind() {
            let record = DependencyRecord {
                repo: "github.com/a/b".into(),
                kind: "svn".into(),
                ..Default::default()
            };
            let err = record.resolve("b", Path::new("/deps")).unwrap_err();
            assert!(err.to_string().contains("svn"));
            assert!(err.to_string().contains("git, git-clone, hg, bzr"));
        }

        #[test]
        fn test_unsafe_alias() {
            for alias in ["../outside", "/etc/passwd", "."] {
                let record = DependencyRecord::new("x", DependencyKind::GitClone, "v1").with_alias(alias);
                let err = record.resolve("x", Path::new("/deps")).unwrap_err();
                assert!(matches!(err, DependencyError::UnsafePath { .. }), "alias {alias}");
            }
        }

        #[test]
        fn test_option_like_values_rejected() {
            let root = Path::new("/deps");
            let hook = "--config=hooks.pre-update=touch /tmp/x";
            let err = DependencyRecord::new("example.com/r", DependencyKind::Hg, hook)
                .resolve("r", root)
                .unwrap_err();
            assert!(matches!(err, DependencyError::OptionLike { field: "version", .. }));

            let err = DependencyRecord::new("-u@evil:x", DependencyKind::Git, "")
                .resolve("r", root)
                .unwrap_err();
            assert!(matches!(err, DependencyError::OptionLike { field: "repo", .. }));

            assert!(check_argument("r", "branch", "release-1").is_ok());
        }

        #[test]
        fn test_install_dir_for() {
            assert_eq!(install_dir_for("github.com/a/b"), PathBuf::from("github.com/a/b"));
            assert_eq!(install_dir_for("https://github.com/a/b.git"), PathBuf::from("github.com/a/b"));
            assert_eq!(install_dir_for("git@github.com:a/b.git"), PathBuf::from("github.com/a/b"));
            assert_eq!(install_dir_for("ssh://git@host/a/b/"), PathBuf::from("host/a/b"));
        }

        #[test]
        fn test_clone_url() {
            let root = Path::new("/deps");
            let dep = DependencyRecord::new("github.com/a/b", DependencyKind::Git, "")
                .resolve("b", root)
                .unwrap();
            assert_eq!(dep.clone_url(), "https://github.com/a/b");

            let dep = DependencyRecord::new("git@github.com:a/b.git", DependencyKind::Git, "")
                .resolve("b", root)
                .unwrap();
            assert_eq!(dep.clone_url(), "git@github.com:a/b.git");
        }

        #[test]
        fn test_record_json_shape() {
            let json = r#"{"repo": "github.com/a/b", "type": "git", "skip-cache": true}"#;
            let record: DependencyRecord = serde_json::from_str(json).unwrap();
            assert_eq!(record.version, "");
            assert!(record.skip_cache);
            assert_eq!(record.alias, None);

            let out = serde_json::to_string(&DependencyRecord::new("r", DependencyKind::Hg, "tip")).unwrap();
            assert_eq!(out, r#"{"repo":"r","version":"tip","type":"hg"}"#);
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
