// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dependency manifests (`deps.json`) and manifest discovery

use crate::types::DependencyRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of a dependency manifest
pub const MANIFEST_FILE: &str = "deps.json";

/// Errors from reading or writing manifests
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Manifest path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The manifest is not a valid nickname-to-record JSON object
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        /// Manifest path
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// The manifest could not be encoded as JSON
    #[error("failed to serialize {}: {source}", .path.display())]
    Serialize {
        /// Manifest path
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// The manifest could not be written
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Manifest path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// `create` refused to overwrite an existing manifest
    #[error("{} already exists", .path.display())]
    AlreadyExists {
        /// Manifest path
        path: PathBuf,
    },

    /// No entry with this nickname
    #[error("dependency '{nickname}' not found in {}", .path.display())]
    UnknownDependency {
        /// Requested nickname
        nickname: String,
        /// Manifest path
        path: PathBuf,
    },

    /// An entry with this nickname already exists
    #[error("dependency '{nickname}' is already defined in {}, pick another name", .path.display())]
    DuplicateNickname {
        /// Requested nickname
        nickname: String,
        /// Manifest path
        path: PathBuf,
    },
}

/// A dependency manifest and the file it was loaded from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Where the manifest lives; `save` writes back here
    pub path: PathBuf,
    /// Nickname to record
    pub dependencies: BTreeMap<String, DependencyRecord>,
}

impl Manifest {
    /// Empty manifest bound to `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dependencies: BTreeMap::new(),
        }
    }

    /// Load a manifest from disk
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let dependencies = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            dependencies,
        })
    }

    /// Write the manifest back to the path it was loaded from
    pub fn save(&self) -> Result<(), ManifestError> {
        let mut json = serde_json::to_string_pretty(&self.dependencies).map_err(|source| ManifestError::Serialize {
            path: self.path.clone(),
            source,
        })?;
        json.push('\n');
        fs::write(&self.path, json).map_err(|source| ManifestError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Write an empty manifest at `path`, refusing to overwrite
    pub fn create(path: &Path) -> Result<Self, ManifestError> {
        if path.exists() {
            return Err(ManifestError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        let manifest = Self::new(path);
        manifest.save()?;
        Ok(manifest)
    }

    /// Look up a record by nickname
    pub fn get(&self, nickname: &str) -> Result<&DependencyRecord, ManifestError> {
        self.dependencies
            .get(nickname)
            .ok_or_else(|| ManifestError::UnknownDependency {
                nickname: nickname.into(),
                path: self.path.clone(),
            })
    }

    /// Add a record under a nickname that is not yet taken
    pub fn insert_new(&mut self, nickname: &str, record: DependencyRecord) -> Result<(), ManifestError> {
        if self.dependencies.contains_key(nickname) {
            return Err(ManifestError::DuplicateNickname {
                nickname: nickname.into(),
                path: self.path.clone(),
            });
        }
        self.dependencies.insert(nickname.into(), record);
        Ok(())
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Whether the manifest has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Normalize a user-supplied directory or file path to a manifest path
#[must_use]
pub fn manifest_path(p: &Path) -> PathBuf {
    if p.file_name().is_some_and(|name| name == MANIFEST_FILE) {
        p.to_path_buf()
    } else {
        p.join(MANIFEST_FILE)
    }
}

/// Search `start` and then each of its ancestors for `filename`
#[must_use]
pub fn find_upward(start: &Path, filename: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}
