// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Time-based staleness cache
//!
//! Remembers when each repository was last refreshed from the network so a
//! run only fetches repositories that have not been refreshed within the
//! last hour. Persisted as a flat JSON object of repository to RFC 3339
//! timestamp.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File name of the cache, relative to the install root
pub const CACHE_FILE: &str = ".depyard.cache";

/// Entries older than this many hours are stale
pub const STALE_AFTER_HOURS: i64 = 1;

/// Errors from persisting the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file exists but could not be read
    #[error("failed to read cache {}: {source}", .path.display())]
    Read {
        /// Cache path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The cache file could not be written
    #[error("failed to write cache {}: {source}", .path.display())]
    Write {
        /// Cache path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The cache file could not be deleted
    #[error("failed to clear cache {}: {source}", .path.display())]
    Remove {
        /// Cache path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The cache could not be encoded
    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// How the cache behaves for this run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Delete the persisted cache before the run
    pub clear: bool,
    /// Treat everything as stale and leave the persisted cache untouched
    pub skip: bool,
}

/// Repository to last-refresh time, owned by one run
#[derive(Debug, Clone)]
pub struct StalenessCache {
    path: PathBuf,
    entries: BTreeMap<String, DateTime<Utc>>,
    skip: bool,
    threshold: Duration,
}

impl StalenessCache {
    /// Empty cache that would persist to `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, skip: bool) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            skip,
            threshold: Duration::hours(STALE_AFTER_HOURS),
        }
    }

    /// Load the cache at `path`; a missing file is an empty cache
    pub fn load(path: &Path, options: CacheOptions) -> Result<Self, CacheError> {
        let mut cache = Self::new(path, options.skip);

        if options.clear {
            info!("Clearing cache file: {}", path.display());
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(CacheError::Remove {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            }
            return Ok(cache);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(cache),
            Err(source) => {
                return Err(CacheError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        debug!("Reading cache file from {}", path.display());
        match serde_json::from_str(&content) {
            Ok(entries) => cache.entries = entries,
            Err(e) => warn!("Ignoring unreadable cache {}: {}", path.display(), e),
        }
        Ok(cache)
    }

    /// Persist the cache; returns `false` without writing when skipping
    pub fn save(&self) -> Result<bool, CacheError> {
        if self.skip {
            debug!("Cache skipped for this run, not writing {}", self.path.display());
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| CacheError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        let mut json = serde_json::to_string_pretty(&self.entries)?;
        json.push('\n');

        debug!("Writing cache file to {}", self.path.display());
        fs::write(&self.path, json).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })?;
        Ok(true)
    }

    /// Whether `repository` needs a network refresh now
    pub fn is_stale(&mut self, repository: &str, skip_override: bool) -> bool {
        self.is_stale_at(repository, skip_override, Utc::now())
    }

    /// Whether `repository` needs a network refresh at `now`.
    ///
    /// Reporting stale stamps `now`, so a second query inside the threshold
    /// reports fresh.
    pub fn is_stale_at(&mut self, repository: &str, skip_override: bool, now: DateTime<Utc>) -> bool {
        let stale = self.skip
            || skip_override
            || self
                .entries
                .get(repository)
                .map_or(true, |last| now - *last > self.threshold);

        if stale {
            self.entries.insert(repository.into(), now);
        }
        stale
    }

    /// When `repository` was last refreshed, if known
    #[must_use]
    pub fn last_refreshed(&self, repository: &str) -> Option<DateTime<Utc>> {
        self.entries.get(repository).copied()
    }

    /// Where the cache persists
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of repositories with a timestamp
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no repository has a timestamp
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_staleness_transitions() {
        let mut cache = StalenessCache::new("unused", false);

        assert!(cache.is_stale_at("repo", false, t0()));
        assert_eq!(cache.last_refreshed("repo"), Some(t0()));

        assert!(!cache.is_stale_at("repo", false, t0() + Duration::minutes(1)));
        assert_eq!(cache.last_refreshed("repo"), Some(t0()));

        let later = t0() + Duration::hours(2);
        assert!(cache.is_stale_at("repo", false, later));
        assert!(!cache.is_stale_at("repo", false, later + Duration::seconds(1)));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut cache = StalenessCache::new("unused", false);
        cache.is_stale_at("repo", false, t0());
        assert!(!cache.is_stale_at("repo", false, t0() + Duration::hours(1)));
        assert!(cache.is_stale_at("repo", false, t0() + Duration::hours(1) + Duration::seconds(1)));
    }

    #[test]
    fn test_old_and_new_entries() {
        let mut cache = StalenessCache::new("unused", false);
        cache.entries.insert("old".into(), t0() - Duration::hours(2));
        cache.entries.insert("new".into(), t0() - Duration::minutes(1));

        assert!(cache.is_stale_at("old", false, t0()));
        assert!(!cache.is_stale_at("new", false, t0()));
    }

    #[test]
    fn test_overrides_always_stale() {
        let mut cache = StalenessCache::new("unused", false);
        cache.is_stale_at("repo", false, t0());
        assert!(cache.is_stale_at("repo", true, t0()));

        let mut skipping = StalenessCache::new("unused", true);
        assert!(skipping.is_stale_at("repo", false, t0()));
        assert!(skipping.is_stale_at("repo", false, t0()));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = StalenessCache::load(&dir.path().join(CACHE_FILE), CacheOptions::default()).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE);

        let mut cache = StalenessCache::load(&path, CacheOptions::default()).unwrap();
        cache.is_stale_at("github.com/a/b", false, t0());
        assert!(cache.save().unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"github.com/a/b\": \"2025-06-01T12:00:00Z\""));

        let mut reloaded = StalenessCache::load(&path, CacheOptions::default()).unwrap();
        assert_eq!(reloaded.last_refreshed("github.com/a/b"), Some(t0()));
        assert!(!reloaded.is_stale_at("github.com/a/b", false, t0() + Duration::minutes(5)));
    }

    #[test]
    fn test_clear_deletes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE);
        fs::write(&path, r#"{"r": "2025-06-01T12:00:00Z"}"#).unwrap();

        let cache = StalenessCache::load(&path, CacheOptions { clear: true, skip: false }).unwrap();
        assert!(cache.is_empty());
        assert!(!path.exists());

        // Clearing an absent cache is fine
        StalenessCache::load(&path, CacheOptions { clear: true, skip: false }).unwrap();
    }

    #[test]
    fn test_skip_leaves_disk_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE);
        let original = "{\"r\": \"2025-06-01T12:00:00Z\"}";
        fs::write(&path, original).unwrap();

        let mut cache = StalenessCache::load(&path, CacheOptions { clear: false, skip: true }).unwrap();
        assert!(cache.is_stale("r", false));
        assert!(cache.is_stale("other", false));
        assert!(!cache.save().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE);
        fs::write(&path, "not json").unwrap();

        let cache = StalenessCache::load(&path, CacheOptions::default()).unwrap();
        assert!(cache.is_empty());
    }
}
