// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `DEPYARD_*` environment variables, then command-line flags.

use crate::cache::CACHE_FILE;
use anyhow::{anyhow, Context, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings as read from the file and environment layers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Settings {
    root: Option<PathBuf>,
    clean: bool,
    recursive: bool,
}

/// Command-line values that take precedence over every other layer
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--root`
    pub root: Option<PathBuf>,
    /// `--clean`
    pub clean: bool,
    /// `--no-recurse`
    pub no_recurse: bool,
}

/// Resolved configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory working copies are installed under
    pub root: PathBuf,
    /// Discard local changes before checkout
    pub clean: bool,
    /// Descend into nested manifests
    pub recursive: bool,
}

impl Config {
    /// Location of the staleness cache
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.root.join(CACHE_FILE)
    }
}

/// `<config dir>/depyard/config.toml`, if a home directory is known
#[must_use]
pub fn default_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "depyard").map(|d| d.config_dir().join("config.toml"))
}

/// `<home>/depyard/src`, if a home directory is known
#[must_use]
pub fn default_root() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join("depyard").join("src"))
}

/// Load configuration; an explicit `file` must exist, the default one may not
pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Config> {
    let (file, required) = match file {
        Some(path) => (Some(path.to_path_buf()), true),
        None => (default_config_file(), false),
    };

    let mut builder = config::Config::builder()
        .set_default("clean", false)?
        .set_default("recursive", true)?;

    if let Some(path) = &file {
        debug!("Reading configuration from {}", path.display());
        builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml).required(required));
    }

    let settings: Settings = builder
        .add_source(Environment::with_prefix("DEPYARD"))
        .build()
        .context("Failed to load configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    resolve(settings, overrides)
}

fn resolve(settings: Settings, overrides: &Overrides) -> Result<Config> {
    let root = overrides
        .root
        .clone()
        .or(settings.root)
        .or_else(default_root)
        .ok_or_else(|| anyhow!("Cannot determine an install root: set --root or DEPYARD_ROOT"))?;

    let root = if root.is_absolute() {
        root
    } else {
        std::env::current_dir()
            .context("Cannot determine current directory")?
            .join(root)
    };

    Ok(Config {
        root,
        clean: overrides.clean || settings.clean,
        recursive: settings.recursive && !overrides.no_recurse,
    })
}
