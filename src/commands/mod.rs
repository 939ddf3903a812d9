// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod add;
pub mod completions;
pub mod init;
pub mod install;
pub mod show_frozen;
pub mod update;

use crate::cache::CacheOptions;
use crate::config::Config;
use crate::manifest::Manifest;
use crate::ui::Printer;
use crate::vcs::Backends;
use anyhow::{Context as _, Result};
use std::path::PathBuf;

/// Everything a command needs from the global flags
pub struct Context {
    /// The project's `deps.json`
    pub manifest_path: PathBuf,
    /// Resolved configuration
    pub config: Config,
    /// Cache behavior for this run
    pub cache: CacheOptions,
    /// Progress output
    pub printer: Printer,
    /// Version-control backends
    pub backends: Backends,
}

impl Context {
    /// Load the project's manifest
    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path)
            .with_context(|| format!("Failed to load manifest {}", self.manifest_path.display()))
    }
}
