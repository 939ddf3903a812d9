// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Install command - installs the whole dependency graph

use super::Context;
use crate::cache::StalenessCache;
use crate::install::{InstallOptions, Installer};
use crate::manifest::Manifest;
use anyhow::{Context as _, Result};
use tracing::{info, warn};

/// Run the install command, returning the number of problems
pub fn run(ctx: &Context) -> Result<usize> {
    let manifest = ctx.load_manifest()?;
    install_manifest(ctx, &manifest)
}

/// Install `manifest` with the run's cache and options.
///
/// The cache is saved even when a conflict stops the run, so repositories
/// already refreshed are not fetched again next time. A failed save is
/// logged and never replaces the install outcome.
pub fn install_manifest(ctx: &Context, manifest: &Manifest) -> Result<usize> {
    let cache_path = ctx.config.cache_path();
    let mut cache = StalenessCache::load(&cache_path, ctx.cache)
        .with_context(|| format!("Failed to load cache {}", cache_path.display()))?;

    let options = InstallOptions {
        clean: ctx.config.clean,
        recursive: ctx.config.recursive,
    };
    info!("Install root: {}", ctx.config.root.display());

    let result = Installer::new(&ctx.config.root, &ctx.backends, &mut cache, ctx.printer, options).install(manifest);

    if let Err(e) = cache.save() {
        warn!("Failed to save cache {}: {}", cache_path.display(), e);
    }

    result.context("Install aborted")
}
