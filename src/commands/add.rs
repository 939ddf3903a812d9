// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Add command - records a new dependency and installs

use super::Context;
use crate::types::{DependencyKind, DependencyRecord};
use anyhow::{bail, Context as _, Result};
use tracing::info;

/// Fields for a new manifest entry
#[derive(Debug, Clone)]
pub struct NewDependency {
    /// Nickname to store it under
    pub nickname: String,
    /// Repository identity
    pub repo: String,
    /// Version-control kind name
    pub kind: String,
    /// Branch, tag or commit; empty for the kind's default
    pub version: String,
    /// Install path for git-clone dependencies
    pub alias: Option<String>,
}

/// Run the add command, returning the number of install problems
pub fn run(ctx: &Context, new: &NewDependency) -> Result<usize> {
    let Some(kind) = DependencyKind::parse(&new.kind) else {
        bail!(
            "Invalid type '{}', expected one of: {}",
            new.kind,
            DependencyKind::valid_names()
        );
    };

    let mut record = DependencyRecord::new(&new.repo, kind, &new.version);
    if let Some(alias) = &new.alias {
        record = record.with_alias(alias);
    }
    // Reject what the installer would reject before touching the manifest
    record.resolve(&new.nickname, &ctx.config.root)?;

    let mut manifest = ctx.load_manifest()?;
    manifest.insert_new(&new.nickname, record)?;
    manifest
        .save()
        .with_context(|| format!("Failed to save {}", manifest.path.display()))?;

    info!("Added {} ({})", new.nickname, new.repo);
    ctx.printer.heading(&format!("Added: {}", new.nickname));

    super::install::install_manifest(ctx, &manifest)
}
