// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Update command - pins a dependency to the newest commit on a branch

use super::Context;
use crate::types::check_argument;
use crate::ui::Printer;
use anyhow::{Context as _, Result};
use tracing::info;

/// Run the update command, returning the number of install problems
pub fn run(ctx: &Context, nickname: &str, branch: &str) -> Result<usize> {
    let mut manifest = ctx.load_manifest()?;
    let record = manifest.get(nickname)?.clone();
    let old_version = record.version.clone();
    check_argument(nickname, "branch", branch)?;

    let dep = record.resolve(nickname, &ctx.config.root)?.with_version(branch);
    let vcs = ctx.backends.for_kind(dep.kind);

    ctx.printer.heading("Updating:");
    info!("Updating {} to the last commit on {}", nickname, branch);

    vcs.clone_repo(&dep)
        .with_context(|| format!("Failed to install {}", dep.repository))?;
    // The pinned commit must come from the remote, not the local copy
    vcs.fetch(&dep)
        .with_context(|| format!("Failed to fetch {}", dep.repository))?;
    vcs.checkout(&dep)
        .with_context(|| format!("Failed to check out {} in {}", branch, dep.repository))?;
    vcs.update(&dep)
        .with_context(|| format!("Failed to update {} in {}", branch, dep.repository))?;
    let commit = vcs.last_commit_on_branch(&dep, branch)?;

    ctx.printer.line(&format!(
        "{}{} ({} --> {})",
        Printer::indent(0),
        nickname,
        display_version(&old_version),
        commit
    ));

    let mut record = record;
    record.version = commit;
    manifest.dependencies.insert(nickname.to_string(), record);
    manifest
        .save()
        .with_context(|| format!("Failed to save {}", manifest.path.display()))?;

    super::install::install_manifest(ctx, &manifest)
}

fn display_version(version: &str) -> &str {
    if version.is_empty() {
        "default"
    } else {
        version
    }
}
