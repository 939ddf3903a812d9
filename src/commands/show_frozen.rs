// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Show-frozen command - prints each dependency pinned to a commit

use super::Context;
use crate::freeze::freeze;
use anyhow::Result;

/// Run the show-frozen command, returning the number of skipped entries
pub fn run(ctx: &Context, recursive: bool) -> Result<usize> {
    let manifest = ctx.load_manifest()?;

    ctx.printer
        .note("NOTE: This will not reflect the state of the remote unless you have just run `depyard install`.");

    let frozen = freeze(&manifest, &ctx.backends, &ctx.config.root, recursive)?;
    print!("{frozen}");
    Ok(frozen.problems)
}
