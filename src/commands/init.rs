// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Init command - writes an empty manifest

use super::Context;
use crate::manifest::Manifest;
use anyhow::{Context as _, Result};
use tracing::info;

/// Run the init command
pub fn run(ctx: &Context) -> Result<()> {
    info!("Creating {}", ctx.manifest_path.display());

    Manifest::create(&ctx.manifest_path)
        .with_context(|| format!("Failed to create {}", ctx.manifest_path.display()))?;

    ctx.printer.line(&format!("Created {}", ctx.manifest_path.display()));
    Ok(())
}
