// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Terminal output for install progress
//!
//! Diagnostics go through `tracing`; the [`Printer`] renders the dependency
//! tree the user watches, one line per dependency, indented by recursion
//! depth.

use crate::types::Dependency;
use owo_colors::{OwoColorize, Style};

/// Marker appended to dependencies refreshed from the network this run
pub const STALE_MARKER: &str = " *";

/// Renders user-facing progress lines
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    quiet: bool,
    verbose: bool,
    color: bool,
}

impl Printer {
    /// Printer honoring `--quiet`, `--verbose` and `--no-color`
    #[must_use]
    pub fn new(quiet: bool, verbose: bool, color: bool) -> Self {
        Self { quiet, verbose, color }
    }

    /// Printer that prints nothing
    #[must_use]
    pub fn silent() -> Self {
        Self::new(true, false, false)
    }

    /// Prefix for a line at recursion `depth`
    #[must_use]
    pub fn indent(depth: usize) -> String {
        format!("{} ", " |".repeat(depth + 1))
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// `nickname (version)`, plus the repository when verbose
    #[must_use]
    pub fn format_dependency(&self, depth: usize, dep: &Dependency, stale: bool) -> String {
        let mut line = Self::indent(depth);
        line.push_str(&self.paint(&dep.nickname, Style::new().blue()));
        line.push_str(&self.paint(&format!(" ({})", dep.version), Style::new().yellow()));
        if self.verbose {
            line.push(' ');
            line.push_str(&dep.repository);
        }
        if stale {
            line.push_str(STALE_MARKER);
        }
        line
    }

    /// Print one dependency line
    pub fn dependency(&self, depth: usize, dep: &Dependency, stale: bool) {
        if !self.quiet {
            println!("{}", self.format_dependency(depth, dep, stale));
        }
    }

    /// Print a section heading such as `Installing:`
    pub fn heading(&self, text: &str) {
        if !self.quiet {
            println!("{}", self.paint(text, Style::new().blue()));
        }
    }

    /// Print an indented problem line
    pub fn problem(&self, depth: usize, text: &str) {
        if !self.quiet {
            println!("{}{}", Self::indent(depth), self.paint(text, Style::new().red()));
        }
    }

    /// Print an advisory note to stderr, keeping stdout clean for data
    pub fn note(&self, text: &str) {
        if !self.quiet {
            eprintln!("{}", self.paint(text, Style::new().yellow()));
        }
    }

    /// Print a plain line
    pub fn line(&self, text: &str) {
        if !self.quiet {
            println!("{text}");
        }
    }
}
