// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! External command execution for the VCS backends

use super::VcsError;
use std::path::Path;
use std::process::Command;
use tracing::{debug, trace};

/// Runs a version-control program and reports success or failure
pub trait CommandRunner: Send + Sync {
    /// Run `program args...` in `dir` (or the current directory) and return stdout
    fn run(&self, dir: Option<&Path>, program: &str, args: &[&str]) -> Result<String, VcsError>;
}

/// Render a command the way a user would type it
#[must_use]
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs commands as child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, dir: Option<&Path>, program: &str, args: &[&str]) -> Result<String, VcsError> {
        let line = command_line(program, args);
        match dir {
            Some(d) => debug!("$ {} (in {})", line, d.display()),
            None => debug!("$ {}", line),
        }

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(d) = dir {
            cmd.current_dir(d);
        }

        let out = cmd.output().map_err(|source| VcsError::Spawn {
            program: program.into(),
            source,
        })?;
        let stdout = String::from_utf8_lossy(&out.stdout).into_owned();

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let output = [stderr.trim(), stdout.trim()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(VcsError::CommandFailed {
                command: line,
                status: out.status.code(),
                output,
            });
        }

        if !stdout.trim().is_empty() {
            trace!("{}", stdout.trim_end());
        }
        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        assert_eq!(command_line("git", &["checkout", "v1"]), "git checkout v1");
        assert_eq!(command_line("hg", &[]), "hg");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = SystemRunner
            .run(None, "depyard-no-such-program", &["--version"])
            .unwrap_err();
        assert!(matches!(err, VcsError::Spawn { .. }));
    }
}
