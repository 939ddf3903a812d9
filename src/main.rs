// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Depyard CLI - installs a project's dependency graph at pinned versions

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use depyard::cache::CacheOptions;
use depyard::commands::{self, add::NewDependency, Context};
use depyard::config::{self, Overrides};
use depyard::manifest::manifest_path;
use depyard::ui::Printer;
use depyard::vcs::Backends;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "depyard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "DEPYARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory containing deps.json, or the manifest itself
    #[arg(short, long, default_value = ".", global = true)]
    path: PathBuf,

    /// Directory dependencies are installed under
    #[arg(long, env = "DEPYARD_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Discard local changes in dependencies before checkout
    #[arg(long, global = true)]
    clean: bool,

    /// Delete the staleness cache before running
    #[arg(long, global = true)]
    clear_cache: bool,

    /// Refresh every dependency and leave the cache file untouched
    #[arg(long, global = true)]
    skip_cache: bool,

    /// Do not descend into dependencies' own manifests
    #[arg(long, global = true)]
    no_recurse: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty deps.json
    #[command(alias = "create")]
    Init,

    /// Add a dependency to deps.json and install
    Add {
        /// Nickname for the dependency
        nickname: String,

        /// Repository URL or import path
        #[arg(long)]
        repo: String,

        /// Repository type (git, git-clone, hg, bzr)
        #[arg(long = "type", default_value = "git")]
        kind: String,

        /// Branch, tag or commit (defaults per type)
        #[arg(long)]
        version: Option<String>,

        /// Install path under the root (git-clone only)
        #[arg(long)]
        alias: Option<String>,
    },

    /// Install all dependencies listed in deps.json (default)
    Install,

    /// Pin a dependency to the last commit on a branch
    Update {
        /// Nickname of the dependency
        nickname: String,

        /// Branch to follow
        branch: String,
    },

    /// Show dependencies resolved to commit identifiers
    ShowFrozen {
        /// Include nested dependencies
        #[arg(long)]
        recursive: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: clap_complete::Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.as_str())),
        )
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(problems) => {
            error!("Finished with {} problem(s)", problems);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<usize> {
    let command = cli.command.unwrap_or(Commands::Install);

    if let Commands::Completions { shell } = command {
        commands::completions::run(shell, &mut Cli::command())?;
        return Ok(0);
    }

    let overrides = Overrides {
        root: cli.root,
        clean: cli.clean,
        no_recurse: cli.no_recurse,
    };
    let ctx = Context {
        manifest_path: manifest_path(&cli.path),
        config: config::load(cli.config.as_deref(), &overrides)?,
        cache: CacheOptions {
            clear: cli.clear_cache,
            skip: cli.skip_cache,
        },
        printer: Printer::new(cli.quiet, cli.verbose > 0, !cli.no_color),
        backends: Backends::system(),
    };

    match command {
        Commands::Init => commands::init::run(&ctx).map(|()| 0),
        Commands::Add {
            nickname,
            repo,
            kind,
            version,
            alias,
        } => commands::add::run(
            &ctx,
            &NewDependency {
                nickname,
                repo,
                kind,
                version: version.unwrap_or_default(),
                alias,
            },
        ),
        Commands::Install => commands::install::run(&ctx),
        Commands::Update { nickname, branch } => commands::update::run(&ctx, &nickname, &branch),
        Commands::ShowFrozen { recursive } => commands::show_frozen::run(&ctx, recursive),
        Commands::Completions { .. } => Ok(0),
    }
}
