//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. Build mode
//! and interpreter flags override the corresponding Packfile settings.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::target::BuildMode;

mod parsing;

use parsing::parse_jobs;

/// Maximum number of jobs accepted by the CLI.
const MAX_JOBS: usize = 64;

/// Materialise GPU packing headers from a Packfile.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the Packfile, relative to `--directory` when given.
    #[arg(short, long, value_name = "FILE", default_value = packgen_env::DEFAULT_MANIFEST)]
    pub file: Utf8PathBuf,

    /// Run as if started in this directory.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<Utf8PathBuf>,

    /// Maximum number of headers materialised at once.
    ///
    /// Values must be between 1 and 64. Defaults to the number of CPUs.
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the Packfile's build mode.
    #[arg(long, value_enum)]
    pub mode: Option<BuildMode>,

    /// Program used to run generator scripts.
    ///
    /// Takes precedence over `PACKGEN_INTERPRETER` and the Packfile.
    #[arg(long, value_name = "PROG")]
    pub interpreter: Option<Utf8PathBuf>,

    /// Optional subcommand to execute; defaults to `build` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Build(BuildArgs::default()));
        }
        self
    }
}

/// Arguments accepted by the `build` command.
#[derive(Debug, Args, PartialEq, Eq, Clone, Default)]
pub struct BuildArgs {
    /// Names of the targets to materialise. All targets when empty.
    pub targets: Vec<String>,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Materialise headers (default).
    Build(BuildArgs),

    /// Print how each target would be materialised, without writing.
    Plan,

    /// Print the include directories exported after a full build.
    IncludeDirs,
}
