//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal: it loads the Packfile, settles the
//! interpreter and build mode from the command line, the environment and the
//! manifest, probes the toolchain, and hands the resulting targets to a
//! [`BuildGraphNode`].

mod error;
mod output;
mod path_helpers;

pub use error::RunnerError;

use crate::cli::{BuildArgs, Cli, Commands};
use crate::generator::{GeneratorInvoker, GeneratorRequest};
use crate::manifest::{self, Expansion};
use crate::node::{BuildGraphNode, MaterializeOptions};
use crate::resolver::{Plan, ResolverConfig};
use crate::target::GenerationTarget;
use crate::toolchain::Toolchain;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::env;
use std::ffi::OsString;
use std::num::NonZeroUsize;
use tracing::{debug, error, info, warn};

/// Environment variable overriding the generator interpreter.
pub use packgen_env::INTERPRETER_ENV;

use output::write_stdout_lines;
use path_helpers::{
    ensure_manifest_exists_or_error, resolve_cli_program, resolve_manifest_path,
};

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error if the Packfile cannot be loaded, a requested target is
/// unknown, or any target fails to materialize.
pub fn run(cli: &Cli) -> Result<()> {
    let session = Session::open(cli)?;
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Build(BuildArgs::default()));
    match command {
        Commands::Build(args) => handle_build(cli, &session, &args),
        Commands::Plan => handle_plan(&session),
        Commands::IncludeDirs => handle_include_dirs(&session),
    }
}

/// A loaded Packfile with its command-line overrides applied.
struct Session {
    manifest_path: Utf8PathBuf,
    expansion: Expansion,
    config: ResolverConfig,
    invoker: GeneratorInvoker,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let manifest_path = resolve_manifest_path(cli)?;
        ensure_manifest_exists_or_error(cli, &manifest_path)?;
        let packfile = manifest::from_path(&manifest_path)
            .with_context(|| format!("loading {manifest_path}"))?;
        let base_dir = crate::target::parent_or_current(&manifest_path)
            .canonicalize_utf8()
            .with_context(|| format!("resolving the directory of {manifest_path}"))?;
        let expansion = manifest::expand(&packfile, &base_dir)
            .with_context(|| format!("expanding {manifest_path}"))?;

        let cli_interpreter = cli
            .interpreter
            .as_deref()
            .map(|program| resolve_cli_program(cli, program));
        let interpreter = select_interpreter(
            cli_interpreter,
            env::var_os(INTERPRETER_ENV),
            expansion.interpreter.clone(),
        );
        let toolchain_available = interpreter
            .as_deref()
            .is_none_or(|program| Toolchain::probe(program).is_available());
        let mode = cli.mode.unwrap_or(expansion.mode);
        if !toolchain_available {
            warn!(
                interpreter = ?interpreter,
                "generator interpreter not found; prebuilt fallbacks will be used where declared"
            );
        }
        debug!(%mode, toolchain_available, targets = expansion.targets.len(), "session ready");

        Ok(Self {
            manifest_path,
            expansion,
            config: ResolverConfig::new(mode, toolchain_available),
            invoker: GeneratorInvoker::new(interpreter),
        })
    }

    fn node(&self, targets: Vec<GenerationTarget>) -> Result<BuildGraphNode> {
        BuildGraphNode::new(
            targets,
            self.expansion.include_dirs.iter().cloned(),
            self.config,
            self.invoker.clone(),
        )
        .with_context(|| format!("assembling targets from {}", self.manifest_path))
    }

    fn select(&self, names: &[String]) -> Result<Vec<GenerationTarget>, RunnerError> {
        if names.is_empty() {
            return Ok(self.expansion.targets.clone());
        }
        names
            .iter()
            .map(|name| {
                self.expansion
                    .targets
                    .iter()
                    .find(|target| &target.name == name)
                    .cloned()
                    .ok_or_else(|| RunnerError::UnknownTarget { name: name.clone() })
            })
            .collect()
    }
}

/// Pick the interpreter: command line first, then the environment, then the
/// Packfile. An empty or non-UTF-8 environment value is ignored.
fn select_interpreter(
    cli: Option<Utf8PathBuf>,
    env_value: Option<OsString>,
    manifest: Option<Utf8PathBuf>,
) -> Option<Utf8PathBuf> {
    cli.or_else(|| {
        env_value
            .and_then(|value| value.into_string().ok())
            .filter(|value| !value.is_empty())
            .map(Utf8PathBuf::from)
    })
    .or(manifest)
}

fn handle_build(cli: &Cli, session: &Session, args: &BuildArgs) -> Result<()> {
    let mut node = session.node(session.select(&args.targets)?)?;
    let options = MaterializeOptions {
        jobs: cli.jobs.and_then(NonZeroUsize::new),
        ..MaterializeOptions::default()
    };
    match node.materialize(&options) {
        Ok(report) => {
            info!(
                targets = report.outputs.len(),
                written = report.written(),
                "build complete"
            );
            Ok(())
        }
        Err(err) => {
            for failure in &err.failures {
                error!(header = failure.target(), "{failure}");
            }
            Err(err).with_context(|| format!("building {}", session.manifest_path))
        }
    }
}

fn handle_plan(session: &Session) -> Result<()> {
    let node = session.node(session.expansion.targets.clone())?;
    let mut unresolved = 0usize;
    let lines: Vec<String> = node
        .targets()
        .iter()
        .map(|target| match node.resolver().plan(target) {
            Ok(plan) => plan_line(node.invoker(), target, &plan),
            Err(err) => {
                unresolved += 1;
                error!(header = %target.name, "{err}");
                format!("{}\tunresolved\t{}\t-", target.name, target.output)
            }
        })
        .collect();
    write_stdout_lines(&lines)?;
    if unresolved == 0 {
        Ok(())
    } else {
        Err(RunnerError::Unplannable { count: unresolved }.into())
    }
}

fn plan_line(invoker: &GeneratorInvoker, target: &GenerationTarget, plan: &Plan<'_>) -> String {
    let action = match *plan {
        Plan::Generate { script, xml } => invoker.shell_command(&GeneratorRequest {
            script,
            flags: &target.flags,
            xml,
            version: &target.version,
        }),
        Plan::CopyFallback { source } => source.to_string(),
    };
    format!(
        "{}\t{}\t{}\t{action}",
        target.name,
        plan.strategy(),
        target.output
    )
}

fn handle_include_dirs(session: &Session) -> Result<()> {
    let node = session.node(session.expansion.targets.clone())?;
    write_stdout_lines(node.declared_include_dirs().iter().map(|dir| dir.as_str()))
}
