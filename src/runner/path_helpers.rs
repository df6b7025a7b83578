//! Path resolution helpers for the runner module.
//!
//! `-C/--directory` behaves like a working directory change for every path
//! given on the command line; these helpers apply it in one place. A bare
//! interpreter name is not a path and is left for the `PATH` search.

use crate::cli::Cli;
use crate::target::parent_or_current;
use crate::toolchain::anchor_program;
use anyhow::{Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use std::borrow::Cow;

use super::RunnerError;

/// Determine the Packfile path respecting the CLI's directory option.
pub(super) fn resolve_manifest_path(cli: &Cli) -> Result<Utf8PathBuf> {
    let resolved = resolve_cli_path(cli, &cli.file).into_owned();
    if resolved.file_name().is_none() {
        return Err(anyhow!("manifest path {resolved} has no file name"));
    }
    Ok(resolved)
}

/// Anchor a relative command-line path at `--directory`, if one was given.
pub(super) fn resolve_cli_path<'a>(cli: &Cli, path: &'a Utf8Path) -> Cow<'a, Utf8Path> {
    match &cli.directory {
        Some(dir) if path.is_relative() => Cow::Owned(dir.join(path)),
        _ => Cow::Borrowed(path),
    }
}

/// Anchor a command-line interpreter at `--directory` when it names a path.
///
/// Bare program names stay untouched so they are searched on `PATH`.
pub(super) fn resolve_cli_program(cli: &Cli, program: &Utf8Path) -> Utf8PathBuf {
    cli.directory.as_deref().map_or_else(
        || program.to_owned(),
        |dir| anchor_program(dir, program),
    )
}

pub(super) fn ensure_manifest_exists_or_error(
    cli: &Cli,
    manifest_path: &Utf8Path,
) -> Result<(), RunnerError> {
    if manifest_path.exists() {
        return Ok(());
    }
    let manifest_name = manifest_path
        .file_name()
        .unwrap_or(manifest_path.as_str())
        .to_owned();
    let directory = if cli.directory.is_some() {
        format!("directory {}", parent_or_current(manifest_path))
    } else {
        "the current directory".to_owned()
    };
    Err(RunnerError::ManifestNotFound {
        manifest_name,
        directory,
        path: manifest_path.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("packgen").chain(args.iter().copied()))
            .expect("parse cli")
    }

    #[rstest]
    #[case(&[], "Packfile")]
    #[case(&["-C", "mesa"], "mesa/Packfile")]
    #[case(&["-C", "mesa", "-f", "/abs/Packfile"], "/abs/Packfile")]
    #[case(&["-C", "mesa", "-f", "v3d/pack.yml"], "mesa/v3d/pack.yml")]
    fn manifest_path_honours_directory(#[case] args: &[&str], #[case] expected: &str) {
        let path = resolve_manifest_path(&cli(args)).expect("resolve");
        assert_eq!(path, Utf8PathBuf::from(expected));
    }

    #[rstest]
    #[case(&["-C", "mesa"], "python3", "python3")]
    #[case(&["-C", "mesa"], "tools/python3", "mesa/tools/python3")]
    #[case(&["-C", "mesa"], "/usr/bin/python3", "/usr/bin/python3")]
    #[case(&[], "tools/python3", "tools/python3")]
    fn interpreter_names_stay_on_path(
        #[case] args: &[&str],
        #[case] program: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            resolve_cli_program(&cli(args), Utf8Path::new(program)),
            Utf8PathBuf::from(expected)
        );
    }

    #[test]
    fn missing_manifest_mentions_directory() {
        let args = cli(&["-C", "/nonexistent/mesa"]);
        let path = resolve_manifest_path(&args).expect("resolve");
        let err = ensure_manifest_exists_or_error(&args, &path).expect_err("missing");
        assert_eq!(
            err.to_string(),
            "Packfile not found in directory /nonexistent/mesa"
        );
    }
}
