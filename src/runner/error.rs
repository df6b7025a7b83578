//! Error types for the runner module.
//!
//! Kept in their own submodule so the derive-macro lint suppression stays
//! narrow.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others, so `#[expect]` is not an option here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised during command execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The Packfile does not exist at the expected path.
    #[error("{manifest_name} not found in {directory}")]
    #[diagnostic(
        code(packgen::runner::manifest_not_found),
        help("create a Packfile or pass its location with `--file`")
    )]
    ManifestNotFound {
        /// File name that was looked for.
        manifest_name: String,
        /// Human-readable description of the directory searched.
        directory: String,
        /// The path that was attempted.
        path: Utf8PathBuf,
    },
    /// A target named on the command line is not declared.
    #[error("unknown target `{name}`")]
    #[diagnostic(
        code(packgen::runner::unknown_target),
        help("run `packgen plan` to list declared targets")
    )]
    UnknownTarget {
        /// The requested name.
        name: String,
    },
    /// `plan` found targets that cannot be materialized.
    #[error("{count} target(s) have no usable strategy")]
    #[diagnostic(code(packgen::runner::unplannable))]
    Unplannable {
        /// Number of unresolved targets.
        count: usize,
    },
}
