//! Error taxonomy for target materialization.
//!
//! Each failing target yields exactly one [`TargetError`]; a
//! [`MaterializeError`] aggregates them so callers see every failure from a
//! single build invocation at once.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. The unused_assignments lint fires in some
// Rust versions but not others, so `#[expect]` is not an option here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use std::io;
use thiserror::Error;

/// A filesystem operation that failed while producing or writing a header.
#[derive(Debug, Error)]
#[error("failed to {action} {path}: {source}")]
pub struct IoFailure {
    /// Short verb phrase describing the attempted operation.
    pub action: &'static str,
    /// Path the operation targeted.
    pub path: Utf8PathBuf,
    /// Underlying OS error.
    #[source]
    pub source: io::Error,
}

impl IoFailure {
    /// Record a failed `action` on `path`.
    #[must_use]
    pub fn new(action: &'static str, path: &Utf8Path, source: io::Error) -> Self {
        Self {
            action,
            path: path.to_owned(),
            source,
        }
    }
}

/// Failures raised while running the external generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The interpreter or script could not be launched.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program that was executed.
        program: Utf8PathBuf,
        /// Error reported by the operating system.
        #[source]
        source: io::Error,
    },
    /// The generator exited with a non-zero status.
    #[error("generator exited with status {code}: {stderr}")]
    Exit {
        /// Process exit code.
        code: i32,
        /// Captured standard error, trailing whitespace removed.
        stderr: String,
    },
    /// The generator was terminated by a signal.
    #[error("generator was terminated by a signal: {stderr}")]
    Signalled {
        /// Captured standard error, trailing whitespace removed.
        stderr: String,
    },
    /// Reading the generator's output streams or waiting on it failed.
    #[error("failed to collect generator output: {0}")]
    Capture(#[source] io::Error),
    /// The build was cancelled while the generator was running.
    #[error("generator run was cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Exit code reported by the generator, when it exited normally.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Standard error captured from the generator, if any was collected.
    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Exit { stderr, .. } | Self::Signalled { stderr } => Some(stderr.as_str()),
            _ => None,
        }
    }
}

/// Why a single generation target failed to materialize.
#[derive(Debug, Error, Diagnostic)]
pub enum TargetError {
    /// The target has no usable strategy.
    #[error("target `{target}` cannot be materialized: {reason}")]
    #[diagnostic(
        code(packgen::target::configuration),
        help("declare a `script` with an `xml` source, a `prebuilt` fallback, or both")
    )]
    Configuration {
        /// Logical target name.
        target: String,
        /// What is missing from the target's configuration.
        reason: &'static str,
    },
    /// The generator failed.
    #[error("generator for `{target}` failed: {source}")]
    #[diagnostic(code(packgen::target::generation))]
    Generation {
        /// Logical target name.
        target: String,
        /// Underlying generator failure.
        #[source]
        source: GenerationError,
    },
    /// Copying or writing the header failed.
    #[error("`{target}`: {source}")]
    #[diagnostic(code(packgen::target::io))]
    Io {
        /// Logical target name.
        target: String,
        /// Underlying filesystem failure.
        #[source]
        source: IoFailure,
    },
    /// The build was cancelled before the target finished.
    #[error("materialization of `{target}` was cancelled")]
    #[diagnostic(code(packgen::target::cancelled))]
    Cancelled {
        /// Logical target name.
        target: String,
    },
}

impl TargetError {
    /// Name of the target this error belongs to.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Configuration { target, .. }
            | Self::Generation { target, .. }
            | Self::Io { target, .. }
            | Self::Cancelled { target } => target,
        }
    }

    pub(crate) fn from_generation(target: &str, source: GenerationError) -> Self {
        match source {
            GenerationError::Cancelled => Self::Cancelled {
                target: target.to_owned(),
            },
            other => Self::Generation {
                target: target.to_owned(),
                source: other,
            },
        }
    }

    pub(crate) fn from_io(target: &str, source: IoFailure) -> Self {
        Self::Io {
            target: target.to_owned(),
            source,
        }
    }
}

/// Aggregate failure of a `materialize()` call.
///
/// Holds one entry per failed target, in declaration order. Targets that
/// succeeded are left on disk.
#[derive(Debug, Error, Diagnostic)]
#[error("{} of {} targets failed to materialize", .failures.len(), .total)]
#[diagnostic(code(packgen::materialize))]
pub struct MaterializeError {
    /// Number of targets the node attempted.
    pub total: usize,
    /// Per-target failures.
    #[related]
    pub failures: Vec<TargetError>,
}

/// Invalid node construction.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// The node was given no targets.
    #[error("a build graph node needs at least one generation target")]
    #[diagnostic(code(packgen::node::empty))]
    NoTargets,
    /// Two targets would write the same output.
    #[error("targets `{first}` and `{second}` both write {output}")]
    #[diagnostic(code(packgen::node::duplicate_output))]
    DuplicateOutput {
        /// Shared output path.
        output: Utf8PathBuf,
        /// Target declared first.
        first: String,
        /// Target declared later.
        second: String,
    },
}
