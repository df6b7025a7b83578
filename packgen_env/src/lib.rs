#![forbid(unsafe_code)]

//! Shared environment constants used across packgen crates (library, tests,
//! and helpers).

/// Environment variable override for the generator interpreter.
///
/// When set, its value replaces the `interpreter` declared in the Packfile.
/// An explicit `--interpreter` flag still takes precedence.
///
/// # Examples
///
/// ```
/// use packgen_env::INTERPRETER_ENV;
/// assert_eq!(INTERPRETER_ENV, "PACKGEN_INTERPRETER");
/// ```
pub const INTERPRETER_ENV: &str = "PACKGEN_INTERPRETER";

/// Default name of the manifest read by the `packgen` binary.
pub const DEFAULT_MANIFEST: &str = "Packfile";
