//! Detect whether the generator toolchain is reachable.
//!
//! The probe runs once per build, before any target is resolved, and its
//! answer is handed to the resolver as plain configuration. An interpreter
//! given as a path is checked directly; a bare program name is searched for
//! on `PATH`.

use camino::{Utf8Path, Utf8PathBuf};
use std::ffi::OsStr;
use std::{env, fs};
use tracing::debug;

/// Outcome of probing for the generator program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toolchain {
    /// The program resolved to an executable file.
    Available(Utf8PathBuf),
    /// No executable matched.
    Missing,
}

impl Toolchain {
    /// Whether the program was found.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Probe for `program` using the process `PATH`.
    #[must_use]
    pub fn probe(program: &Utf8Path) -> Self {
        Self::probe_in(program, env::var_os("PATH").as_deref())
    }

    /// Probe for `program`, searching `path` when it is a bare name.
    ///
    /// Empty `path` entries and non-UTF-8 entries are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use packgen::toolchain::Toolchain;
    ///
    /// let found = Toolchain::probe_in(Utf8Path::new("no-such-interpreter"), None);
    /// assert!(!found.is_available());
    /// ```
    #[must_use]
    pub fn probe_in(program: &Utf8Path, path: Option<&OsStr>) -> Self {
        let found = if is_direct_path(program) {
            is_executable(program).then(|| program.to_owned())
        } else {
            path.into_iter()
                .flat_map(env::split_paths)
                .filter(|dir| !dir.as_os_str().is_empty())
                .filter_map(|dir| Utf8PathBuf::from_path_buf(dir).ok())
                .map(|dir| dir.join(program))
                .find(|candidate| is_executable(candidate))
        };
        debug!(%program, found = ?found, "probed generator toolchain");
        found.map_or(Self::Missing, Self::Available)
    }
}

/// Anchor an interpreter at `base` when it names a path.
///
/// A bare program name such as `python3` is returned unchanged so it is
/// still looked up on `PATH`; `tools/python3` becomes `base/tools/python3`.
/// Absolute paths are kept as they are.
#[must_use]
pub fn anchor_program(base: &Utf8Path, program: &Utf8Path) -> Utf8PathBuf {
    if is_direct_path(program) {
        base.join(program)
    } else {
        program.to_owned()
    }
}

fn is_direct_path(program: &Utf8Path) -> bool {
    program.components().count() > 1 || program.is_absolute()
}

fn is_executable(path: &Utf8Path) -> bool {
    fs::metadata(path).is_ok_and(|metadata| metadata.is_file() && has_execute_permission(&metadata))
}

#[cfg(unix)]
fn has_execute_permission(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
const fn has_execute_permission(_metadata: &fs::Metadata) -> bool {
    true
}
