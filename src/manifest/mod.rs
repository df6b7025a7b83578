//! Packfile loading.
//!
//! A Packfile is parsed straight into [`Packfile`] so schema errors keep
//! their source location, then checked for a supported `packgen_version`.
//! [`expand`] renders the generator table into concrete targets.

use camino::Utf8Path;
use std::fs;
use tracing::debug;

use crate::ast::Packfile;

mod diagnostics;
mod expand;
mod hints;

pub use diagnostics::{ManifestError, ManifestName, ManifestSource, TemplateField, map_yaml_error};
pub use expand::{Expansion, expand};

/// Major schema version this build understands.
pub const SUPPORTED_MAJOR: u64 = 1;

/// Parse a Packfile labelled `name` in diagnostics.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] for malformed YAML or schema violations
/// and [`ManifestError::UnsupportedVersion`] for a version other than 1.x.
pub fn from_str_named(yaml: &str, name: &ManifestName) -> Result<Packfile, ManifestError> {
    let packfile: Packfile = serde_saphyr::from_str(yaml).map_err(|err| ManifestError::Parse {
        source: map_yaml_error(err, &ManifestSource::from(yaml), name),
        name: name.clone(),
    })?;
    if packfile.packgen_version.major != SUPPORTED_MAJOR {
        return Err(ManifestError::UnsupportedVersion {
            found: packfile.packgen_version,
        });
    }
    Ok(packfile)
}

/// Parse a Packfile from a string.
///
/// # Errors
///
/// See [`from_str_named`].
pub fn from_str(yaml: &str) -> Result<Packfile, ManifestError> {
    from_str_named(yaml, &ManifestName::new(packgen_env::DEFAULT_MANIFEST))
}

/// Load a Packfile from `path`.
///
/// # Errors
///
/// Returns [`ManifestError::Read`] when the file cannot be read, otherwise
/// see [`from_str_named`].
pub fn from_path(path: &Utf8Path) -> Result<Packfile, ManifestError> {
    let data = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_owned(),
        source,
    })?;
    debug!(manifest = %path, bytes = data.len(), "read Packfile");
    from_str_named(&data, &ManifestName::new(path.as_str()))
}
