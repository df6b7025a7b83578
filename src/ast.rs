//! Packfile abstract syntax tree.
//!
//! These structures mirror the YAML schema of a `Packfile` and are
//! deserialised with `serde_saphyr`. They hold the manifest exactly as
//! written: templates are unrendered and paths are relative to the Packfile.
//! [`crate::manifest`] turns them into concrete generation targets.
//!
//! ```rust
//! use packgen::ast::{Packfile, StringOrList};
//!
//! let yaml = concat!(
//!     "packgen_version: \"1.0.0\"\n",
//!     "generators:\n",
//!     "  - script: gen_pack_header.py\n",
//!     "    xml: v3d_packet.xml\n",
//!     "    output: \"cle/v3d_packet_v{{ version }}_pack.h\"\n",
//!     "    versions: [\"33\", \"42\"]\n",
//! );
//! let packfile: Packfile = serde_saphyr::from_str(yaml).expect("parse");
//! assert_eq!(packfile.generators.len(), 1);
//! assert!(matches!(packfile.generators[0].versions, StringOrList::List(_)));
//! ```

use camino::Utf8PathBuf;
use semver::Version;
use serde::Deserialize;
use std::fmt;

use crate::target::BuildMode;

fn default_output_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("build")
}

/// Top-level structure parsed from a `Packfile`.
///
/// ```yaml
/// packgen_version: "1.0.0"
/// mode: generate
/// interpreter: python3
/// output_dir: build
/// prebuilt_dir: prebuilt
/// include_dirs: [include]
/// generators:
///   - script: gen_pack_header.py
///     xml: v3d_packet.xml
///     output: "cle/v3d_packet_v{{ version }}_pack.h"
///     prebuilt: "cle/v3d_packet_v{{ version }}_pack.h"
///     versions: ["21", "33", "42", "71"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Packfile {
    /// Schema version of the manifest.
    pub packgen_version: Version,
    /// Build-wide strategy preference.
    #[serde(default)]
    pub mode: BuildMode,
    /// Program that runs generator scripts. When absent, scripts are
    /// executed directly.
    #[serde(default)]
    pub interpreter: Option<Utf8PathBuf>,
    /// Root for generated headers, relative to the Packfile.
    #[serde(default = "default_output_dir")]
    pub output_dir: Utf8PathBuf,
    /// Root for prebuilt fallbacks, relative to the Packfile. Defaults to the
    /// Packfile directory.
    #[serde(default)]
    pub prebuilt_dir: Option<Utf8PathBuf>,
    /// Statically exported include roots, relative to the Packfile.
    #[serde(default)]
    pub include_dirs: Vec<Utf8PathBuf>,
    /// Generator table; each entry expands to one target per version.
    pub generators: Vec<GeneratorEntry>,
}

/// One row of the generator table.
///
/// `name`, `output` and `prebuilt` are MiniJinja templates rendered once per
/// version with `version` in scope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorEntry {
    /// Target name template. Defaults to the output file stem.
    #[serde(default)]
    pub name: Option<String>,
    /// Generator script, relative to the Packfile.
    #[serde(default)]
    pub script: Option<Utf8PathBuf>,
    /// Flags passed ahead of the positional arguments.
    #[serde(default)]
    pub flags: Vec<String>,
    /// XML packet description, relative to the Packfile.
    #[serde(default)]
    pub xml: Option<Utf8PathBuf>,
    /// Output path template, relative to `output_dir`.
    pub output: String,
    /// Fallback path template, relative to `prebuilt_dir`.
    #[serde(default)]
    pub prebuilt: Option<String>,
    /// Hardware versions to expand.
    pub versions: StringOrList<VersionTag>,
}

/// A hardware-version tag written either as a string or as a bare integer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VersionTag {
    /// Unquoted integer such as `42`.
    Number(u64),
    /// Any other scalar, such as `"42"` or `v3d-7.1`.
    Text(String),
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A single value or a list of values.
///
/// ```yaml
/// # Scalar
/// versions: "42"
/// # Sequence
/// versions:
///   - "33"
///   - "42"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StringOrList<T> {
    /// A single item.
    String(T),
    /// A list of items.
    List(Vec<T>),
}

impl<T> StringOrList<T> {
    /// Items in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::String(item) => std::slice::from_ref(item),
            Self::List(items) => items,
        }
    }
}
