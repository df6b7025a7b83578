//! Translates Packfile loading failures into actionable diagnostics.
//!
//! [`ManifestSource`] retains the YAML content and [`ManifestName`] labels
//! its origin so [`map_yaml_error`] can point at the offending line with a
//! [`miette`] source span. Later stages (version check, template rendering)
//! report through the remaining [`ManifestError`] variants.
//
// Module-level suppression for version-dependent lint false positives from
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
use semver::Version;
use std::{fmt, io};
use thiserror::Error;

mod yaml;

pub use yaml::map_yaml_error;

/// YAML source content for a manifest.
///
/// # Examples
/// ```rust
/// use packgen::manifest::ManifestSource;
/// let source = ManifestSource::from("mode: generate");
/// assert_eq!(source.as_str(), "mode: generate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestSource(String);

impl ManifestSource {
    /// Wrap a YAML buffer.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    /// View the stored source.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ManifestSource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ManifestSource {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Display name for a manifest used in diagnostics, usually its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManifestName(String);

impl ManifestName {
    /// Construct a label for the manifest being processed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Access the label.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ManifestName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ManifestName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ManifestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Which templated field of a generator entry failed to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateField {
    /// The `name` template.
    Name,
    /// The `output` template.
    Output,
    /// The `prebuilt` template.
    Prebuilt,
}

impl fmt::Display for TemplateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Output => "output",
            Self::Prebuilt => "prebuilt",
        })
    }
}

/// Error raised while loading or expanding a Packfile.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    /// The Packfile could not be read.
    #[error("failed to read {path}: {source}")]
    #[diagnostic(code(packgen::manifest::read))]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// YAML parsing or schema validation failed.
    #[error("failed to parse {name}")]
    #[diagnostic(code(packgen::manifest::parse))]
    Parse {
        /// Manifest label.
        name: ManifestName,
        /// Diagnostic carrying the source span.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },
    /// The manifest targets an incompatible schema.
    #[error("unsupported packgen_version {found}")]
    #[diagnostic(
        code(packgen::manifest::version),
        help("this build of packgen reads Packfiles with packgen_version 1.x")
    )]
    UnsupportedVersion {
        /// Version declared in the manifest.
        found: Version,
    },
    /// A generator entry lists no versions.
    #[error("generator entry #{index} declares no versions")]
    #[diagnostic(code(packgen::manifest::versions))]
    EmptyVersions {
        /// Zero-based index of the entry.
        index: usize,
    },
    /// A template failed to render.
    #[error("failed to render `{field}` of generator entry #{index} for version {version}")]
    #[diagnostic(code(packgen::manifest::template))]
    Template {
        /// Zero-based index of the entry.
        index: usize,
        /// Field being rendered.
        field: TemplateField,
        /// Version in scope.
        version: String,
        /// Renderer error.
        #[source]
        source: minijinja::Error,
    },
    /// No name could be derived for a target.
    #[error("generator entry #{index} needs a `name`: cannot derive one from `{output}`")]
    #[diagnostic(code(packgen::manifest::name))]
    Unnamed {
        /// Zero-based index of the entry.
        index: usize,
        /// Rendered output path.
        output: String,
    },
    /// Two expanded targets share a name.
    #[error("target name `{name}` is declared more than once")]
    #[diagnostic(
        code(packgen::manifest::duplicate_name),
        help("render the version into the `name` or `output` template")
    )]
    DuplicateName {
        /// The repeated name.
        name: String,
    },
}
