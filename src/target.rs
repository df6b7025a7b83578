//! Generation targets and the build-wide mode that steers them.
//!
//! A [`GenerationTarget`] describes one header: where it lands, how the
//! generator would produce it, and which prebuilt copy may stand in for it.
//! Targets are plain data; deciding which route to take is the job of
//! [`crate::resolver`].
//!
//! ```
//! use packgen::target::GenerationTarget;
//!
//! let target = GenerationTarget::new("v42", "cle/v3d_packet_v42_pack.h", "42")
//!     .with_generator("gen_pack_header.py", "v3d_packet.xml")
//!     .with_flags(["--verbose"]);
//! assert!(target.has_generator());
//! assert!(target.prebuilt.is_none());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Build-wide choice between regenerating headers and copying prebuilt ones.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Run the generator whenever one is configured.
    #[default]
    Generate,
    /// Prefer prebuilt fallbacks wherever one is configured.
    Prebuilt,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generate => "generate",
            Self::Prebuilt => "prebuilt",
        })
    }
}

/// How a target will be materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Run the external generator and capture its output.
    Generate,
    /// Copy the prebuilt fallback verbatim.
    CopyFallback,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generate => "generate",
            Self::CopyFallback => "copy-fallback",
        })
    }
}

/// One header to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTarget {
    /// Logical name used in logs and error reports.
    pub name: String,
    /// Destination path of the header.
    pub output: Utf8PathBuf,
    /// Generator script, if the header can be regenerated.
    pub script: Option<Utf8PathBuf>,
    /// Flags passed to the script ahead of the positional arguments.
    pub flags: Vec<String>,
    /// XML packet description handed to the generator.
    pub xml: Option<Utf8PathBuf>,
    /// Hardware-version tag passed as the generator's last argument.
    pub version: String,
    /// Precomputed header that may replace generation.
    pub prebuilt: Option<Utf8PathBuf>,
}

impl GenerationTarget {
    /// Create a target with neither a generator nor a fallback configured.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        output: impl Into<Utf8PathBuf>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            script: None,
            flags: Vec::new(),
            xml: None,
            version: version.into(),
            prebuilt: None,
        }
    }

    /// Configure the generator script and its XML source.
    #[must_use]
    pub fn with_generator(
        mut self,
        script: impl Into<Utf8PathBuf>,
        xml: impl Into<Utf8PathBuf>,
    ) -> Self {
        self.script = Some(script.into());
        self.xml = Some(xml.into());
        self
    }

    /// Replace the generator flags.
    #[must_use]
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Configure the prebuilt fallback.
    #[must_use]
    pub fn with_prebuilt(mut self, prebuilt: impl Into<Utf8PathBuf>) -> Self {
        self.prebuilt = Some(prebuilt.into());
        self
    }

    /// Whether a generator script is configured.
    #[must_use]
    pub const fn has_generator(&self) -> bool {
        self.script.is_some()
    }

    /// Directory that holds the output header.
    ///
    /// A bare file name resolves to `.` so the result is always usable as an
    /// include root.
    #[must_use]
    pub fn output_dir(&self) -> Utf8PathBuf {
        parent_or_current(&self.output)
    }
}

pub(crate) fn parent_or_current(path: &Utf8Path) -> Utf8PathBuf {
    path.parent()
        .filter(|parent| !parent.as_str().is_empty())
        .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_owned)
}
