//! Copying prebuilt headers into place.

use camino::Utf8Path;
use std::fs;
use tracing::info;

use crate::artifact::{GeneratedArtifact, PersistedArtifact};
use crate::error::IoFailure;

/// Copies a prebuilt header verbatim to its output path.
///
/// The copy goes through [`GeneratedArtifact::persist`], so it is atomic and
/// creates missing directories. Only content is carried over; timestamps and
/// permissions are not.
pub struct FallbackCopier;

impl FallbackCopier {
    /// Copy `source` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns an [`IoFailure`] when `source` is missing or unreadable, or
    /// when the destination cannot be written.
    pub fn copy(source: &Utf8Path, destination: &Utf8Path) -> Result<PersistedArtifact, IoFailure> {
        let content =
            fs::read(source).map_err(|err| IoFailure::new("read prebuilt header", source, err))?;
        let persisted = GeneratedArtifact::new(destination, content).persist()?;
        info!(%source, %destination, "copied prebuilt header");
        Ok(persisted)
    }
}
