//! Generated header content and its atomic placement on disk.
//!
//! Content is written to a temporary file in the destination directory and
//! renamed over the output only once complete, so a failed or cancelled write
//! never leaves a truncated header behind. Destinations that already hold
//! identical bytes are left untouched.

use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use tempfile::Builder;
use tracing::debug;

use crate::error::IoFailure;
use crate::target::parent_or_current;

/// Hex-encoded SHA-256 digest of a header's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactDigest(String);

impl ArtifactDigest {
    /// Digest `content`.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Borrow the hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether persisting replaced the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// New content was renamed into place.
    Written,
    /// The destination already held identical bytes.
    Unchanged,
}

/// A header that has reached its output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifact {
    /// Destination path.
    pub output: Utf8PathBuf,
    /// Digest of the bytes on disk.
    pub digest: ArtifactDigest,
    /// Whether the file was rewritten.
    pub outcome: WriteOutcome,
}

/// Header bytes bound for an output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    output: Utf8PathBuf,
    content: Vec<u8>,
}

impl GeneratedArtifact {
    /// Pair `content` with its destination.
    #[must_use]
    pub fn new(output: impl Into<Utf8PathBuf>, content: Vec<u8>) -> Self {
        Self {
            output: output.into(),
            content,
        }
    }

    /// Destination path.
    #[must_use]
    pub fn output(&self) -> &Utf8Path {
        &self.output
    }

    /// Header bytes.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Digest of the header bytes.
    #[must_use]
    pub fn digest(&self) -> ArtifactDigest {
        ArtifactDigest::of(&self.content)
    }

    /// Write the content to its output path atomically.
    ///
    /// Missing parent directories are created. The temporary file lives next
    /// to the destination so the final rename never crosses filesystems.
    ///
    /// # Errors
    ///
    /// Returns an [`IoFailure`] when a directory cannot be created or the
    /// temporary file cannot be written, synced, or renamed. The destination
    /// is left as it was.
    pub fn persist(self) -> Result<PersistedArtifact, IoFailure> {
        let digest = self.digest();
        if matches_existing(&self.output, &self.content) {
            debug!(output = %self.output, "content unchanged; keeping existing header");
            return Ok(PersistedArtifact {
                output: self.output,
                digest,
                outcome: WriteOutcome::Unchanged,
            });
        }

        let parent = parent_or_current(&self.output);
        fs::create_dir_all(&parent)
            .map_err(|err| IoFailure::new("create directory", &parent, err))?;
        let mut tmp = Builder::new()
            .prefix(".packgen.")
            .suffix(".tmp")
            .tempfile_in(&parent)
            .map_err(|err| IoFailure::new("create temporary file in", &parent, err))?;
        write_synced(tmp.as_file_mut(), &self.content)
            .map_err(|err| IoFailure::new("write temporary file for", &self.output, err))?;
        tmp.persist(&self.output)
            .map_err(|err| IoFailure::new("rename into", &self.output, err.error))?;
        debug!(output = %self.output, bytes = self.content.len(), "wrote header");

        Ok(PersistedArtifact {
            output: self.output,
            digest,
            outcome: WriteOutcome::Written,
        })
    }
}

fn write_synced(file: &mut fs::File, content: &[u8]) -> io::Result<()> {
    file.write_all(content)?;
    file.flush()?;
    file.sync_all()
}

fn matches_existing(path: &Utf8Path, content: &[u8]) -> bool {
    let same_len = fs::metadata(path)
        .is_ok_and(|meta| meta.is_file() && meta.len() == content.len() as u64);
    same_len && fs::read(path).is_ok_and(|existing| existing == content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result, ensure};
    use std::time::{Duration, SystemTime};

    fn utf8_temp_dir() -> Result<(tempfile::TempDir, Utf8PathBuf)> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("non-UTF-8 temp dir {}", path.display()))?;
        Ok((temp, root))
    }

    #[test]
    fn persist_creates_parents_and_writes_bytes() -> Result<()> {
        let (_temp, root) = utf8_temp_dir()?;
        let output = root.join("cle/nested/pack.h");
        let artifact = GeneratedArtifact::new(output.clone(), b"#define X 1\n".to_vec());

        let persisted = artifact.persist()?;

        ensure!(persisted.outcome == WriteOutcome::Written, "expected write");
        let written = fs::read(&output).context("read output")?;
        ensure!(written == b"#define X 1\n", "unexpected bytes {written:?}");
        ensure!(
            persisted.digest == ArtifactDigest::of(b"#define X 1\n"),
            "digest mismatch"
        );
        Ok(())
    }

    #[test]
    fn persist_leaves_identical_content_untouched() -> Result<()> {
        let (_temp, root) = utf8_temp_dir()?;
        let output = root.join("pack.h");
        fs::write(&output, b"same").context("seed output")?;
        let old = SystemTime::now() - Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&output)
            .and_then(|file| file.set_modified(old))
            .context("backdate output")?;
        let before = fs::metadata(&output)
            .and_then(|meta| meta.modified())
            .context("read mtime")?;

        let persisted = GeneratedArtifact::new(output.clone(), b"same".to_vec()).persist()?;

        ensure!(persisted.outcome == WriteOutcome::Unchanged, "expected no write");
        let after = fs::metadata(&output)
            .and_then(|meta| meta.modified())
            .context("re-read mtime")?;
        ensure!(after == before, "mtime should be preserved");
        Ok(())
    }

    #[test]
    fn persist_replaces_different_content_and_cleans_temporaries() -> Result<()> {
        let (_temp, root) = utf8_temp_dir()?;
        let output = root.join("pack.h");
        fs::write(&output, b"old header").context("seed output")?;

        GeneratedArtifact::new(output.clone(), b"new".to_vec()).persist()?;

        ensure!(fs::read(&output)? == b"new", "content not replaced");
        let leftovers: Vec<_> = fs::read_dir(&root)?
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".packgen."))
            .collect();
        ensure!(leftovers.is_empty(), "temporary files left: {leftovers:?}");
        Ok(())
    }

    #[test]
    fn persist_reports_uncreatable_directory() -> Result<()> {
        let (_temp, root) = utf8_temp_dir()?;
        let blocker = root.join("blocker");
        fs::write(&blocker, b"file, not dir").context("create blocker")?;

        let err = GeneratedArtifact::new(blocker.join("pack.h"), b"x".to_vec())
            .persist()
            .expect_err("parent is a file");

        ensure!(err.action == "create directory", "unexpected action {}", err.action);
        ensure!(err.path == blocker, "unexpected path {}", err.path);
        Ok(())
    }
}
