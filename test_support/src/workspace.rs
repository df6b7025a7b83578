//! Throwaway source trees for materialization tests.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use packgen_env::DEFAULT_MANIFEST;
use std::fs;
use tempfile::TempDir;

use crate::generator::{GeneratorStub, write_script};

/// A temporary directory with helpers for laying out generator inputs,
/// prebuilt headers, and a Packfile.
#[derive(Debug)]
pub struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    /// Create an empty workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created or its
    /// path is not UTF-8.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("create workspace directory")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow::anyhow!("non-UTF-8 temp dir {}", path.display()))?;
        Ok(Self { _dir: dir, root })
    }

    /// Workspace root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Resolve `relative` against the workspace root.
    #[must_use]
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or the file cannot be written.
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> Result<Utf8PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// Write an executable stub generator at `relative`.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be written.
    pub fn stub(&self, relative: &str, kind: GeneratorStub) -> Result<Utf8PathBuf> {
        let path = self.write(relative, "")?;
        write_script(&path, &kind.body())?;
        Ok(path)
    }

    /// Write the Packfile at the workspace root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn packfile(&self, yaml: &str) -> Result<Utf8PathBuf> {
        self.write(DEFAULT_MANIFEST, yaml)
    }

    /// Read the file at `relative`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(&self, relative: &str) -> Result<Vec<u8>> {
        let path = self.path(relative);
        fs::read(&path).with_context(|| format!("read {path}"))
    }

    /// Whether anything exists at `relative`.
    #[must_use]
    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// Names of entries in the directory at `relative`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn list(&self, relative: &str) -> Result<Vec<String>> {
        let path = self.path(relative);
        let mut names = fs::read_dir(&path)
            .with_context(|| format!("list {path}"))?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()
            .with_context(|| format!("read entries of {path}"))?;
        names.sort();
        Ok(names)
    }
}
