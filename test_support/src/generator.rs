//! Stub generator scripts.
//!
//! Each stub is a small POSIX shell script honouring the generator calling
//! convention `script [flags...] xml version`. They let tests exercise process
//! handling without Python or a real packet description.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use std::io::Write;
use tempfile::TempDir;

/// Behaviour of a stub generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorStub {
    /// Print `HEADER-<version>` with no trailing newline and exit 0.
    EchoVersion,
    /// Print every argument on its own line and exit 0.
    EchoArgs,
    /// Write `stderr` to standard error and exit with `code`.
    Fail {
        /// Exit status.
        code: i32,
        /// Text written to standard error.
        stderr: &'static str,
    },
    /// Print part of a header to stdout, then fail with `boom` and status 1.
    PartialThenFail,
    /// Replace the shell with `sleep` for `seconds`.
    Sleep {
        /// How long to sleep.
        seconds: u32,
    },
}

impl GeneratorStub {
    pub(crate) fn body(self) -> String {
        match self {
            Self::EchoVersion => concat!(
                "eval \"version=\\${$#}\"\n",
                "printf 'HEADER-%s' \"$version\"\n",
            )
            .to_owned(),
            Self::EchoArgs => "for arg in \"$@\"; do printf '%s\\n' \"$arg\"; done\n".to_owned(),
            Self::Fail { code, stderr } => {
                format!("printf '%s\\n' '{stderr}' >&2\nexit {code}\n")
            }
            Self::PartialThenFail => concat!(
                "printf '#ifndef PARTIAL_H\\n'\n",
                "printf 'boom\\n' >&2\n",
                "exit 1\n",
            )
            .to_owned(),
            Self::Sleep { seconds } => format!("exec sleep {seconds}\n"),
        }
    }
}

/// A stub script living in its own temporary directory.
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct StubScript {
    _dir: TempDir,
    script: Utf8PathBuf,
}

impl StubScript {
    /// Path to the executable script.
    #[must_use]
    pub fn script(&self) -> &Utf8Path {
        &self.script
    }
}

/// Write an executable stub generator with the given behaviour.
///
/// # Errors
///
/// Returns an error if the temporary directory or script cannot be created.
///
/// # Examples
///
/// ```rust,no_run
/// use test_support::{GeneratorStub, stub_generator};
///
/// let stub = stub_generator(GeneratorStub::EchoVersion).expect("stub");
/// assert!(stub.script().exists());
/// ```
pub fn stub_generator(kind: GeneratorStub) -> Result<StubScript> {
    let dir = TempDir::new().context("create stub generator directory")?;
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|path| anyhow::anyhow!("non-UTF-8 temp dir {}", path.display()))?;
    let script = root.join("gen_pack_header.sh");
    write_script(&script, &kind.body())?;
    Ok(StubScript { _dir: dir, script })
}

/// Write `body` to `path` behind a `/bin/sh` shebang and mark it executable.
///
/// # Errors
///
/// Returns an error if the file cannot be written or its permissions changed.
pub fn write_script(path: &Utf8Path, body: &str) -> Result<()> {
    {
        let mut file = File::create(path).with_context(|| format!("create {path}"))?;
        write!(file, "#!/bin/sh\n{body}").with_context(|| format!("write {path}"))?;
        file.sync_all().with_context(|| format!("sync {path}"))?;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)
            .with_context(|| format!("stat {path}"))?
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).with_context(|| format!("chmod {path}"))?;
    }
    Ok(())
}
