//! Running the external packing-header generator.
//!
//! The generator is invoked as `[interpreter] script [flags...] xml version`.
//! Standard output becomes the header; standard error is kept for
//! diagnostics. Both pipes are drained on helper threads while the caller
//! waits, so a chatty generator cannot deadlock on a full pipe.

use camino::{Utf8Path, Utf8PathBuf};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};
use wait_timeout::ChildExt;

use crate::artifact::GeneratedArtifact;
use crate::cancel::CancellationToken;
use crate::error::GenerationError;

/// How often a running generator is checked for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Inputs for one generator run.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorRequest<'a> {
    /// Generator script.
    pub script: &'a Utf8Path,
    /// Flags placed before the positional arguments.
    pub flags: &'a [String],
    /// XML packet description.
    pub xml: &'a Utf8Path,
    /// Hardware-version tag.
    pub version: &'a str,
}

/// Launches the generator and captures its output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorInvoker {
    interpreter: Option<Utf8PathBuf>,
}

impl GeneratorInvoker {
    /// Run scripts through `interpreter`, or directly when `None`.
    #[must_use]
    pub const fn new(interpreter: Option<Utf8PathBuf>) -> Self {
        Self { interpreter }
    }

    /// Interpreter used to launch scripts, if any.
    #[must_use]
    pub fn interpreter(&self) -> Option<&Utf8Path> {
        self.interpreter.as_deref()
    }

    /// Program that is actually executed for `request`.
    #[must_use]
    pub fn program<'a>(&'a self, request: &GeneratorRequest<'a>) -> &'a Utf8Path {
        self.interpreter.as_deref().unwrap_or(request.script)
    }

    /// Full argument vector, program first.
    ///
    /// ```
    /// use packgen::generator::{GeneratorInvoker, GeneratorRequest};
    /// use camino::Utf8Path;
    ///
    /// let invoker = GeneratorInvoker::new(Some("python3".into()));
    /// let flags = vec!["--quiet".to_owned()];
    /// let request = GeneratorRequest {
    ///     script: Utf8Path::new("gen_pack_header.py"),
    ///     flags: &flags,
    ///     xml: Utf8Path::new("v3d_packet.xml"),
    ///     version: "42",
    /// };
    /// assert_eq!(
    ///     invoker.command_line(&request),
    ///     ["python3", "gen_pack_header.py", "--quiet", "v3d_packet.xml", "42"],
    /// );
    /// ```
    #[must_use]
    pub fn command_line(&self, request: &GeneratorRequest<'_>) -> Vec<String> {
        let mut argv = Vec::with_capacity(request.flags.len() + 4);
        if let Some(interpreter) = &self.interpreter {
            argv.push(interpreter.to_string());
        }
        argv.push(request.script.to_string());
        argv.extend(request.flags.iter().cloned());
        argv.push(request.xml.to_string());
        argv.push(request.version.to_owned());
        argv
    }

    /// [`Self::command_line`] joined into one shell-quoted string, for logs
    /// and plans.
    #[must_use]
    pub fn shell_command(&self, request: &GeneratorRequest<'_>) -> String {
        let argv = self.command_line(request);
        shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
    }

    /// Run the generator and return its standard output as an artifact
    /// destined for `output`.
    ///
    /// Nothing is written to disk here; callers persist the artifact once the
    /// run has succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Spawn`] when the program cannot be started,
    /// [`GenerationError::Exit`] or [`GenerationError::Signalled`] when it
    /// fails, [`GenerationError::Capture`] when its output cannot be read, and
    /// [`GenerationError::Cancelled`] when `cancel` fires first.
    pub fn invoke(
        &self,
        request: &GeneratorRequest<'_>,
        output: &Utf8Path,
        cancel: &CancellationToken,
    ) -> Result<GeneratedArtifact, GenerationError> {
        let program = self.program(request);
        let mut cmd = self.build_command(request);
        info!("Running generator: {}", self.shell_command(request));

        let child = cmd.spawn().map_err(|source| GenerationError::Spawn {
            program: program.to_owned(),
            source,
        })?;
        let captured = capture_output(child, cancel)?;
        let stderr = String::from_utf8_lossy(&captured.stderr)
            .trim_end()
            .to_owned();
        if !stderr.is_empty() {
            debug!(%output, %stderr, "generator diagnostics");
        }

        if captured.status.success() {
            info!(%output, version = request.version, "generator succeeded");
            Ok(GeneratedArtifact::new(output, captured.stdout))
        } else if let Some(code) = captured.status.code() {
            Err(GenerationError::Exit { code, stderr })
        } else {
            Err(GenerationError::Signalled { stderr })
        }
    }

    fn build_command(&self, request: &GeneratorRequest<'_>) -> Command {
        let mut cmd = match &self.interpreter {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(request.script);
                cmd
            }
            None => Command::new(request.script),
        };
        cmd.args(request.flags)
            .arg(request.xml)
            .arg(request.version)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

struct CapturedOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn capture_output(
    mut child: Child,
    cancel: &CancellationToken,
) -> Result<CapturedOutput, GenerationError> {
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        terminate_child(&mut child, "pipe unavailable");
        return Err(GenerationError::Capture(io::Error::other(
            "generator process is missing a stdout or stderr pipe",
        )));
    };
    let out_reader = spawn_reader(stdout);
    let err_reader = spawn_reader(stderr);

    let status = match wait_or_cancel(&mut child, cancel) {
        Ok(Some(status)) => status,
        // Reader threads are detached: a grandchild may still hold the pipes
        // open and joining would block until it exits.
        Ok(None) => return Err(GenerationError::Cancelled),
        Err(err) => {
            terminate_child(&mut child, "wait failure");
            return Err(GenerationError::Capture(err));
        }
    };

    let stdout_bytes = join_reader(out_reader)?;
    let stderr_bytes = join_reader(err_reader)?;
    Ok(CapturedOutput {
        status,
        stdout: stdout_bytes,
        stderr: stderr_bytes,
    })
}

fn spawn_reader<R>(mut stream: R) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(handle: JoinHandle<io::Result<Vec<u8>>>) -> Result<Vec<u8>, GenerationError> {
    match handle.join() {
        Ok(result) => result.map_err(GenerationError::Capture),
        Err(_) => Err(GenerationError::Capture(io::Error::other(
            "generator output reader panicked",
        ))),
    }
}

/// Wait for `child`, returning `None` if cancellation won the race.
fn wait_or_cancel(
    child: &mut Child,
    cancel: &CancellationToken,
) -> io::Result<Option<ExitStatus>> {
    loop {
        if cancel.is_cancelled() {
            terminate_child(child, "cancellation");
            return Ok(None);
        }
        if let Some(status) = child.wait_timeout(CANCEL_POLL_INTERVAL)? {
            return Ok(Some(status));
        }
    }
}

fn terminate_child(child: &mut Child, context: &str) {
    if let Err(err) = child.kill() {
        debug!("failed to kill generator after {context}: {err}");
    }
    if let Err(err) = child.wait() {
        debug!("failed to reap generator after {context}: {err}");
    }
}
