//! Writing command results to standard output.
//!
//! Output is commonly piped into `head` or a build script; a closed pipe is
//! treated as success rather than an error.

use anyhow::{Context, Result};
use std::io::{self, Write};

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn write_lines_ignoring_broken_pipe<W, I, S>(writer: &mut W, lines: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let result = lines
        .into_iter()
        .try_for_each(|line| writeln!(writer, "{}", line.as_ref()))
        .and_then(|()| writer.flush());
    match result {
        Err(err) if is_broken_pipe(&err) => Ok(()),
        other => other,
    }
}

/// Print `lines` to stdout, one per line.
pub(super) fn write_stdout_lines<I, S>(lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut stdout = io::stdout().lock();
    write_lines_ignoring_broken_pipe(&mut stdout, lines).context("failed to write to stdout")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lines_are_newline_terminated() {
        let mut buf = Vec::new();
        write_lines_ignoring_broken_pipe(&mut buf, ["build/cle", "include"]).expect("write");
        assert_eq!(buf, b"build/cle\ninclude\n");
    }

    #[test]
    fn broken_pipe_is_not_an_error() {
        assert!(write_lines_ignoring_broken_pipe(&mut ClosedPipe, ["x"]).is_ok());
    }
}
