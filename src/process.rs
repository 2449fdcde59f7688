//! External process execution.
//!
//! Every external tool (svnlook, javac, checkstyle) is run through
//! [`ProcessRunner`]. Standard output and standard error are read
//! concurrently and both readers are joined before the exit status is
//! looked at, so a child blocked on a full stderr pipe can never deadlock
//! against a parent waiting on stdout. A deadline can be configured per
//! runner; the child is killed when it expires.

use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Errors that can occur while running an external process.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Where the standard output of a process goes.
#[derive(Debug)]
pub enum StdoutTarget {
    /// Capture it as lines.
    Capture,
    /// Stream it straight into a file.
    File(File),
    /// Throw it away.
    Discard,
}

/// Result of a finished process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout lines (empty unless [`StdoutTarget::Capture`]).
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs on a private single-threaded runtime.
pub struct ProcessRunner {
    runtime: tokio::runtime::Runtime,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Create a runner without a deadline.
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            timeout: None,
        })
    }

    /// Set the deadline applied to each process run.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `program` with `args` and wait for it to finish.
    pub fn run<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
        working_dir: Option<&Path>,
        stdout: StdoutTarget,
    ) -> Result<ProcessOutput, ProcessError> {
        let mut command = Command::new(program);
        command
            .args(args.iter().map(|a| a.as_ref()))
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }
        match stdout {
            StdoutTarget::Capture => command.stdout(Stdio::piped()),
            StdoutTarget::File(file) => command.stdout(Stdio::from(file)),
            StdoutTarget::Discard => command.stdout(Stdio::null()),
        };

        tracing::debug!(program, args = ?args.iter().map(|a| a.as_ref()).collect::<Vec<_>>(), "running");

        let timeout = self.timeout;
        self.runtime.block_on(async move {
            let execution = execute(command, program);
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, execution).await {
                    Ok(result) => result,
                    Err(_) => Err(ProcessError::Timeout {
                        program: program.to_string(),
                        timeout: limit,
                    }),
                },
                None => execution.await,
            }
        })
    }
}

async fn execute(mut command: Command, program: &str) -> Result<ProcessOutput, ProcessError> {
    let io_error = |source: std::io::Error| ProcessError::Io {
        program: program.to_string(),
        source,
    };

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr) = tokio::try_join!(read_lines(stdout), read_lines(stderr)).map_err(io_error)?;

    if !stderr.is_empty() {
        tracing::warn!(program, "got error output:\n{}", stderr.join("\n"));
    }

    let status = child.wait().await.map_err(io_error)?;

    Ok(ProcessOutput {
        code: status.code(),
        stdout,
        stderr,
    })
}

/// Read a stream to its end, split into lines. Invalid UTF-8 is replaced.
async fn read_lines<R: AsyncRead + Unpin>(stream: Option<R>) -> std::io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let Some(stream) = stream else {
        return Ok(lines);
    };

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(lines)
}
