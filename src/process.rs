//! Bounded-time subprocess execution for git and OS credential tools.
//!
//! Stdout is redirected into an anonymous temp file rather than a pipe, so a
//! chatty child can never block on a full pipe while we wait on it.

use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to launch: {0}")]
    Spawn(io::Error),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("exited with status {0:?}")]
    Failed(Option<i32>),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Run `command` to completion, killing it once `timeout` elapses.
///
/// Returns stdout (lossily decoded) on a zero exit status.
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<String, RunError> {
    let mut sink = tempfile::tempfile()?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(sink.try_clone()?))
        .stderr(Stdio::null());

    let mut child = command.spawn().map_err(RunError::Spawn)?;

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunError::TimedOut(timeout));
        }
        Err(error) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RunError::Io(error));
        }
    };

    if !status.success() {
        return Err(RunError::Failed(status.code()));
    }

    sink.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    sink.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
