// src/process.rs

//! Bounded execution of external tools
//!
//! Every external command (rpm, dpkg-query, chkconfig, gpg) goes through
//! [`run_command`]. Key properties:
//!
//! - stdin is nulled so a tool never blocks waiting for a terminal
//! - stdout/stderr are drained on background threads, so large listings
//!   such as `rpm -qa` cannot fill the pipe and deadlock the child
//! - the child is killed once the timeout expires

use crate::error::{Error, Result};
use nix::errno::Errno;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Default timeout for external commands (5 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const SPAWN_RETRIES: u32 = 5;

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or -1 when terminated by a signal
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// Human-readable form of a command for logs and errors
pub fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run a command to completion, killing it if it exceeds `timeout`
///
/// A nonzero exit status is not an error here; callers decide what a
/// failed status means for them.
pub fn run_command(cmd: &mut Command, timeout: Duration) -> Result<CommandOutput> {
    let description = describe(cmd);
    debug!("Running: {}", description);

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = spawn(cmd)
        .map_err(|e| Error::CommandFailed(format!("Failed to run {}: {}", description, e)))?;

    let stdout_reader = child.stdout.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            warn!("{} timed out after {:?}, killing", description, timeout);
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Timeout {
                command: description,
                timeout,
            });
        }
    };

    let stdout = stdout_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    let stderr = stderr_reader
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    debug!("{} exited with {}", description, status);

    Ok(CommandOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

/// Spawn, retrying briefly while the executable is still open for writing
fn spawn(cmd: &mut Command) -> std::io::Result<Child> {
    let mut attempts = 0;
    loop {
        match cmd.spawn() {
            Err(e) if e.raw_os_error() == Some(Errno::ETXTBSY as i32) && attempts < SPAWN_RETRIES => {
                attempts += 1;
                thread::sleep(Duration::from_millis(50));
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_captures_output() {
        let out = run_command(
            Command::new("/bin/sh").args(["-c", "echo out; echo err >&2"]),
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[test]
    fn test_run_command_nonzero_is_not_error() {
        let out = run_command(
            Command::new("/bin/sh").args(["-c", "exit 3"]),
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(!out.success());
        assert_eq!(out.code(), 3);
    }

    #[test]
    fn test_run_command_timeout_kills() {
        let err = run_command(
            Command::new("/bin/sh").args(["-c", "sleep 30"]),
            Duration::from_millis(200),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Timeout { timeout, .. } if timeout == Duration::from_millis(200)));
        assert!(err.to_string().ends_with("timed out after 200ms"), "{}", err);
    }

    #[test]
    fn test_run_command_large_output() {
        // Larger than a pipe buffer; must not deadlock
        let out = run_command(
            Command::new("/bin/sh").args(["-c", "i=0; while [ $i -lt 20000 ]; do echo pkg$i; i=$((i+1)); done"]),
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(out.stdout.lines().count(), 20000);
    }

    #[test]
    fn test_run_command_missing_program() {
        let err = run_command(
            &mut Command::new("/nonexistent/tool"),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::CommandFailed(_)));
    }

    #[test]
    fn test_describe() {
        let mut cmd = Command::new("rpm");
        cmd.args(["-qa", "--queryformat", "%{NAME}"]);
        assert_eq!(describe(&cmd), "rpm -qa --queryformat %{NAME}");
    }
}
