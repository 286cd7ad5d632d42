//! Shared utilities for the scenecheck codebase

use std::io;
use std::process::{Command, Output, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// How long to wait for a killed process to be reaped.
const REAP_GRACE: Duration = Duration::from_secs(5);

/// Failure modes of [`run_cmd_with_timeout`].
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn command: {0}")]
    Spawn(io::Error),
    #[error("Failed to execute command: {0}")]
    Wait(io::Error),
    #[error("Command timed out after {0:?}")]
    TimedOut(Duration),
}

/// Kill a process and everything it spawned.
/// The child is started as the leader of its own process group, so SIGKILL
/// goes to the whole group (`uv run` forks the real interpreter).
#[cfg(unix)]
fn kill_process_tree(pid: u32) {
    // A negative pid addresses the process group
    let status = Command::new("kill")
        .args(["-9", "--", &format!("-{}", pid)])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if !matches!(status, Ok(s) if s.success()) {
        debug!("kill -9 -{} did not succeed: {:?}", pid, status);
    }
}

#[cfg(not(unix))]
fn kill_process_tree(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

/// Run a command with a timeout, killing the child process on expiry.
/// Spawns the command, waits up to `timeout` for it to finish and captures
/// stdout/stderr. On timeout the process group is killed and reaped before
/// returning, so nothing keeps running after the caller sees the error.
pub fn run_cmd_with_timeout(mut cmd: Command, timeout: Duration) -> Result<Output, CommandError> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(CommandError::Spawn)?;

    let pid = child.id();
    let (sender, receiver) = mpsc::channel();

    std::thread::spawn(move || {
        let result = child.wait_with_output();
        let _ = sender.send(result);
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result.map_err(CommandError::Wait),
        Err(RecvTimeoutError::Timeout) => {
            kill_process_tree(pid);
            if receiver.recv_timeout(REAP_GRACE).is_err() {
                warn!(
                    "Process {} was killed but not reaped within {:?}",
                    pid, REAP_GRACE
                );
            }
            Err(CommandError::TimedOut(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => {
            let err = io::Error::other("process waiter exited without a result");
            Err(CommandError::Wait(err))
        }
    }
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Python-style `str.title()`: upper-case the first letter of every run of
/// letters, lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(ch);
            prev_is_letter = false;
        }
    }
    out
}
