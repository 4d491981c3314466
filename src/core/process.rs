//! Process execution utilities with timeout support
//!
//! yt-dlp and ffmpeg both run as child processes. Every invocation goes
//! through [`run_with_timeout`] so a hung tool cannot pin a request forever.

use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::core::error::AppError;

/// Runs `cmd` to completion, killing it once `timeout` elapses.
///
/// `program` only labels the timeout error. Stdout and stderr are captured.
pub async fn run_with_timeout(cmd: &mut Command, program: &str, timeout: Duration) -> Result<Output, AppError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(AppError::Io(e)),
        Err(_) => {
            log::error!("{} timed out after {}s, killed", program, timeout.as_secs());
            Err(AppError::Timeout {
                program: program.to_string(),
                secs: timeout.as_secs(),
            })
        }
    }
}

/// Returns the first line of `<program> <version_arg>`, or None when the
/// program cannot be executed.
pub async fn tool_version(program: &str, version_arg: &str) -> Option<String> {
    let mut cmd = Command::new(program);
    cmd.arg(version_arg);
    let output = run_with_timeout(&mut cmd, program, Duration::from_secs(10)).await.ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
}
