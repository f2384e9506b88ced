//! Blocking execution of external commands with an optional timeout.
//!
//! Each call drives the child on a private current-thread runtime, so callers stay synchronous.
//! A child that outlives its timeout is killed.

use std::{io, path::Path, process::Stdio, time::Duration};

use tokio::{io::AsyncWriteExt, process::Command, runtime::Builder};
use tracing::debug;

use crate::error::{DocsmithError, Result};

/// Locate `program` on `PATH`.
pub fn require_tool(program: &str) -> Result<()> {
    which::which(program)
        .map(|_| ())
        .map_err(|_| DocsmithError::ToolNotFound(program.to_string()))
}

/// Run `program` with `args`, optionally in `dir` and with `stdin` piped in, and return its
/// stdout.
///
/// A non-zero exit becomes [`DocsmithError::CommandFailed`] carrying the trimmed stderr, or stdout
/// when stderr is empty. Exceeding `timeout` becomes [`DocsmithError::CommandTimeout`].
pub fn run(
    program: &str,
    args: &[String],
    dir: Option<&Path>,
    stdin: Option<&str>,
    timeout: Option<Duration>,
) -> Result<String> {
    let command_line = display_command(program, args);
    debug!(command = %command_line, dir = ?dir, "running");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }

    let runtime = Builder::new_current_thread().enable_all().build()?;
    let output = runtime.block_on(async {
        let mut child = command.spawn()?;
        let input = child.stdin.take();
        let feed = async {
            if let (Some(mut pipe), Some(text)) = (input, stdin) {
                pipe.write_all(text.as_bytes()).await?;
                pipe.shutdown().await?;
            }
            Ok::<_, io::Error>(())
        };
        let work = async {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            match fed {
                // The child may exit without reading its input.
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
                _ => {}
            }
            output
        };
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                DocsmithError::CommandTimeout {
                    command: command_line.clone(),
                    timeout: limit,
                }
            })?,
            None => work.await,
        };
        result.map_err(DocsmithError::from)
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostic = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(DocsmithError::CommandFailed {
            command: command_line,
            output: diagnostic,
        });
    }
    Ok(stdout)
}

/// Render a command line for messages.
fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
