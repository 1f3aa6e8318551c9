//! Locating and running the external programs the pipeline shells out to.

use crate::error::{PipelineError, Result};
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Longest stderr excerpt carried in a [`ToolError::Failed`].
const STDERR_EXCERPT_CHARS: usize = 2000;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Find the first of `candidates` on PATH.
pub fn locate(candidates: &[&'static str], hint: &'static str) -> Result<PathBuf> {
    candidates
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or(PipelineError::MissingTool {
            tool: candidates.first().copied().unwrap_or("tool"),
            hint,
        })
}

/// Run `command` to completion, feeding it `input` on stdin.
///
/// The child is killed if it outlives `timeout`. A non-zero exit status is
/// an error carrying the tail of stderr.
pub async fn run(
    mut command: Command,
    input: Option<Vec<u8>>,
    timeout: Duration,
) -> std::result::Result<Output, ToolError> {
    let program = command
        .as_std()
        .get_program()
        .to_string_lossy()
        .into_owned();

    command
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    log::debug!("running {:?}", command.as_std());

    let mut child = command.spawn().map_err(|source| ToolError::Spawn {
        program: program.clone(),
        source,
    })?;

    let work = async move {
        if let (Some(bytes), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(&bytes).await?;
        }
        child.wait_with_output().await
    };

    let output = match tokio::time::timeout(timeout, work).await {
        Ok(result) => result.map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?,
        Err(_) => return Err(ToolError::TimedOut { program, timeout }),
    };

    if !output.status.success() {
        return Err(ToolError::Failed {
            program,
            status: output.status,
            stderr: stderr_excerpt(&output.stderr),
        });
    }

    Ok(output)
}

fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let total = text.chars().count();
    if total <= STDERR_EXCERPT_CHARS {
        return text.to_string();
    }
    text.chars().skip(total - STDERR_EXCERPT_CHARS).collect()
}
