//! Running external tools (`kubectl`, `k3d`)

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{KubeError, Result};

/// Exit status and diagnostic text of one tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub status: Option<i32>,
    /// stdout followed by stderr, trimmed
    pub output: String,
    /// stdout alone, trimmed
    pub stdout: String,
}

impl ToolOutput {
    /// A successful result
    pub fn ok(output: impl Into<String>) -> Self {
        let output = output.into();
        Self {
            status: Some(0),
            stdout: output.clone(),
            output,
        }
    }

    /// A failed result with the given exit code
    pub fn failed(code: i32, output: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            output: output.into(),
            stdout: String::new(),
        }
    }

    /// Whether the tool exited with status 0
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Run `program` with `args` and capture its output.
///
/// Only a failure to start the process is an error; a non-zero exit is
/// reported through [`ToolOutput::success`].
pub async fn run_tool(program: &Path, args: &[String]) -> Result<ToolOutput> {
    tracing::debug!(program = %program.display(), ?args, "running tool");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| KubeError::ToolInvocation {
            program: program.display().to_string(),
            message: e.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let text = match (stdout.trim(), stderr.trim()) {
        (out, "") => out.to_string(),
        ("", err) => err.to_string(),
        (out, err) => format!("{}\n{}", out, err),
    };

    let result = ToolOutput {
        status: output.status.code(),
        output: text,
        stdout: stdout.trim().to_string(),
    };

    tracing::debug!(
        program = %program.display(),
        status = ?result.status,
        "tool finished"
    );

    Ok(result)
}

/// Render a timeout as a whole number of seconds for `--timeout` flags.
///
/// Rounds up so the tool never gets less than the remaining budget, and never
/// renders `0s`, which kubectl reads as "no timeout" for some commands.
pub fn format_timeout(timeout: Duration) -> String {
    let mut secs = timeout.as_secs();
    if timeout.subsec_nanos() > 0 {
        secs += 1;
    }
    format!("{}s", secs.max(1))
}

/// Render a command line for error messages
pub(crate) fn command_line(program: &Path, args: &[String]) -> String {
    let mut parts = vec![program.display().to_string()];
    parts.extend(args.iter().cloned());
    parts.join(" ")
}
