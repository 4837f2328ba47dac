//! Running an external tool and capturing its output.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::VcsError;

/// Run `program` with `args`, optionally inside `cwd`, and return its stdout.
///
/// Every invocation is logged before it starts. A non-zero exit status is
/// turned into [`VcsError::CommandFailed`] carrying the exit code and stderr.
pub async fn run_tool(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<String, VcsError> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    info!(cmd = %format!("{} {}", program, args.join(" ")), cwd = ?cwd, "executing command");
    let output = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VcsError::BinaryNotFound(program.to_string())
        } else {
            VcsError::IoError(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        let exit_code = output.status.code().unwrap_or(-1);
        warn!(program, exit_code, %stderr, "command failed");
        return Err(VcsError::CommandFailed {
            program: program.to_string(),
            exit_code,
            stderr,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    debug!(program, bytes = stdout.len(), "command succeeded");
    Ok(stdout)
}

/// Run `program --version` and return the first line of its output.
pub async fn tool_version(program: &str) -> Result<String, VcsError> {
    let output = run_tool(program, &["--version"], None).await?;
    Ok(output
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default()
        .trim()
        .to_string())
}
