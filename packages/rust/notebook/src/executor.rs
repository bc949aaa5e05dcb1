//! Notebook execution collaborator.
//!
//! Execution is delegated to `jupyter nbconvert`, driven as a subprocess
//! with the notebook piped over stdin/stdout. The whole run is bounded by a
//! wall-clock deadline; on expiry the child is killed and the export aborts.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use nbsteps_shared::{NbStepsError, Result};

use crate::format;
use crate::model::Notebook;

/// Extra time granted on top of the per-cell timeout for kernel start-up and
/// nbconvert's own serialization.
const EXECUTION_GRACE: Duration = Duration::from_secs(30);

/// Max stderr characters echoed into an execution error.
const STDERR_TAIL_CHARS: usize = 2000;

/// Runs a notebook and returns the same document with outputs populated.
pub trait NotebookExecutor {
    fn execute(
        &self,
        notebook: &Notebook,
        working_dir: &Path,
        timeout: Duration,
    ) -> impl Future<Output = Result<Notebook>> + Send;
}

// ---------------------------------------------------------------------------
// Jupyter
// ---------------------------------------------------------------------------

/// Executes notebooks through `<command> nbconvert --execute`.
#[derive(Debug, Clone)]
pub struct JupyterExecutor {
    /// Program name, usually `jupyter`.
    pub command: String,
    /// Kernel passed as `ExecutePreprocessor.kernel_name`.
    pub kernel: String,
}

impl JupyterExecutor {
    pub fn new(command: impl Into<String>, kernel: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            kernel: kernel.into(),
        }
    }

    fn args(&self, timeout: Duration) -> Vec<String> {
        vec![
            "nbconvert".to_string(),
            "--to".to_string(),
            "notebook".to_string(),
            "--execute".to_string(),
            "--stdin".to_string(),
            "--stdout".to_string(),
            format!("--ExecutePreprocessor.timeout={}", timeout.as_secs()),
            format!("--ExecutePreprocessor.kernel_name={}", self.kernel),
        ]
    }
}

impl NotebookExecutor for JupyterExecutor {
    #[instrument(skip(self, notebook), fields(cmd = %self.command, kernel = %self.kernel, cells = notebook.cells.len()))]
    async fn execute(
        &self,
        notebook: &Notebook,
        working_dir: &Path,
        timeout: Duration,
    ) -> Result<Notebook> {
        let input = format::to_json(notebook)?;

        info!(dir = %working_dir.display(), timeout_secs = timeout.as_secs(), "executing notebook");

        let mut child = Command::new(&self.command)
            .args(self.args(timeout))
            .current_dir(working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                NbStepsError::execution(format!(
                    "failed to spawn `{}`: {e}. Is Jupyter installed?",
                    self.command
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| NbStepsError::execution("failed to capture nbconvert stdin"))?;
        stdin
            .write_all(input.as_bytes())
            .await
            .map_err(|e| NbStepsError::execution(format!("failed to write notebook to nbconvert: {e}")))?;
        // Close stdin so nbconvert sees EOF and starts executing.
        drop(stdin);

        let deadline = timeout + EXECUTION_GRACE;
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| NbStepsError::execution(format!("failed to wait for nbconvert: {e}")))?,
            Err(_) => {
                // Dropping the wait future drops the child, which kills it.
                warn!(deadline_secs = deadline.as_secs(), "notebook execution timed out");
                return Err(NbStepsError::execution(format!(
                    "notebook execution timed out after {}s",
                    deadline.as_secs()
                )));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(NbStepsError::execution(format!(
                "nbconvert exited with status {}: {}",
                output.status.code().unwrap_or(-1),
                stderr_tail(&stderr)
            )));
        }
        debug!(stderr = %stderr.trim(), "nbconvert finished");

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| NbStepsError::execution(format!("nbconvert produced non-UTF-8 output: {e}")))?;
        let executed = format::parse_str(&stdout)?;

        info!(cells = executed.cells.len(), "notebook executed");
        Ok(executed)
    }
}

/// Last `STDERR_TAIL_CHARS` characters of a stderr dump (tracebacks end there).
fn stderr_tail(stderr: &str) -> &str {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed;
    }
    let skip = count - STDERR_TAIL_CHARS;
    let start = trimmed
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &trimmed[start..]
}

// ---------------------------------------------------------------------------
// Passthrough
// ---------------------------------------------------------------------------

/// Returns the notebook unchanged, for exporting already-executed notebooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughExecutor;

impl NotebookExecutor for PassthroughExecutor {
    async fn execute(
        &self,
        notebook: &Notebook,
        _working_dir: &Path,
        _timeout: Duration,
    ) -> Result<Notebook> {
        debug!("execution skipped, using stored outputs");
        Ok(notebook.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;

    #[test]
    fn jupyter_args_carry_timeout_and_kernel() {
        let exec = JupyterExecutor::new("jupyter", "python3");
        let args = exec.args(Duration::from_secs(1200));
        assert_eq!(args[0], "nbconvert");
        assert!(args.contains(&"--execute".to_string()));
        assert!(args.contains(&"--stdin".to_string()));
        assert!(args.contains(&"--ExecutePreprocessor.timeout=1200".to_string()));
        assert!(args.contains(&"--ExecutePreprocessor.kernel_name=python3".to_string()));
    }

    #[test]
    fn stderr_tail_keeps_the_end() {
        assert_eq!(stderr_tail("  short \n"), "short");
        let long = format!("{}END", "x".repeat(STDERR_TAIL_CHARS * 2));
        let tail = stderr_tail(&long);
        assert_eq!(tail.chars().count(), STDERR_TAIL_CHARS);
        assert!(tail.ends_with("END"));
    }

    #[tokio::test]
    async fn passthrough_returns_input() {
        let nb = Notebook::new(vec![Cell::markdown("# Hi")]);
        let out = PassthroughExecutor
            .execute(&nb, Path::new("."), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(out, nb);
    }

    #[tokio::test]
    async fn missing_command_is_execution_error() {
        let exec = JupyterExecutor::new("nbsteps-no-such-binary-xyz", "python3");
        let nb = Notebook::new(vec![]);
        let err = exec
            .execute(&nb, Path::new("."), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, NbStepsError::Execution(_)));
        assert!(err.to_string().contains("failed to spawn"));
    }
}
