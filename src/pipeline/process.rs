//! Running external tools with a timeout and a cancellation token.
//!
//! Every subprocess is awaited to completion before the next stage starts.
//! A run can still be stopped from outside: the [`CancelToken`] is checked
//! before launch and raced against the child while it runs. On timeout or
//! cancellation the child is killed (`kill_on_drop`) and an error returned,
//! so a hung rasterizer no longer hangs the whole pipeline forever.

use crate::config::ToolCommand;
use crate::error::Pdf2NotesError;
use std::ffi::OsString;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, warn};

/// A cloneable flag that asks in-flight and future tool runs to stop.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // `tx` lives as long as `self`, so `changed()` cannot report a closed channel.
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Captured result of a successful tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `tool` with `args` appended to its base arguments.
///
/// Non-zero exit → [`Pdf2NotesError::ToolFailed`] carrying stderr;
/// launch failure → [`Pdf2NotesError::SpawnFailed`]; deadline →
/// [`Pdf2NotesError::ToolTimeout`]; cancellation → [`Pdf2NotesError::Cancelled`].
pub async fn run_tool(
    tool: &ToolCommand,
    args: &[OsString],
    timeout: Option<Duration>,
    cancel: &CancelToken,
) -> Result<ToolOutput, Pdf2NotesError> {
    let name = tool.program.clone();

    if cancel.is_cancelled() {
        return Err(Pdf2NotesError::Cancelled { tool: name });
    }

    let mut cmd = Command::new(&tool.program);
    cmd.args(&tool.base_args)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(command = ?cmd, "launching external tool");

    let child = cmd.spawn().map_err(|source| Pdf2NotesError::SpawnFailed {
        tool: name.clone(),
        source,
    })?;

    let deadline = async {
        match timeout {
            Some(t) => tokio::time::sleep(t).await,
            None => std::future::pending::<()>().await,
        }
    };

    // Dropping the `wait_with_output` future drops the child, which kills it.
    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!(tool = %name, "cancelled; killing external tool");
            return Err(Pdf2NotesError::Cancelled { tool: name });
        }
        _ = deadline => {
            let secs = timeout.map(|t| t.as_secs()).unwrap_or_default();
            warn!(tool = %name, timeout_secs = secs, "external tool timed out; killing it");
            return Err(Pdf2NotesError::ToolTimeout { tool: name, secs });
        }
        result = child.wait_with_output() => {
            result.map_err(|source| Pdf2NotesError::SpawnFailed { tool: name.clone(), source })?
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(Pdf2NotesError::ToolFailed {
            tool: name,
            code: output.status.code(),
            stderr,
        });
    }

    debug!(
        tool = %name,
        stdout_len = stdout.len(),
        stderr_len = stderr.len(),
        "external tool finished"
    );
    Ok(ToolOutput { stdout, stderr })
}
