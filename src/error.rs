//! Error types for the pdf2notes library.
//!
//! Every stage returns `Result<_, Pdf2NotesError>`; nothing in the library
//! terminates the process. The binary is the single place where an error
//! becomes exit status 1.
//!
//! A user declining an overwrite is *not* an error. It surfaces as
//! [`crate::convert::RunOutcome::Declined`] so callers can exit with status 0.

use std::path::PathBuf;
use thiserror::Error;

/// Broad failure categories, used for diagnostics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    /// A required external tool is not installed.
    Environment,
    /// No candidate files, bad selection, unreadable or non-PDF source.
    Input,
    /// Directory creation, listing, reading or writing failed.
    Filesystem,
    /// An external tool could not be launched, failed, timed out or was cancelled.
    Subprocess,
    /// Builder validation or an unexpected internal condition.
    Internal,
}

/// All fatal errors returned by the pdf2notes library.
#[derive(Debug, Error)]
pub enum Pdf2NotesError {
    // ── Environment errors ────────────────────────────────────────────────
    /// A required external binary does not resolve on the search path.
    #[error("{name} not installed\nInstall it or make sure it is on your PATH.")]
    MissingBinary { name: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The input directory has no file with the source extension.
    #[error("No files available: no '*.{extension}' files in '{dir}'")]
    NoInputFiles { dir: PathBuf, extension: String },

    /// The menu answer was not a non-negative integer.
    #[error("Invalid input {input:?}: expected the number of a listed file")]
    InvalidSelection { input: String },

    /// The menu answer was a number, but not one that was listed.
    #[error("Invalid input: {index} is out of range (valid: 0..{count})")]
    SelectionOutOfRange { index: usize, count: usize },

    /// Reading the user's answer from the console failed.
    #[error("Failed to read answer from console: {source}")]
    PromptFailed {
        #[source]
        source: std::io::Error,
    },

    /// The console input stream ended before an answer was given.
    #[error("Console input closed before an answer was given")]
    PromptClosed,

    /// Source file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the source file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Filesystem errors ─────────────────────────────────────────────────
    /// A working directory could not be created.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be listed.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The markup file could not be written.
    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The working set could not be removed after the run.
    #[error("Failed to remove working directory '{path}': {source}")]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rasterizer exited successfully but left no slide images behind.
    #[error("Rasterizer produced no slide images in '{dir}'")]
    NoSlidesProduced { dir: PathBuf },

    /// A slide image could not be probed for its dimensions.
    #[error("Could not read image '{path}': {detail}")]
    ImageProbeFailed { path: PathBuf, detail: String },

    /// A slide's width does not match the configured resize width.
    #[error("Slide '{path}' is {actual}px wide after resizing, expected {expected}px")]
    ResizeMismatch {
        path: PathBuf,
        expected: u32,
        actual: u32,
    },

    // ── Subprocess errors ─────────────────────────────────────────────────
    /// The external tool could not be started.
    #[error("Failed to launch '{tool}': {source}")]
    SpawnFailed {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran but exited unsuccessfully.
    #[error("'{tool}' failed ({}){}", exit_label(.code), stderr_suffix(.stderr))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The external tool ran longer than the configured timeout and was killed.
    #[error("'{tool}' timed out after {secs}s and was killed")]
    ToolTimeout { tool: String, secs: u64 },

    /// The run was cancelled while `tool` was running (or about to run).
    #[error("Cancelled while running '{tool}'")]
    Cancelled { tool: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2NotesError {
    /// The failure category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use Pdf2NotesError::*;
        match self {
            MissingBinary { .. } => ErrorKind::Environment,
            NoInputFiles { .. }
            | InvalidSelection { .. }
            | SelectionOutOfRange { .. }
            | PromptFailed { .. }
            | PromptClosed
            | FileNotFound { .. }
            | PermissionDenied { .. }
            | NotAPdf { .. } => ErrorKind::Input,
            CreateDirFailed { .. }
            | ReadDirFailed { .. }
            | WriteFailed { .. }
            | RemoveFailed { .. }
            | NoSlidesProduced { .. }
            | ImageProbeFailed { .. }
            | ResizeMismatch { .. } => ErrorKind::Filesystem,
            SpawnFailed { .. } | ToolFailed { .. } | ToolTimeout { .. } | Cancelled { .. } => {
                ErrorKind::Subprocess
            }
            InvalidConfig(_) | Internal(_) => ErrorKind::Internal,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {c}"),
        None => "terminated by signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
