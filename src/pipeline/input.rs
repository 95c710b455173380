//! Input selection: list candidate PDFs, ask the user for one, and validate it.
//!
//! There is no retry loop. An unparsable or out-of-range answer is an error
//! and the run ends; the user simply starts the tool again.

use crate::console::Console;
use crate::error::Pdf2NotesError;
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated source PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    path: PathBuf,
}

impl SourceDocument {
    /// Validate that `path` exists, is readable, and starts with the `%PDF`
    /// magic bytes.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Pdf2NotesError> {
        let path = path.into();

        if !path.is_file() {
            return Err(Pdf2NotesError::FileNotFound { path });
        }

        match std::fs::File::open(&path) {
            Ok(mut f) => {
                let mut magic = [0u8; 4];
                if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                    return Err(Pdf2NotesError::NotAPdf { path, magic });
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(Pdf2NotesError::PermissionDenied { path });
            }
            Err(_) => {
                return Err(Pdf2NotesError::FileNotFound { path });
            }
        }

        debug!("Resolved source PDF: {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name as shown in the menu and used for the working directory.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// List regular files in `dir` whose extension is exactly `extension`,
/// sorted by file name.
pub fn list_candidates(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Pdf2NotesError> {
    let entries = std::fs::read_dir(dir).map_err(|source| Pdf2NotesError::ReadDirFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Pdf2NotesError::ReadDirFailed {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_match = path.extension().is_some_and(|e| e == extension);
        if is_match && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Parse the user's menu answer into an index in `0..count`.
pub fn parse_selection(input: &str, count: usize) -> Result<usize, Pdf2NotesError> {
    let trimmed = input.trim();
    let index: usize = trimmed
        .parse()
        .map_err(|_| Pdf2NotesError::InvalidSelection {
            input: trimmed.to_string(),
        })?;
    if index >= count {
        return Err(Pdf2NotesError::SelectionOutOfRange { index, count });
    }
    Ok(index)
}

/// Print the 0-indexed menu of `candidates`.
pub fn print_menu<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    extension: &str,
    candidates: &[PathBuf],
) -> Result<(), Pdf2NotesError> {
    console.println(&format!("Available {extension} files:"))?;
    for (index, path) in candidates.iter().enumerate() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        console.println(&format!("[{index}] {name}"))?;
    }
    Ok(())
}

/// Interactively choose a source file from `dir`.
pub fn select_source<R: BufRead, W: Write>(
    dir: &Path,
    extension: &str,
    console: &mut Console<R, W>,
) -> Result<SourceDocument, Pdf2NotesError> {
    let candidates = list_candidates(dir, extension)?;
    if candidates.is_empty() {
        console.println("No files available.")?;
        return Err(Pdf2NotesError::NoInputFiles {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    print_menu(console, extension, &candidates)?;
    let answer = console.ask("\nSelect a file: ")?;

    let index = match parse_selection(&answer, candidates.len()) {
        Ok(i) => i,
        Err(e) => {
            console.println("Invalid input. Please try again.")?;
            return Err(e);
        }
    };

    SourceDocument::open(&candidates[index])
}
