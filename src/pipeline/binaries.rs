//! Binary availability check: make sure every external tool resolves before
//! any prompt is shown or any file is touched.

use crate::error::Pdf2NotesError;
use std::path::PathBuf;
use tracing::debug;

/// Resolve each tool on the search path.
///
/// Bare names are looked up on `PATH`; names containing a path separator
/// are checked directly. Returns the resolved paths in input order, or
/// [`Pdf2NotesError::MissingBinary`] for the first tool that is absent.
pub fn check_binaries(names: &[&str]) -> Result<Vec<PathBuf>, Pdf2NotesError> {
    names
        .iter()
        .map(|name| {
            let path = which::which(name).map_err(|_| Pdf2NotesError::MissingBinary {
                name: name.to_string(),
            })?;
            debug!(tool = %name, path = %path.display(), "found external tool");
            Ok(path)
        })
        .collect()
}
