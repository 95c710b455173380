//! Overwrite guard: never replace an existing output without an explicit "yes".

use crate::console::Console;
use crate::error::Pdf2NotesError;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::info;

/// The only answer that allows an existing file to be replaced.
pub const AFFIRMATIVE: &str = "yes";

/// Outcome of the overwrite check for one output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The path is free, or the user agreed to replace it.
    Proceed,
    /// The path exists and the user did not answer `yes`.
    Declined,
}

/// Ask before replacing `path`.
///
/// Absent paths pass silently. For an existing path any answer other than
/// exactly `yes` (case-sensitive) declines.
pub fn confirm_overwrite<R: BufRead, W: Write>(
    path: &Path,
    console: &mut Console<R, W>,
) -> Result<GuardDecision, Pdf2NotesError> {
    if !path.exists() {
        return Ok(GuardDecision::Proceed);
    }

    let answer = console.ask(&format!(
        "\nFile {} already exists. Do you want to overwrite the file? [yes/no]\n",
        path.display()
    ))?;

    if answer == AFFIRMATIVE {
        info!("Overwriting {}", path.display());
        Ok(GuardDecision::Proceed)
    } else {
        info!("Not overwriting {}", path.display());
        Ok(GuardDecision::Declined)
    }
}
