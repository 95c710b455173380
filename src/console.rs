//! Line-oriented console used by the interactive stages.
//!
//! The input selector and the overwrite guard read answers through a
//! [`Console`] instead of touching stdin/stdout directly, so tests can feed
//! scripted answers from a byte slice and inspect what was printed.

use crate::error::Pdf2NotesError;
use std::io::{self, BufRead, Write};

/// A prompt/answer pair of streams.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    /// Console bound to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print text without a trailing newline and flush it.
    pub fn print(&mut self, text: &str) -> Result<(), Pdf2NotesError> {
        self.output
            .write_all(text.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|source| Pdf2NotesError::PromptFailed { source })
    }

    /// Print a full line.
    pub fn println(&mut self, line: &str) -> Result<(), Pdf2NotesError> {
        self.print(line)?;
        self.print("\n")
    }

    /// Read one answer line with the line terminator and surrounding
    /// whitespace removed.
    ///
    /// An input stream that is already at EOF is [`Pdf2NotesError::PromptClosed`].
    pub fn read_answer(&mut self) -> Result<String, Pdf2NotesError> {
        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .map_err(|source| Pdf2NotesError::PromptFailed { source })?;
        if n == 0 {
            return Err(Pdf2NotesError::PromptClosed);
        }
        Ok(line.trim().to_string())
    }

    /// Print `question` and read the answer.
    pub fn ask(&mut self, question: &str) -> Result<String, Pdf2NotesError> {
        self.print(question)?;
        self.read_answer()
    }

    /// Give back the output stream (tests use this to inspect what was printed).
    pub fn into_output(self) -> W {
        self.output
    }
}
