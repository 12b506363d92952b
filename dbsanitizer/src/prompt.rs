//! Interactive confirmation.

use dbsanitizer_core::{Confirmation, Result, SanitizerError};
use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

/// Asks a yes/no question on a terminal-like pair of streams.
///
/// Anything other than `y` or `yes` (case-insensitive), including end of
/// input, counts as no.
pub struct PromptConfirmation<R, W> {
    reader: R,
    writer: W,
}

impl PromptConfirmation<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptConfirmation<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

fn io_error(source: std::io::Error) -> SanitizerError {
    SanitizerError::Io {
        context: "confirmation prompt".to_string(),
        source,
    }
}

impl<R, W> Confirmation for PromptConfirmation<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        write!(self.writer, "{} [y/N] ", prompt).map_err(io_error)?;
        self.writer.flush().map_err(io_error)?;

        let mut answer = String::new();
        self.reader.read_line(&mut answer).map_err(io_error)?;

        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}
