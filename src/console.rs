use std::io::{self, BufRead, Write};

use anyhow::Result;

/// Line-oriented terminal boundary, swappable in tests.
pub trait Console {
    /// Prints `text` without a trailing newline and reads one line, stripped
    /// of its line ending. `None` means the input stream ended.
    fn prompt(&mut self, text: &str) -> Result<Option<String>>;
    fn write_line(&mut self, line: &str) -> Result<()>;
}

pub struct StdioConsole;

impl Console for StdioConsole {
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        let mut out = io::stdout().lock();
        write!(out, "{text}")?;
        out.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(())
    }
}
