//! Reading command input from a file or stdin.

use std::io::Read;
use std::path::Path;

use crate::error::{KeyprobeError, Result};

/// Read all input text from `file`, or from stdin when no file is given.
///
/// An interactive stdin is treated as no input rather than blocking.
///
/// # Errors
///
/// Returns an I/O error if reading fails, or `EmptyInput` when stdin is a
/// terminal.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        tracing::debug!(?path, "Reading input file");
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut stdin = std::io::stdin();
    if std::io::IsTerminal::is_terminal(&stdin) {
        return Err(KeyprobeError::EmptyInput);
    }
    let mut text = String::new();
    stdin.read_to_string(&mut text)?;
    Ok(text)
}
