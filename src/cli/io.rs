//! File and stdout handling for CLI

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Open a blob file for buffered reading
pub fn open_blob(path: &Path) -> CliResult<BufReader<File>> {
    let file = File::open(path)
        .map_err(|e| CliError::io_error(format!("Failed to open blob {}: {}", path.display(), e)))?;
    Ok(BufReader::new(file))
}

/// Read a whole blob file
pub fn read_blob(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| CliError::io_error(format!("Failed to read blob {}: {}", path.display(), e)))
}

/// Write a pretty-printed JSON value to stdout
pub fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write a single line to stdout
pub fn write_line(line: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
}

/// Lowercase hex, two characters per byte
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}
