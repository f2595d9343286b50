//! Store line format
//!
//! One record per line: decimal id, a single space, the name, `\n`.

use crate::error::{Result, RolodexError};
use crate::protocol::Record;

/// Render a record as one complete store line, newline included
pub fn format_line(record: &Record) -> Vec<u8> {
    format!("{} {}\n", record.id(), record.name()).into_bytes()
}

/// Parse one store line (with or without its trailing newline)
pub fn parse_line(line: &[u8]) -> Result<Record> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = std::str::from_utf8(line)
        .map_err(|e| RolodexError::Storage(format!("line is not valid UTF-8: {}", e)))?;

    let (id, name) = line
        .split_once(' ')
        .ok_or_else(|| RolodexError::Storage("missing id/name separator".to_string()))?;

    let id = id
        .parse::<u32>()
        .map_err(|e| RolodexError::Storage(format!("bad id {:?}: {}", id, e)))?;

    Record::new(id, name)
}
