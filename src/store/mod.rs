//! Store Module
//!
//! Append-only persistence of `{id, name}` records in one flat file.
//!
//! ## Responsibilities
//! - Create (truncate) the store file at startup
//! - Append one line per PUT, flushed before returning
//! - Linear first-match lookup by id
//! - Skip and log malformed lines instead of failing a lookup
//!
//! ## File Format
//! ```text
//! 42 alice\n
//! 7 bob\n
//! 42 carol\n      <- never returned for id 42: the first match wins
//! ```

mod line;
mod record_store;

pub use line::{format_line, parse_line};
pub use record_store::RecordStore;
