//! Record definitions
//!
//! The `{id, name}` pair carried on the wire and kept in the store.

use crate::error::{Result, RolodexError};

/// Size of the name field on the wire, including the NUL terminator
pub const MAX_NAME_LENGTH: usize = 128;

/// A stored `{id, name}` pair
///
/// The name always fits the wire field: at most `MAX_NAME_LENGTH - 1` bytes,
/// no NUL and no newline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    id: u32,
    name: String,
}

impl Record {
    /// Create a record, rejecting names that do not fit the wire field
    pub fn new(id: u32, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self { id, name })
    }

    /// A record with only the id set, as sent in a GET request
    pub fn id_only(id: u32) -> Self {
        Self {
            id,
            name: String::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Check that a name can be stored and transmitted unchanged
pub fn validate_name(name: &str) -> Result<()> {
    if name.len() >= MAX_NAME_LENGTH {
        return Err(RolodexError::NameTooLong { len: name.len() });
    }
    if name.contains('\n') {
        return Err(RolodexError::InvalidName("contains a newline".to_string()));
    }
    if name.contains('\0') {
        return Err(RolodexError::InvalidName("contains a NUL byte".to_string()));
    }
    Ok(())
}
