//! Message definitions
//!
//! Requests and responses share one message shape.

use super::Record;
use crate::error::RolodexError;

/// Message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Quit = 0,
    Put = 1,
    Get = 2,
    Success = 3,
    Fail = 4,
}

impl TryFrom<u8> for MessageType {
    type Error = RolodexError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(MessageType::Quit),
            1 => Ok(MessageType::Put),
            2 => Ok(MessageType::Get),
            3 => Ok(MessageType::Success),
            4 => Ok(MessageType::Fail),
            _ => Err(RolodexError::Protocol(format!(
                "Unknown message type: {}",
                byte
            ))),
        }
    }
}

/// A single wire message
///
/// Which parts of `record` mean anything depends on `msg_type`:
/// - PUT: id and name
/// - GET: id only
/// - SUCCESS: the found record for a GET, nothing for a PUT
/// - QUIT, FAIL: nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub msg_type: MessageType,
    pub record: Record,
}

impl Message {
    pub fn quit() -> Self {
        Self {
            msg_type: MessageType::Quit,
            record: Record::default(),
        }
    }

    pub fn put(record: Record) -> Self {
        Self {
            msg_type: MessageType::Put,
            record,
        }
    }

    pub fn get(id: u32) -> Self {
        Self {
            msg_type: MessageType::Get,
            record: Record::id_only(id),
        }
    }

    /// SUCCESS carrying a found record (GET response)
    pub fn success(record: Record) -> Self {
        Self {
            msg_type: MessageType::Success,
            record,
        }
    }

    /// SUCCESS with no meaningful record (PUT response)
    pub fn success_empty() -> Self {
        Self::success(Record::default())
    }

    pub fn fail() -> Self {
        Self {
            msg_type: MessageType::Fail,
            record: Record::default(),
        }
    }
}
