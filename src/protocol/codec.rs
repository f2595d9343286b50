//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every message is exactly `MESSAGE_SIZE` bytes. There is no length prefix:
//! framing relies on both ends agreeing on the size.
//!
//! ```text
//! ┌──────────┬─────────┬──────────────────────────────┬──────────┐
//! │ Type (1) │ Pad (3) │ Name (128, NUL-terminated)   │ Id (4)   │
//! └──────────┴─────────┴──────────────────────────────┴──────────┘
//! ```
//!
//! The id is little-endian. Padding and unused name bytes are zero.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::{Message, MessageType, Record, MAX_NAME_LENGTH};
use crate::error::{Result, RolodexError};

/// Padding between the type byte and the name field
const TYPE_PADDING: usize = 3;

const NAME_OFFSET: usize = 1 + TYPE_PADDING;
const ID_OFFSET: usize = NAME_OFFSET + MAX_NAME_LENGTH;

/// Fixed size of every message on the wire
pub const MESSAGE_SIZE: usize = ID_OFFSET + 4;

/// One undecoded message
pub type Frame = [u8; MESSAGE_SIZE];

// =============================================================================
// Message Encoding/Decoding
// =============================================================================

/// Encode a message into a frame
pub fn encode_message(message: &Message) -> Frame {
    let name = message.record.name().as_bytes();

    let mut buf = BytesMut::with_capacity(MESSAGE_SIZE);
    buf.put_u8(message.msg_type as u8);
    buf.put_bytes(0, TYPE_PADDING);
    buf.put_slice(name);
    // Record guarantees name.len() < MAX_NAME_LENGTH, so at least one NUL follows
    buf.put_bytes(0, MAX_NAME_LENGTH - name.len());
    buf.put_u32_le(message.record.id());

    let mut frame = [0u8; MESSAGE_SIZE];
    frame.copy_from_slice(&buf);
    frame
}

/// Decode a frame into a message
///
/// The name field is only read for PUT and SUCCESS; for the other types it
/// may hold anything.
pub fn decode_message(frame: &Frame) -> Result<Message> {
    let type_byte = frame[0];
    let name_field = &frame[NAME_OFFSET..ID_OFFSET];
    let id = (&frame[ID_OFFSET..]).get_u32_le();

    let msg_type = MessageType::try_from(type_byte)?;
    let record = match msg_type {
        MessageType::Put | MessageType::Success => Record::new(id, decode_name(name_field)?)?,
        MessageType::Get => Record::id_only(id),
        MessageType::Quit | MessageType::Fail => Record::default(),
    };

    Ok(Message { msg_type, record })
}

/// Extract the NUL-terminated name from its fixed field
fn decode_name(field: &[u8]) -> Result<String> {
    let len = field.iter().position(|&b| b == 0).ok_or_else(|| {
        RolodexError::Protocol(format!(
            "Name field not NUL-terminated within {} bytes",
            MAX_NAME_LENGTH
        ))
    })?;

    String::from_utf8(field[..len].to_vec())
        .map_err(|e| RolodexError::Protocol(format!("Name is not valid UTF-8: {}", e)))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read exactly one frame from a stream
///
/// Loops until `MESSAGE_SIZE` bytes have arrived. Returns `None` when the
/// peer closes the stream, including after a partial frame: a short final
/// read ends the connection and is never decoded.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Frame>> {
    let mut frame = [0u8; MESSAGE_SIZE];
    let mut filled = 0;

    while filled < MESSAGE_SIZE {
        match reader.read(&mut frame[filled..]) {
            Ok(0) => {
                if filled > 0 {
                    tracing::debug!(
                        "Stream closed mid-message, discarding {} of {} bytes",
                        filled,
                        MESSAGE_SIZE
                    );
                }
                return Ok(None);
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Some(frame))
}

/// Read and decode one message from a stream
///
/// `Ok(None)` means the stream ended.
pub fn read_message<R: Read>(reader: &mut R) -> Result<Option<Message>> {
    read_frame(reader)?
        .map(|frame| decode_message(&frame))
        .transpose()
}

/// Write a message to a stream
pub fn write_message<W: Write>(writer: &mut W, message: &Message) -> Result<()> {
    let frame = encode_message(message);
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}
