//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (fixed-size binary)
//!
//! Requests and responses use the same 136-byte layout:
//! ```text
//! ┌──────────┬─────────┬──────────────────────────────┬──────────┐
//! │ Type (1) │ Pad (3) │ Name (128, NUL-terminated)   │ Id (4)   │
//! └──────────┴─────────┴──────────────────────────────┴──────────┘
//! ```
//!
//! ### Types
//! - 0: QUIT    - no payload, no response
//! - 1: PUT     - id + name
//! - 2: GET     - id
//! - 3: SUCCESS - found record for GET, empty for PUT
//! - 4: FAIL    - empty

mod record;
mod message;
mod codec;

pub use record::{validate_name, Record, MAX_NAME_LENGTH};
pub use message::{Message, MessageType};
pub use codec::{
    decode_message, encode_message, read_frame, read_message, write_message, Frame,
    MESSAGE_SIZE,
};
