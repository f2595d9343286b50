//! # Rolodex
//!
//! A small networked record store:
//! - Fixed-size binary wire protocol (PUT / GET / QUIT)
//! - Append-only flat-file persistence, one `<id> <name>` line per PUT
//! - One thread per connection, one lock around the store
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Listener                            │
//! │                (accepts, never joins)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one thread per connection
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Connection Workers                           │
//! │     AwaitingRequest → Processing → Responded → ...           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Arc<RecordStore>
//!                       ▼
//!               ┌───────────────┐
//!               │  RecordStore  │
//!               │ Mutex<File>   │
//!               └───────┬───────┘
//!                       ▼
//!               ┌───────────────┐
//!               │  store file   │
//!               │ "<id> <name>" │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod store;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, RolodexError};
pub use config::Config;
pub use protocol::{Message, MessageType, Record};
pub use store::RecordStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Rolodex
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
