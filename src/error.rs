//! Error types for Rolodex
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RolodexError
pub type Result<T> = std::result::Result<T, RolodexError>;

/// Unified error type for Rolodex operations
#[derive(Debug, Error)]
pub enum RolodexError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Name too long: {len} bytes (max {max})", max = crate::protocol::MAX_NAME_LENGTH - 1)]
    NameTooLong { len: usize },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record not found: id {0}")]
    RecordNotFound(u32),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not resolve host: {0}")]
    Resolve(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("{0} request failed")]
    RequestFailed(&'static str),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
