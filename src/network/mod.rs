//! Network Module
//!
//! TCP server, per-connection worker and client.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One detached worker thread per connection
//! - Requests routed to the shared RecordStore

mod server;
mod connection;
mod client;

pub use server::Server;
pub use connection::{Connection, ConnectionState};
pub use client::Client;
