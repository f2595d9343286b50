//! Connection Handler
//!
//! Runs the request/response state machine for one client.

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use crate::error::{Result, RolodexError};
use crate::protocol::{decode_message, read_frame, write_message, Message, MessageType};
use crate::store::RecordStore;

/// Where a connection is in its request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the next full message
    AwaitingRequest,

    /// Dispatching a decoded request
    Processing,

    /// Response written, about to wait again
    Responded,

    /// Terminal: QUIT, peer disconnect or transport error
    Closed,
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared record store
    store: Arc<RecordStore>,

    /// Peer address for logging
    peer_addr: String,

    state: ConnectionState,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, store: Arc<RecordStore>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            peer_addr,
            state: ConnectionState::AwaitingRequest,
        })
    }

    /// Disable Nagle's algorithm for low latency
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.writer.get_ref().set_nodelay(nodelay)?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads messages in a loop and sends responses. Returns `Ok` when the
    /// client quits or goes away, `Err` on an unexpected transport error.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let result = self.serve();
        self.transition(ConnectionState::Closed);
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);

        result
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            let frame = match read_frame(&mut self.reader) {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(RolodexError::Io(ref e)) if is_peer_gone(e) => {
                    tracing::debug!("Connection to {} lost: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            self.transition(ConnectionState::Processing);

            let response = match decode_message(&frame) {
                Ok(request) => {
                    tracing::trace!("Received request from {}: {:?}", self.peer_addr, request);
                    if request.msg_type == MessageType::Quit {
                        tracing::debug!("Client {} sent QUIT", self.peer_addr);
                        return Ok(());
                    }
                    self.execute(request)
                }
                Err(e) => {
                    tracing::debug!("Malformed request from {}: {}", self.peer_addr, e);
                    Message::fail()
                }
            };

            if let Err(e) = write_message(&mut self.writer, &response) {
                if let RolodexError::Io(ref io_err) = e {
                    if is_peer_gone(io_err) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }

            self.transition(ConnectionState::Responded);
            self.transition(ConnectionState::AwaitingRequest);
        }
    }

    /// Run one non-QUIT request against the store and build its response
    fn execute(&self, request: Message) -> Message {
        match request.msg_type {
            MessageType::Put => match self.store.put(&request.record) {
                Ok(()) => Message::success_empty(),
                Err(e) => {
                    tracing::warn!(
                        "PUT id={} from {} failed: {}",
                        request.record.id(),
                        self.peer_addr,
                        e
                    );
                    Message::fail()
                }
            },
            MessageType::Get => match self.store.get(request.record.id()) {
                Ok(record) => Message::success(record),
                Err(RolodexError::RecordNotFound(id)) => {
                    tracing::debug!("GET id={} from {}: not found", id, self.peer_addr);
                    Message::fail()
                }
                Err(e) => {
                    tracing::warn!(
                        "GET id={} from {} failed: {}",
                        request.record.id(),
                        self.peer_addr,
                        e
                    );
                    Message::fail()
                }
            },
            other => {
                tracing::debug!("Unsupported request type {:?} from {}", other, self.peer_addr);
                Message::fail()
            }
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        tracing::trace!("{}: {:?} -> {:?}", self.peer_addr, self.state, next);
        self.state = next;
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Errors that just mean the other side went away
fn is_peer_gone(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}
