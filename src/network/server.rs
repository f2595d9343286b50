//! TCP Server
//!
//! Accepts connections and hands each one to its own worker thread.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crate::config::Config;
use crate::error::{Result, RolodexError};
use crate::store::RecordStore;

use super::Connection;

/// TCP server for Rolodex
pub struct Server {
    /// Bound listening socket
    listener: TcpListener,

    /// Shared record store
    store: Arc<RecordStore>,

    /// Apply TCP_NODELAY to accepted sockets
    nodelay: bool,

    /// Sequence number for naming worker threads
    next_conn_id: AtomicU64,
}

impl Server {
    /// Bind the configured address
    pub fn bind(config: &Config, store: Arc<RecordStore>) -> Result<Self> {
        let addr = config.listen_addr()?;
        let listener = TcpListener::bind(addr)
            .map_err(|e| RolodexError::Network(format!("failed to bind {}: {}", addr, e)))?;

        let bound = listener.local_addr()?;
        tracing::info!(
            "Listening on {} address {} port {}",
            if bound.is_ipv4() { "IPv4" } else { "IPv6" },
            bound.ip(),
            bound.port()
        );

        Ok(Self {
            listener,
            store,
            nodelay: config.nodelay,
            next_conn_id: AtomicU64::new(1),
        })
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever
    ///
    /// Each connection runs on its own thread; the loop goes straight back
    /// to `accept` and never waits for a worker. Returns only on a
    /// non-transient accept error.
    pub fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => self.dispatch(stream, peer),
                Err(e) if is_transient(&e) => {
                    tracing::debug!("Transient accept error: {}", e);
                    continue;
                }
                Err(e) => {
                    tracing::error!("Failure on accept: {}", e);
                    return Err(RolodexError::Network(format!("accept failed: {}", e)));
                }
            }
        }
    }

    /// Start a worker thread for an accepted connection
    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);

        match stream.local_addr() {
            Ok(local) => tracing::info!(
                "New client connection #{} from {} (server side interface {})",
                conn_id,
                peer,
                local
            ),
            Err(_) => tracing::info!("New client connection #{} from {}", conn_id, peer),
        }

        let store = Arc::clone(&self.store);
        let nodelay = self.nodelay;

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", conn_id))
            .spawn(move || serve_connection(stream, store, nodelay));

        // Workers run detached; the handle is not kept.
        if let Err(e) = spawned {
            tracing::error!("Failed to spawn worker for {}: {}", peer, e);
        }
    }
}

/// Worker thread body
fn serve_connection(stream: TcpStream, store: Arc<RecordStore>, nodelay: bool) {
    let mut connection = match Connection::new(stream, store) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to set up connection: {}", e);
            return;
        }
    };

    if let Err(e) = connection.set_nodelay(nodelay) {
        tracing::debug!("Could not set TCP_NODELAY for {}: {}", connection.peer_addr(), e);
    }

    match connection.handle() {
        Ok(()) => tracing::info!("Client {} disconnected", connection.peer_addr()),
        Err(e) => tracing::warn!("Connection {} closed with error: {}", connection.peer_addr(), e),
    }
}

/// Accept errors worth retrying
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
