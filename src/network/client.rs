//! TCP Client
//!
//! Blocking client for the record protocol.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use crate::error::{Result, RolodexError};
use crate::protocol::{read_message, write_message, Message, MessageType, Record};

/// A connection to a Rolodex server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    peer_addr: SocketAddr,
}

impl Client {
    /// Resolve `host` and connect to the first address that accepts
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| RolodexError::Resolve(format!("{}: {}", host, e)))?
            .collect();

        if addrs.is_empty() {
            return Err(RolodexError::Resolve(format!("{}: no addresses", host)));
        }

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect(addr) {
                Ok(stream) => return Self::from_stream(stream),
                Err(e) => {
                    tracing::debug!("connect to {} failed: {}", addr, e);
                    last_err = Some((addr, e));
                }
            }
        }

        match last_err {
            Some((addr, e)) => Err(RolodexError::Network(format!(
                "connect to {} failed: {}",
                addr, e
            ))),
            None => Err(RolodexError::Network(format!("could not connect to {}", host))),
        }
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr,
        })
    }

    /// Store `name` under `id`
    ///
    /// A FAIL answer from the server becomes `RequestFailed("PUT")`.
    pub fn put(&mut self, id: u32, name: &str) -> Result<()> {
        let record = Record::new(id, name)?;
        match self.round_trip(&Message::put(record))?.msg_type {
            MessageType::Success => Ok(()),
            _ => Err(RolodexError::RequestFailed("PUT")),
        }
    }

    /// Look up the first record stored under `id`
    ///
    /// `Ok(None)` when the server answers FAIL.
    pub fn get(&mut self, id: u32) -> Result<Option<Record>> {
        let response = self.round_trip(&Message::get(id))?;
        match response.msg_type {
            MessageType::Success => Ok(Some(response.record)),
            _ => Ok(None),
        }
    }

    /// Tell the server we are leaving and close the socket
    ///
    /// The server sends nothing back for QUIT.
    pub fn quit(mut self) -> Result<()> {
        write_message(&mut self.writer, &Message::quit())?;
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
        Ok(())
    }

    /// Send any message and wait for the single response
    pub fn round_trip(&mut self, request: &Message) -> Result<Message> {
        write_message(&mut self.writer, request)?;
        read_message(&mut self.reader)?.ok_or_else(|| {
            RolodexError::Network(format!("server {} closed the connection", self.peer_addr))
        })
    }

    /// Get the server address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}
