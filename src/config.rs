//! Configuration for Rolodex
//!
//! Centralized configuration with sensible defaults.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::{Result, RolodexError};

/// Main configuration for a Rolodex server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the store file. Truncated every time a server starts.
    pub store_path: PathBuf,

    /// How hard each PUT pushes its line towards the disk
    pub sync_policy: SyncPolicy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP port to listen on (0 lets the OS pick one)
    pub port: u16,

    /// Address family used when no explicit `bind_ip` is set
    pub family: AddressFamily,

    /// Explicit interface to bind; overrides the wildcard address of `family`
    pub bind_ip: Option<IpAddr>,

    /// Disable Nagle's algorithm on accepted connections
    pub nodelay: bool,
}

/// Store sync policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Flush the line to the file after every PUT
    Flush,

    /// Flush and fsync the file data after every PUT (safest, slowest)
    EveryWrite,
}

/// Address family selected at bind time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    /// Bind `0.0.0.0`
    Ipv4,

    /// Bind `[::]`; also accepts IPv4 clients where the OS runs dual-stack
    Ipv6,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("database"),
            sync_policy: SyncPolicy::Flush,
            port: 9000,
            family: AddressFamily::Ipv4,
            bind_ip: None,
            nodelay: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Socket address the listener binds to
    ///
    /// Fails if an explicit `bind_ip` contradicts the configured family.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip = match (self.bind_ip, self.family) {
            (Some(ip @ IpAddr::V4(_)), AddressFamily::Ipv4) => ip,
            (Some(ip @ IpAddr::V6(_)), AddressFamily::Ipv6) => ip,
            (Some(ip), family) => {
                return Err(RolodexError::Config(format!(
                    "bind address {} does not match address family {:?}",
                    ip, family
                )))
            }
            (None, AddressFamily::Ipv4) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            (None, AddressFamily::Ipv6) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store file path
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = path.into();
        self
    }

    /// Set the store sync policy
    pub fn sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.config.sync_policy = policy;
        self
    }

    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the address family
    pub fn family(mut self, family: AddressFamily) -> Self {
        self.config.family = family;
        self
    }

    /// Bind a specific interface instead of the wildcard address.
    /// Also switches the family to match.
    pub fn bind_ip(mut self, ip: IpAddr) -> Self {
        self.config.family = match ip {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        };
        self.config.bind_ip = Some(ip);
        self
    }

    /// Enable or disable TCP_NODELAY on accepted connections
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
