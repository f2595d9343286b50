//! Rolodex Server Binary
//!
//! Creates the store file and serves the record protocol over TCP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rolodex::config::{AddressFamily, SyncPolicy};
use rolodex::network::Server;
use rolodex::{Config, RecordStore};
use tracing_subscriber::{fmt, EnvFilter};

/// Rolodex Server
#[derive(Parser, Debug)]
#[command(name = "rolodex-server")]
#[command(about = "Networked id/name record store")]
#[command(version)]
struct Args {
    /// Port to listen on
    port: u16,

    /// Store file (truncated at startup)
    #[arg(short, long, default_value = "database")]
    store: PathBuf,

    /// Address family to bind
    #[arg(short, long, value_enum, default_value_t = FamilyArg::Ipv4)]
    family: FamilyArg,

    /// Durability of each PUT
    #[arg(long, value_enum, default_value_t = SyncArg::Flush)]
    sync: SyncArg,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FamilyArg {
    Ipv4,
    Ipv6,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SyncArg {
    /// Flush each line to the file
    Flush,
    /// Flush and fsync each line
    EveryWrite,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rolodex=debug"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    tracing::info!("Rolodex Server v{}", rolodex::VERSION);
    tracing::info!("Store file: {}", args.store.display());

    let config = Config::builder()
        .store_path(&args.store)
        .port(args.port)
        .family(match args.family {
            FamilyArg::Ipv4 => AddressFamily::Ipv4,
            FamilyArg::Ipv6 => AddressFamily::Ipv6,
        })
        .sync_policy(match args.sync {
            SyncArg::Flush => SyncPolicy::Flush,
            SyncArg::EveryWrite => SyncPolicy::EveryWrite,
        })
        .build();

    // The store must exist before the first connection is accepted
    let store = match RecordStore::create(&config.store_path, config.sync_policy) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to create store file: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(&config, store) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Couldn't bind to any addresses: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
