//! Tests for Server and Connection
//!
//! These tests verify, over real TCP sockets:
//! - PUT / GET / QUIT request handling
//! - First-match lookups and misses
//! - Malformed requests answered with FAIL on a still-open connection
//! - Framing across split writes and truncated frames
//! - Concurrent clients and a listener that never waits on workers

use std::fs;
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rolodex::config::{Config, SyncPolicy};
use rolodex::network::{Client, Connection, ConnectionState, Server};
use rolodex::protocol::{
    encode_message, read_frame, read_message, write_message, Message, MessageType, Record,
    MESSAGE_SIZE,
};
use rolodex::RecordStore;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Start a server on an ephemeral localhost port, running on a detached thread
fn start_server() -> (TempDir, PathBuf, SocketAddr) {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("database");

    let config = Config::builder()
        .store_path(&store_path)
        .bind_ip(Ipv4Addr::LOCALHOST.into())
        .port(0)
        .build();

    let store = Arc::new(RecordStore::create(&config.store_path, config.sync_policy).unwrap());
    let server = Server::bind(&config, store).unwrap();
    let addr = server.local_addr().unwrap();

    thread::spawn(move || {
        let _ = server.run();
    });

    (temp_dir, store_path, addr)
}

/// Raw socket with a read timeout so a broken server fails the test instead of hanging it
fn raw_connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
}

fn client(addr: SocketAddr) -> Client {
    Client::from_stream(raw_connect(addr)).unwrap()
}

fn record(id: u32, name: &str) -> Record {
    Record::new(id, name).unwrap()
}

/// Expect the server to have closed the stream without sending anything
fn assert_closed(stream: &mut TcpStream) {
    match read_frame(stream) {
        Ok(None) | Err(_) => {}
        Ok(Some(frame)) => panic!("Expected closed connection, got frame {:?}", &frame[..4]),
    }
}

// =============================================================================
// Request Handling Tests
// =============================================================================

#[test]
fn test_put_get_quit_scenario() {
    let (_temp, store_path, addr) = start_server();
    let mut stream = raw_connect(addr);

    write_message(&mut stream, &Message::put(record(42, "alice"))).unwrap();
    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.msg_type, MessageType::Success);

    write_message(&mut stream, &Message::get(42)).unwrap();
    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.msg_type, MessageType::Success);
    assert_eq!(response.record, record(42, "alice"));

    write_message(&mut stream, &Message::quit()).unwrap();
    assert_closed(&mut stream);

    assert_eq!(fs::read_to_string(&store_path).unwrap(), "42 alice\n");
}

#[test]
fn test_client_round_trip() {
    let (_temp, _store_path, addr) = start_server();
    let mut client = client(addr);

    client.put(0, "zero").unwrap();
    client.put(u32::MAX, "max").unwrap();

    assert_eq!(client.get(0).unwrap(), Some(record(0, "zero")));
    assert_eq!(client.get(u32::MAX).unwrap(), Some(record(u32::MAX, "max")));

    client.quit().unwrap();
}

#[test]
fn test_first_match_over_network() {
    let (_temp, store_path, addr) = start_server();
    let mut client = client(addr);

    client.put(5, "a").unwrap();
    client.put(5, "b").unwrap();

    assert_eq!(client.get(5).unwrap().unwrap().name(), "a");
    assert_eq!(fs::read_to_string(&store_path).unwrap(), "5 a\n5 b\n");
}

#[test]
fn test_get_missing_returns_fail() {
    let (_temp, _store_path, addr) = start_server();
    let mut stream = raw_connect(addr);

    write_message(&mut stream, &Message::get(12345)).unwrap();
    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.msg_type, MessageType::Fail);
}

#[test]
fn test_quit_gets_no_response_and_closes() {
    let (_temp, store_path, addr) = start_server();
    let mut stream = raw_connect(addr);

    // Both frames go out together; the PUT after QUIT must never be served
    let mut bytes = encode_message(&Message::quit()).to_vec();
    bytes.extend_from_slice(&encode_message(&Message::put(record(1, "late"))));
    stream.write_all(&bytes).unwrap();

    assert_closed(&mut stream);
    assert_eq!(fs::read_to_string(&store_path).unwrap(), "");
}

// =============================================================================
// Malformed Request Tests
// =============================================================================

#[test]
fn test_unknown_type_fails_and_connection_stays_open() {
    let (_temp, _store_path, addr) = start_server();
    let mut stream = raw_connect(addr);

    let mut frame = encode_message(&Message::get(1));
    frame[0] = 77;
    stream.write_all(&frame).unwrap();
    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.msg_type, MessageType::Fail);

    write_message(&mut stream, &Message::put(record(1, "still here"))).unwrap();
    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.msg_type, MessageType::Success);

    write_message(&mut stream, &Message::get(1)).unwrap();
    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.record.name(), "still here");
}

#[test]
fn test_response_types_as_requests_fail() {
    let (_temp, _store_path, addr) = start_server();
    let mut stream = raw_connect(addr);

    for msg in [Message::success_empty(), Message::fail()] {
        write_message(&mut stream, &msg).unwrap();
        let response = read_message(&mut stream).unwrap().unwrap();
        assert_eq!(response.msg_type, MessageType::Fail);
    }
}

#[test]
fn test_unterminated_name_fails_without_storing() {
    let (_temp, store_path, addr) = start_server();
    let mut stream = raw_connect(addr);

    let mut frame = encode_message(&Message::put(record(3, "x")));
    frame[4..132].fill(b'x');
    stream.write_all(&frame).unwrap();
    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.msg_type, MessageType::Fail);

    write_message(&mut stream, &Message::get(3)).unwrap();
    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.msg_type, MessageType::Fail);

    assert_eq!(fs::read_to_string(&store_path).unwrap(), "");
}

#[test]
fn test_newline_in_name_fails() {
    let (_temp, store_path, addr) = start_server();
    let mut stream = raw_connect(addr);

    let mut frame = encode_message(&Message::put(record(3, "ab")));
    frame[5] = b'\n';
    stream.write_all(&frame).unwrap();
    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.msg_type, MessageType::Fail);

    assert_eq!(fs::read_to_string(&store_path).unwrap(), "");
}

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_split_frame_is_reassembled() {
    let (_temp, _store_path, addr) = start_server();
    let mut stream = raw_connect(addr);
    stream.set_nodelay(true).unwrap();

    let frame = encode_message(&Message::put(record(8, "split")));
    for chunk in frame.chunks(10) {
        stream.write_all(chunk).unwrap();
        thread::sleep(Duration::from_millis(5));
    }

    let response = read_message(&mut stream).unwrap().unwrap();
    assert_eq!(response.msg_type, MessageType::Success);
}

#[test]
fn test_truncated_frame_closes_connection_only() {
    let (_temp, store_path, addr) = start_server();

    {
        let mut stream = raw_connect(addr);
        let frame = encode_message(&Message::put(record(9, "partial")));
        stream.write_all(&frame[..MESSAGE_SIZE / 2]).unwrap();
        // Dropping the socket ends the stream mid-message
    }

    let mut client = client(addr);
    client.put(10, "whole").unwrap();
    assert_eq!(client.get(9).unwrap(), None);
    assert_eq!(fs::read_to_string(&store_path).unwrap(), "10 whole\n");
}

#[test]
fn test_disconnect_without_quit_keeps_server_up() {
    let (_temp, _store_path, addr) = start_server();

    {
        let mut first = client(addr);
        first.put(1, "one").unwrap();
    }

    let mut second = client(addr);
    assert_eq!(second.get(1).unwrap().unwrap().name(), "one");
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_idle_connection_does_not_block_others() {
    let (_temp, _store_path, addr) = start_server();

    // Connected but silent: a listener that joined its workers would stall here
    let _idle = raw_connect(addr);

    let mut busy = client(addr);
    busy.put(1, "served").unwrap();
    assert_eq!(busy.get(1).unwrap().unwrap().name(), "served");
}

#[test]
fn test_puts_visible_to_already_open_connections() {
    let (_temp, _store_path, addr) = start_server();

    let mut reader = client(addr);
    assert_eq!(reader.get(77).unwrap(), None);

    let mut writer = client(addr);
    writer.put(77, "fresh").unwrap();

    assert_eq!(reader.get(77).unwrap().unwrap().name(), "fresh");
}

#[test]
fn test_concurrent_clients_distinct_ids() {
    let (_temp, store_path, addr) = start_server();
    let clients = 8u32;
    let puts_per_client = 25u32;

    crossbeam::thread::scope(|s| {
        for c in 0..clients {
            s.spawn(move |_| {
                let mut client = client(addr);
                for i in 0..puts_per_client {
                    let id = c * 1000 + i;
                    client.put(id, &format!("client{}-item{}", c, i)).unwrap();
                }
                client.quit().unwrap();
            });
        }
    })
    .unwrap();

    let contents = fs::read_to_string(&store_path).unwrap();
    assert_eq!(contents.lines().count(), (clients * puts_per_client) as usize);

    let mut checker = client(addr);
    for c in 0..clients {
        for i in 0..puts_per_client {
            let id = c * 1000 + i;
            let found = checker.get(id).unwrap().unwrap();
            assert_eq!(found.name(), format!("client{}-item{}", c, i));
        }
    }
}

#[test]
fn test_every_write_sync_policy_server() {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("database");
    let config = Config::builder()
        .store_path(&store_path)
        .sync_policy(SyncPolicy::EveryWrite)
        .bind_ip(Ipv4Addr::LOCALHOST.into())
        .port(0)
        .build();

    let store = Arc::new(RecordStore::create(&config.store_path, config.sync_policy).unwrap());
    let server = Server::bind(&config, store).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || {
        let _ = server.run();
    });

    let mut client = client(addr);
    client.put(4, "synced").unwrap();
    assert_eq!(fs::read_to_string(&store_path).unwrap(), "4 synced\n");
}

// =============================================================================
// Connection State Tests
// =============================================================================

#[test]
fn test_connection_reaches_closed_after_quit() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(
        RecordStore::create(temp_dir.path().join("database"), SyncPolicy::Flush).unwrap(),
    );

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let addr = listener.local_addr().unwrap();

    let worker = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut connection = Connection::new(stream, store).unwrap();
        assert_eq!(connection.state(), ConnectionState::AwaitingRequest);
        connection.handle().unwrap();
        connection.state()
    });

    let mut client = client(addr);
    client.put(1, "x").unwrap();
    client.quit().unwrap();

    assert_eq!(worker.join().unwrap(), ConnectionState::Closed);
}

#[test]
fn test_bind_conflict_is_an_error() {
    let (_temp, _store_path, addr) = start_server();
    let temp_dir = TempDir::new().unwrap();

    let config = Config::builder()
        .store_path(temp_dir.path().join("database"))
        .bind_ip(addr.ip())
        .port(addr.port())
        .build();
    let store = Arc::new(RecordStore::create(&config.store_path, config.sync_policy).unwrap());

    assert!(Server::bind(&config, store).is_err());
}

// =============================================================================
// Listen Address Tests
// =============================================================================

#[test]
fn test_listen_addr_by_family() {
    use rolodex::config::AddressFamily;

    let v4 = Config::builder().port(9000).build();
    assert_eq!(v4.listen_addr().unwrap().to_string(), "0.0.0.0:9000");

    let v6 = Config::builder().family(AddressFamily::Ipv6).port(9000).build();
    assert_eq!(v6.listen_addr().unwrap().to_string(), "[::]:9000");
}

#[test]
fn test_listen_addr_rejects_family_mismatch() {
    use rolodex::config::AddressFamily;
    use rolodex::RolodexError;

    let config = Config::builder()
        .bind_ip(Ipv4Addr::LOCALHOST.into())
        .family(AddressFamily::Ipv6)
        .build();

    assert!(matches!(config.listen_addr(), Err(RolodexError::Config(_))));
}
