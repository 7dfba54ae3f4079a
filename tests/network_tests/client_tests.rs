//! Client Tests
//!
//! Runs the blocking client against loopback mock servers.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use yessql_client::protocol::{
    decode_command, encode_error_response, encode_response, read_frame, write_frame, Command,
    ErrorCode, KvEntry, Opcode, Status,
};
use yessql_client::{Client, ClientConfig, ClientError};

// =============================================================================
// Mock Servers
// =============================================================================

/// Accept one connection and hand it to `serve`
fn spawn_server<F>(serve: F) -> (String, JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        serve(stream);
    });
    (addr, handle)
}

fn config_for(addr: &str) -> ClientConfig {
    ClientConfig::builder()
        .server_addr(addr)
        .read_timeout_ms(5000)
        .build()
}

/// Minimal ordered store with forward-only cursors
#[derive(Default)]
struct MockStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    cursors: HashMap<Vec<u8>, Vec<u8>>,
}

impl MockStore {
    fn handle(&mut self, command: Command) -> Vec<u8> {
        match command {
            Command::Set { key, value } => {
                self.data.insert(key, value);
                encode_response(Opcode::Ok, &[]).unwrap()
            }
            Command::Get { key } => match self.data.get(&key) {
                Some(value) => {
                    encode_response(Opcode::Ok, &[KvEntry::new(key, value.clone())]).unwrap()
                }
                None => encode_response(Opcode::DataNotFound, &[]).unwrap(),
            },
            Command::Remove { key } => match self.data.remove(&key) {
                Some(_) => encode_response(Opcode::Ok, &[]).unwrap(),
                None => encode_response(Opcode::DataNotFound, &[]).unwrap(),
            },
            Command::CreateCursor { cursor, key } => {
                self.cursors.insert(cursor, key);
                encode_response(Opcode::Ok, &[]).unwrap()
            }
            Command::DeleteCursor { cursor } => match self.cursors.remove(&cursor) {
                Some(_) => encode_response(Opcode::Ok, &[]).unwrap(),
                None => encode_error_response(ErrorCode::CursorNotFound),
            },
            Command::GetFf { cursor, count } => self.step(&cursor, count, false, b""),
            Command::GetKeys { cursor, count } => self.step(&cursor, count, true, b""),
            Command::GetKeysPrefix {
                cursor,
                count,
                prefix,
            } => self.step(&cursor, count, true, &prefix),
            Command::GetFb { .. } => encode_error_response(ErrorCode::Unknown),
        }
    }

    fn step(&mut self, cursor: &[u8], count: u16, keys_only: bool, prefix: &[u8]) -> Vec<u8> {
        let start = match self.cursors.get(cursor) {
            Some(pos) => pos.clone(),
            None => return encode_error_response(ErrorCode::CursorNotFound),
        };

        let entries: Vec<KvEntry> = self
            .data
            .range(start..)
            .filter(|(k, _)| k.starts_with(prefix))
            .take(count as usize)
            .map(|(k, v)| {
                if keys_only {
                    KvEntry::key_only(k.clone())
                } else {
                    KvEntry::new(k.clone(), v.clone())
                }
            })
            .collect();

        if let Some(last) = entries.last() {
            let mut next = last.key.clone();
            next.push(0);
            self.cursors.insert(cursor.to_vec(), next);
        }
        encode_response(Opcode::Ok, &entries).unwrap()
    }
}

/// Serve `MockStore` until the client hangs up
fn serve_store(mut stream: TcpStream) {
    let mut store = MockStore::default();
    while let Ok(frame) = read_frame(&mut stream) {
        let command = decode_command(&frame).unwrap();
        let reply = store.handle(command);
        write_frame(&mut stream, &reply).unwrap();
    }
}

// =============================================================================
// Request/Response Tests
// =============================================================================

#[test]
fn test_set_get_remove() {
    let (addr, server) = spawn_server(serve_store);
    let mut client = Client::connect(&config_for(&addr)).unwrap();

    let set = client.set(b"alpha", b"1").unwrap();
    assert_eq!(set.status, Status::Opcode(Opcode::Ok));

    let get = client.get(b"alpha").unwrap();
    assert_eq!(get.entries, vec![KvEntry::new("alpha", "1")]);
    assert_eq!(get.first_value(), Some(&b"1"[..]));

    let removed = client.remove(b"alpha").unwrap();
    assert_eq!(removed.status, Status::Opcode(Opcode::Ok));

    let missing = client.get(b"alpha").unwrap();
    assert_eq!(missing.status, Status::Opcode(Opcode::DataNotFound));
    assert!(missing.entries.is_empty());

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_cursor_iteration() {
    let (addr, server) = spawn_server(serve_store);
    let mut client = Client::connect(&config_for(&addr)).unwrap();

    for key in ["a", "aa", "aaa", "b", "bb"] {
        client.set(key.as_bytes(), key.to_uppercase().as_bytes()).unwrap();
    }

    client.create_cursor(b"c1", b"a").unwrap();

    let first = client.get_ff(b"c1", 2).unwrap();
    assert_eq!(
        first.entries,
        vec![KvEntry::new("a", "A"), KvEntry::new("aa", "AA")]
    );

    let keys = client.get_keys(b"c1", 10).unwrap();
    assert_eq!(
        keys.entries,
        vec![
            KvEntry::key_only("aaa"),
            KvEntry::key_only("b"),
            KvEntry::key_only("bb"),
        ]
    );

    client.create_cursor(b"c2", b"").unwrap();
    let prefixed = client.get_keys_prefix(b"c2", 10, b"b").unwrap();
    assert_eq!(
        prefixed.entries,
        vec![KvEntry::key_only("b"), KvEntry::key_only("bb")]
    );

    assert_eq!(
        client.delete_cursor(b"c1").unwrap().status,
        Status::Opcode(Opcode::Ok)
    );

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_server_error_is_a_value() {
    let (addr, server) = spawn_server(serve_store);
    let mut client = Client::connect(&config_for(&addr)).unwrap();

    let response = client.delete_cursor(b"never-created").unwrap();
    assert_eq!(response.status, Status::Error(ErrorCode::CursorNotFound));

    let response = client.get_ff(b"never-created", 1).unwrap();
    assert_eq!(response.error_code(), Some(ErrorCode::CursorNotFound));

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_fragmented_response() {
    let (addr, server) = spawn_server(|mut stream| {
        let frame = read_frame(&mut stream).unwrap();
        assert!(matches!(decode_command(&frame).unwrap(), Command::Get { .. }));

        let reply = encode_response(Opcode::Ok, &[KvEntry::new("slow", "drip")]).unwrap();
        stream.set_nodelay(true).unwrap();
        for byte in reply {
            stream.write_all(&[byte]).unwrap();
            stream.flush().unwrap();
        }
    });

    let mut client = Client::connect(&config_for(&addr)).unwrap();
    let response = client.get(b"slow").unwrap();
    assert_eq!(response.entries, vec![KvEntry::new("slow", "drip")]);

    server.join().unwrap();
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_connection_closed_mid_frame() {
    let (addr, server) = spawn_server(|mut stream| {
        read_frame(&mut stream).unwrap();
        // Promise 100 bytes, deliver 12
        let mut partial = 100u64.to_be_bytes().to_vec();
        partial.extend_from_slice(&[0u8; 4]);
        stream.write_all(&partial).unwrap();
    });

    let mut client = Client::connect(&config_for(&addr)).unwrap();
    let err = client.get(b"k").unwrap_err();

    assert!(err.is_transport());
    assert!(matches!(
        err,
        ClientError::ConnectionClosed { expected: 100, .. }
    ));

    server.join().unwrap();
}

#[test]
fn test_undersized_response_is_invalid() {
    let (addr, server) = spawn_server(|mut stream| {
        read_frame(&mut stream).unwrap();
        let mut short = 12u64.to_be_bytes().to_vec();
        short.extend_from_slice(&[0u8; 4]);
        write_frame(&mut stream, &short).unwrap();
    });

    let mut client = Client::connect(&config_for(&addr)).unwrap();
    let response = client.get(b"k").unwrap();

    assert!(response.is_invalid());
    assert!(response.entries.is_empty());

    server.join().unwrap();
}

#[test]
fn test_oversized_response_rejected() {
    let (addr, server) = spawn_server(|mut stream| {
        read_frame(&mut stream).unwrap();
        let big = encode_response(Opcode::Ok, &[KvEntry::new("k", vec![0u8; 4096])]).unwrap();
        // The client may hang up before reading everything
        let _ = stream.write_all(&big);
    });

    let config = ClientConfig::builder()
        .server_addr(&addr)
        .read_timeout_ms(5000)
        .max_frame_len(1024)
        .build();
    let mut client = Client::connect(&config).unwrap();
    let err = client.get(b"k").unwrap_err();

    assert!(matches!(err, ClientError::FrameTooLarge { max: 1024, .. }));

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_transport_error_poisons_connection() {
    let (addr, server) = spawn_server(|mut stream| {
        read_frame(&mut stream).unwrap();
        let big = encode_response(Opcode::Ok, &[KvEntry::new("k", vec![0u8; 2000])]).unwrap();
        let _ = stream.write_all(&big);

        // A second request must never reach the wire
        if read_frame(&mut stream).is_ok() {
            let _ = write_frame(&mut stream, &encode_response(Opcode::DataNotFound, &[]).unwrap());
            panic!("client sent a request on a desynchronised stream");
        }
    });

    let config = ClientConfig::builder()
        .server_addr(&addr)
        .read_timeout_ms(5000)
        .max_frame_len(1024)
        .build();
    let mut client = Client::connect(&config).unwrap();

    let first = client.get(b"k").unwrap_err();
    assert!(matches!(first, ClientError::FrameTooLarge { max: 1024, .. }));
    assert!(client.is_broken());

    let second = client.get(b"k").unwrap_err();
    assert!(matches!(second, ClientError::ConnectionBroken));
    assert!(second.is_transport());

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_field_error_keeps_connection_usable() {
    let (addr, server) = spawn_server(serve_store);
    let mut client = Client::connect(&config_for(&addr)).unwrap();

    assert!(client.delete_cursor(&vec![b'c'; 256]).is_err());
    assert!(!client.is_broken());
    assert_eq!(
        client.get(b"missing").unwrap().status,
        Status::Opcode(Opcode::DataNotFound)
    );

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_oversized_field_sends_nothing() {
    let (addr, server) = spawn_server(|mut stream| {
        // First frame to arrive must be the valid GET
        let frame = read_frame(&mut stream).unwrap();
        assert_eq!(
            decode_command(&frame).unwrap(),
            Command::Get { key: b"ok".to_vec() }
        );
        write_frame(&mut stream, &encode_response(Opcode::DataNotFound, &[]).unwrap()).unwrap();
    });

    let mut client = Client::connect(&config_for(&addr)).unwrap();
    let err = client.create_cursor(&vec![b'c'; 300], b"k").unwrap_err();
    assert!(matches!(err, ClientError::FieldTooLong { .. }));

    let response = client.get(b"ok").unwrap();
    assert_eq!(response.status, Status::Opcode(Opcode::DataNotFound));

    server.join().unwrap();
}

#[test]
fn test_connect_refused() {
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let result = Client::connect(&config_for(&addr));
    assert!(matches!(result, Err(ClientError::Io(_))));
}

#[test]
fn test_peer_addr_reported() {
    let (addr, server) = spawn_server(|_stream| {});
    let client = Client::connect(&config_for(&addr)).unwrap();
    assert_eq!(client.peer_addr(), addr);

    drop(client);
    server.join().unwrap();
}
