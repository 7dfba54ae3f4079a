//! Blocking Client
//!
//! One TCP connection, strictly one request in flight at a time.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::protocol::{
    decode_response, encode_command, read_frame_limited, write_frame, Command, Response,
};

/// A connection to a YesSQL server
///
/// Every call writes one request frame and blocks until the matching response
/// frame has been read. Methods take `&mut self`, so a connection can never
/// have two reads interleaved on it.
///
/// After any transport error the stream position is unknown, so the client
/// refuses further requests with [`ClientError::ConnectionBroken`].
pub struct Client {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Upper bound on accepted response frames
    max_frame_len: u64,

    /// Peer address for logging
    peer_addr: String,

    /// Set once a read or write failed mid-exchange
    broken: bool,
}

impl Client {
    /// Connect using the given config
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let stream = if config.connect_timeout_ms > 0 {
            let timeout = Duration::from_millis(config.connect_timeout_ms);
            connect_timeout(&config.server_addr, timeout)?
        } else {
            TcpStream::connect(&config.server_addr)?
        };

        Self::from_stream(stream, config)
    }

    /// Wrap an already connected stream
    ///
    /// Applies the timeouts and TCP_NODELAY setting from `config`.
    pub fn from_stream(stream: TcpStream, config: &ClientConfig) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(config.nodelay)?;
        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        let read_stream = stream.try_clone()?;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            max_frame_len: config.max_frame_len,
            peer_addr,
            broken: false,
        })
    }

    /// Send one command and wait for its response
    ///
    /// Transport failures are returned as `Err`; server errors and malformed
    /// replies come back inside the [`Response`].
    pub fn execute(&mut self, command: &Command) -> Result<Response> {
        if self.broken {
            return Err(ClientError::ConnectionBroken);
        }

        let request = encode_command(command)?;
        let opcode = command.opcode();

        tracing::trace!(%opcode, len = request.len(), "Sending request to {}", self.peer_addr);

        if let Err(e) = write_frame(&mut self.writer, &request) {
            tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
            self.broken = true;
            return Err(e);
        }

        let frame = match read_frame_limited(&mut self.reader, self.max_frame_len) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                self.broken = true;
                return Err(e);
            }
        };

        let response = decode_response(&frame, command.keys_only());
        if response.is_invalid() {
            tracing::warn!(%opcode, len = frame.len(), "Malformed response from {}", self.peer_addr);
        }
        tracing::trace!(
            %opcode,
            status = %response.status.name(),
            entries = response.entries.len(),
            "Received response"
        );

        Ok(response)
    }

    /// Get a value by key
    pub fn get(&mut self, key: &[u8]) -> Result<Response> {
        self.execute(&Command::Get { key: key.to_vec() })
    }

    /// Set a key-value pair
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<Response> {
        self.execute(&Command::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Remove a key
    pub fn remove(&mut self, key: &[u8]) -> Result<Response> {
        self.execute(&Command::Remove { key: key.to_vec() })
    }

    /// Create a named cursor at `key`
    pub fn create_cursor(&mut self, cursor: &[u8], key: &[u8]) -> Result<Response> {
        self.execute(&Command::CreateCursor {
            cursor: cursor.to_vec(),
            key: key.to_vec(),
        })
    }

    /// Delete a named cursor
    pub fn delete_cursor(&mut self, cursor: &[u8]) -> Result<Response> {
        self.execute(&Command::DeleteCursor {
            cursor: cursor.to_vec(),
        })
    }

    /// Step a cursor forward
    pub fn get_ff(&mut self, cursor: &[u8], count: u16) -> Result<Response> {
        self.execute(&Command::GetFf {
            cursor: cursor.to_vec(),
            count,
        })
    }

    /// Step a cursor backward
    pub fn get_fb(&mut self, cursor: &[u8], count: u16) -> Result<Response> {
        self.execute(&Command::GetFb {
            cursor: cursor.to_vec(),
            count,
        })
    }

    /// List keys from a cursor
    pub fn get_keys(&mut self, cursor: &[u8], count: u16) -> Result<Response> {
        self.execute(&Command::GetKeys {
            cursor: cursor.to_vec(),
            count,
        })
    }

    /// List keys starting with `prefix`
    pub fn get_keys_prefix(&mut self, cursor: &[u8], count: u16, prefix: &[u8]) -> Result<Response> {
        self.execute(&Command::GetKeysPrefix {
            cursor: cursor.to_vec(),
            count,
            prefix: prefix.to_vec(),
        })
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Whether a transport error has made this connection unusable
    pub fn is_broken(&self) -> bool {
        self.broken
    }
}

/// Try each resolved address in turn
fn connect_timeout(addr: &str, timeout: Duration) -> Result<TcpStream> {
    let mut last_err = None;
    for socket_addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&socket_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", socket_addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(e) => e.into(),
        None => ClientError::Config(format!("address {} resolved to nothing", addr)),
    })
}
