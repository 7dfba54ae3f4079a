//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Single-key Request Header
//! ```text
//! ┌───────────────┬───────────────┬────────────┬──────────────
//! │ Total Len (8) │ Elements (8)  │ Opcode (2) │ fields ...
//! └───────────────┴───────────────┴────────────┴──────────────
//! ```
//!
//! ### Cursor-stepping Request Header
//! ```text
//! ┌───────────────┬──────────────┬───────────┬────────────┬──────────────
//! │ Total Len (8) │ Reserved (6) │ Count (2) │ Opcode (2) │ fields ...
//! └───────────────┴──────────────┴───────────┴────────────┴──────────────
//! ```
//!
//! ### Fields by Opcode
//! - SET:             key_len (2) + key, val_len (4) + value
//! - GET, REMOVE:     key_len (2) + key
//! - CREATE_CURSOR:   name_len (1) + name, key_len (2) + key
//! - DELETE_CURSOR:   name_len (1) + name
//! - GET_FF, GET_FB,
//!   GET_KEYS:        name_len (1) + name
//! - GET_KEYS_PREFIX: name_len (1) + name, prefix_len (2) + prefix
//!
//! ### Response Format
//! ```text
//! ┌───────────────┬──────────────┬────────────┬──────────────────────────────────┐
//! │ Total Len (8) │ Elements (8) │ Opcode (2) │ ERR: code (2) | N × entry        │
//! └───────────────┴──────────────┴────────────┴──────────────────────────────────┘
//! entry = key_len (2) + key [+ val_len (4) + value]
//! ```

use bytes::{Buf, BufMut};

use crate::error::{ClientError, Result};
use super::{Command, ErrorCode, Field, KvEntry, Opcode, Response, Status};

/// Size of the total-length prefix that starts every frame
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Length prefix + element count (or reserved + count) + opcode
pub const RESPONSE_HEADER_SIZE: usize = 18;

/// Reserved zero bytes in the cursor-stepping header
const RESERVED_SIZE: usize = 6;

/// Offset of the opcode, identical for both header forms
const OPCODE_OFFSET: usize = 16;

// =============================================================================
// Frame Builder
// =============================================================================

/// Accumulates one frame; the length prefix is patched in by `finish`
struct FrameBuilder {
    buf: Vec<u8>,
}

impl FrameBuilder {
    /// Header with an 8-byte element count
    fn counted(opcode: Opcode, elements: u64) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.put_u64(0);
        buf.put_u64(elements);
        buf.put_u16(opcode.code());
        Self { buf }
    }

    /// Header with 6 reserved bytes and a 2-byte requested count
    fn cursor_step(opcode: Opcode, count: u16) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.put_u64(0);
        buf.put_bytes(0, RESERVED_SIZE);
        buf.put_u16(count);
        buf.put_u16(opcode.code());
        Self { buf }
    }

    /// Append a length-prefixed field
    fn field(mut self, field: Field, bytes: &[u8]) -> Result<Self> {
        check_len(field, bytes)?;
        let len = bytes.len();
        match field {
            Field::CursorName => self.buf.put_u8(len as u8),
            Field::Key | Field::Prefix => self.buf.put_u16(len as u16),
            Field::Value => self.buf.put_u32(len as u32),
        }
        self.buf.put_slice(bytes);
        Ok(self)
    }

    fn finish(mut self) -> Vec<u8> {
        let total_len = self.buf.len() as u64;
        self.buf[..LENGTH_PREFIX_SIZE].copy_from_slice(&total_len.to_be_bytes());
        self.buf
    }
}

fn check_len(field: Field, bytes: &[u8]) -> Result<()> {
    if bytes.len() as u64 > field.max_len() {
        return Err(ClientError::FieldTooLong {
            field,
            len: bytes.len(),
            max: field.max_len(),
        });
    }
    Ok(())
}

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode a SET request
pub fn encode_set(key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
    Ok(FrameBuilder::counted(Opcode::Set, 1)
        .field(Field::Key, key)?
        .field(Field::Value, value)?
        .finish())
}

/// Encode a GET request
pub fn encode_get(key: &[u8]) -> Result<Vec<u8>> {
    Ok(FrameBuilder::counted(Opcode::Get, 1)
        .field(Field::Key, key)?
        .finish())
}

/// Encode a REMOVE request
pub fn encode_remove(key: &[u8]) -> Result<Vec<u8>> {
    Ok(FrameBuilder::counted(Opcode::Remove, 1)
        .field(Field::Key, key)?
        .finish())
}

/// Encode a CREATE_CURSOR request
pub fn encode_create_cursor(cursor: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    Ok(FrameBuilder::counted(Opcode::CreateCursor, 1)
        .field(Field::CursorName, cursor)?
        .field(Field::Key, key)?
        .finish())
}

/// Encode a DELETE_CURSOR request
pub fn encode_delete_cursor(cursor: &[u8]) -> Result<Vec<u8>> {
    Ok(FrameBuilder::counted(Opcode::DeleteCursor, 1)
        .field(Field::CursorName, cursor)?
        .finish())
}

/// Encode a GET_FF (step forward) request
pub fn encode_get_ff(cursor: &[u8], count: u16) -> Result<Vec<u8>> {
    encode_cursor_step(Opcode::GetFf, cursor, count)
}

/// Encode a GET_FB (step backward) request
pub fn encode_get_fb(cursor: &[u8], count: u16) -> Result<Vec<u8>> {
    encode_cursor_step(Opcode::GetFb, cursor, count)
}

/// Encode a GET_KEYS request
pub fn encode_get_keys(cursor: &[u8], count: u16) -> Result<Vec<u8>> {
    encode_cursor_step(Opcode::GetKeys, cursor, count)
}

/// Encode a GET_KEYS_PREFIX request
pub fn encode_get_keys_prefix(cursor: &[u8], count: u16, prefix: &[u8]) -> Result<Vec<u8>> {
    Ok(FrameBuilder::cursor_step(Opcode::GetKeysPrefix, count)
        .field(Field::CursorName, cursor)?
        .field(Field::Prefix, prefix)?
        .finish())
}

fn encode_cursor_step(opcode: Opcode, cursor: &[u8], count: u16) -> Result<Vec<u8>> {
    Ok(FrameBuilder::cursor_step(opcode, count)
        .field(Field::CursorName, cursor)?
        .finish())
}

/// Encode a command to a complete frame
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    match command {
        Command::Get { key } => encode_get(key),
        Command::Set { key, value } => encode_set(key, value),
        Command::Remove { key } => encode_remove(key),
        Command::CreateCursor { cursor, key } => encode_create_cursor(cursor, key),
        Command::DeleteCursor { cursor } => encode_delete_cursor(cursor),
        Command::GetFf { cursor, count } => encode_get_ff(cursor, *count),
        Command::GetFb { cursor, count } => encode_get_fb(cursor, *count),
        Command::GetKeys { cursor, count } => encode_get_keys(cursor, *count),
        Command::GetKeysPrefix {
            cursor,
            count,
            prefix,
        } => encode_get_keys_prefix(cursor, *count, prefix),
    }
}

// =============================================================================
// Request Decoding
// =============================================================================

/// Decode a request frame
///
/// Strict counterpart of the encoder: any deviation from the documented
/// layout is a protocol error.
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    if bytes.len() < RESPONSE_HEADER_SIZE {
        return Err(ClientError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            RESPONSE_HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut buf = bytes;
    let total_len = buf.get_u64();
    if total_len != bytes.len() as u64 {
        return Err(ClientError::Protocol(format!(
            "Length prefix {} does not match frame size {}",
            total_len,
            bytes.len()
        )));
    }

    let code = u16::from_be_bytes([bytes[OPCODE_OFFSET], bytes[OPCODE_OFFSET + 1]]);
    let opcode = Opcode::from_u16(code).ok_or_else(|| {
        ClientError::Protocol(format!("Unknown opcode: {}", code))
    })?;

    let count = if opcode.is_cursor_step() {
        if buf[..RESERVED_SIZE].iter().any(|b| *b != 0) {
            return Err(ClientError::Protocol(format!(
                "{} request: reserved header bytes are not zero",
                opcode
            )));
        }
        buf.advance(RESERVED_SIZE);
        buf.get_u16()
    } else {
        let elements = buf.get_u64();
        if elements != 1 {
            return Err(ClientError::Protocol(format!(
                "{} request: expected element count 1, got {}",
                opcode, elements
            )));
        }
        0
    };
    buf.advance(2); // opcode, already read

    let command = match opcode {
        Opcode::Get => Command::Get {
            key: expect_field(&mut buf, Field::Key, opcode)?,
        },
        Opcode::Set => {
            let key = expect_field(&mut buf, Field::Key, opcode)?;
            let value = expect_field(&mut buf, Field::Value, opcode)?;
            Command::Set { key, value }
        }
        Opcode::Remove => Command::Remove {
            key: expect_field(&mut buf, Field::Key, opcode)?,
        },
        Opcode::CreateCursor => {
            let cursor = expect_field(&mut buf, Field::CursorName, opcode)?;
            let key = expect_field(&mut buf, Field::Key, opcode)?;
            Command::CreateCursor { cursor, key }
        }
        Opcode::DeleteCursor => Command::DeleteCursor {
            cursor: expect_field(&mut buf, Field::CursorName, opcode)?,
        },
        Opcode::GetFf => Command::GetFf {
            cursor: expect_field(&mut buf, Field::CursorName, opcode)?,
            count,
        },
        Opcode::GetFb => Command::GetFb {
            cursor: expect_field(&mut buf, Field::CursorName, opcode)?,
            count,
        },
        Opcode::GetKeys => Command::GetKeys {
            cursor: expect_field(&mut buf, Field::CursorName, opcode)?,
            count,
        },
        Opcode::GetKeysPrefix => {
            let cursor = expect_field(&mut buf, Field::CursorName, opcode)?;
            let prefix = expect_field(&mut buf, Field::Prefix, opcode)?;
            Command::GetKeysPrefix {
                cursor,
                count,
                prefix,
            }
        }
        Opcode::Ok | Opcode::Err | Opcode::DataNotFound | Opcode::InvalidCommand => {
            return Err(ClientError::Protocol(format!(
                "{} is not a request opcode",
                opcode
            )))
        }
    };

    if buf.has_remaining() {
        return Err(ClientError::Protocol(format!(
            "{} request: {} trailing bytes",
            opcode,
            buf.remaining()
        )));
    }

    Ok(command)
}

fn expect_field(buf: &mut &[u8], field: Field, opcode: Opcode) -> Result<Vec<u8>> {
    take_field(buf, field).ok_or_else(|| {
        ClientError::Protocol(format!("{} request: missing or incomplete {}", opcode, field))
    })
}

/// Read one length-prefixed field, or `None` if the buffer runs out
fn take_field(buf: &mut &[u8], field: Field) -> Option<Vec<u8>> {
    if buf.remaining() < field.prefix_width() {
        return None;
    }
    let len = match field {
        Field::CursorName => buf.get_u8() as usize,
        Field::Key | Field::Prefix => buf.get_u16() as usize,
        Field::Value => buf.get_u32() as usize,
    };
    if buf.remaining() < len {
        return None;
    }
    let mut out = vec![0u8; len];
    buf.copy_to_slice(&mut out);
    Some(out)
}

// =============================================================================
// Response Encoding
// =============================================================================

/// Encode a success response carrying `entries`
///
/// Entries without a value are written key-only.
pub fn encode_response(opcode: Opcode, entries: &[KvEntry]) -> Result<Vec<u8>> {
    if opcode == Opcode::Err {
        return Err(ClientError::Protocol(
            "ERR responses carry an error code, not entries".to_string(),
        ));
    }

    let mut builder = FrameBuilder::counted(opcode, entries.len() as u64);
    for entry in entries {
        builder = builder.field(Field::Key, &entry.key)?;
        if let Some(value) = &entry.value {
            builder = builder.field(Field::Value, value)?;
        }
    }
    Ok(builder.finish())
}

/// Encode an `ERR` response
pub fn encode_error_response(code: ErrorCode) -> Vec<u8> {
    let mut builder = FrameBuilder::counted(Opcode::Err, 0);
    builder.buf.put_u16(code.code());
    builder.finish()
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Decode one complete response frame
///
/// Never fails. A frame too short for the header yields the
/// [`Status::Invalid`] sentinel; a field that would run past the end of the
/// frame stops decoding and the entries read so far are returned with
/// `truncated` set.
///
/// With `keys_only` no value-length field is read, even if bytes remain.
pub fn decode_response(frame: &[u8], keys_only: bool) -> Response {
    if frame.len() < RESPONSE_HEADER_SIZE {
        tracing::debug!(len = frame.len(), "response shorter than header");
        return Response::invalid();
    }

    let mut buf = frame;
    let total_len = buf.get_u64();
    if total_len != frame.len() as u64 {
        tracing::debug!(
            total_len,
            actual = frame.len(),
            "length prefix disagrees with frame size"
        );
    }
    let count = buf.get_u64();
    let code = buf.get_u16();

    if code == Opcode::Err.code() {
        if buf.remaining() < 2 {
            tracing::debug!("ERR response without an error code");
            return Response {
                status: Status::Error(ErrorCode::Unknown),
                entries: Vec::new(),
                truncated: true,
            };
        }
        return Response {
            status: Status::Error(ErrorCode::from_u16(buf.get_u16())),
            entries: Vec::new(),
            truncated: false,
        };
    }

    let status = match Opcode::from_u16(code) {
        Some(opcode) => Status::Opcode(opcode),
        None => Status::Unknown(code),
    };
    let (entries, truncated) = decode_entries(buf, count, keys_only);
    if truncated {
        tracing::debug!(
            expected = count,
            decoded = entries.len(),
            "response entries truncated"
        );
    }

    Response {
        status,
        entries,
        truncated,
    }
}

fn decode_entries(mut buf: &[u8], count: u64, keys_only: bool) -> (Vec<KvEntry>, bool) {
    // Every entry costs at least its 2-byte key length
    let capacity = count.min((buf.remaining() / 2) as u64) as usize;
    let mut entries = Vec::with_capacity(capacity);

    for _ in 0..count {
        let key = match take_field(&mut buf, Field::Key) {
            Some(key) => key,
            None => return (entries, true),
        };

        if keys_only {
            entries.push(KvEntry::key_only(key));
            continue;
        }

        match take_field(&mut buf, Field::Value) {
            Some(value) => entries.push(KvEntry::new(key, value)),
            None => {
                // Value-bearing entries always carry Some; the cut is in `truncated`
                entries.push(KvEntry::new(key, Vec::new()));
                return (entries, true);
            }
        }
    }

    (entries, false)
}
