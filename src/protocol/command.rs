//! Command definitions
//!
//! Typed requests and the length-prefixed fields they carry.

use std::fmt;

use super::Opcode;

/// A length-prefixed request field
///
/// Each field kind has a fixed prefix width, which caps its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Cursor name: 1-byte length
    CursorName,
    /// Key: 2-byte length
    Key,
    /// Value: 4-byte length
    Value,
    /// Key prefix for GET_KEYS_PREFIX: 2-byte length
    Prefix,
}

impl Field {
    /// Width of the length prefix in bytes
    pub fn prefix_width(self) -> usize {
        match self {
            Field::CursorName => 1,
            Field::Key | Field::Prefix => 2,
            Field::Value => 4,
        }
    }

    /// Largest byte length the prefix can express
    pub fn max_len(self) -> u64 {
        match self {
            Field::CursorName => u8::MAX as u64,
            Field::Key | Field::Prefix => u16::MAX as u64,
            Field::Value => u32::MAX as u64,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::CursorName => "cursor name",
            Field::Key => "key",
            Field::Value => "value",
            Field::Prefix => "prefix",
        };
        f.write_str(name)
    }
}

/// A request to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key
    Get { key: Vec<u8> },

    /// Set a key-value pair
    Set { key: Vec<u8>, value: Vec<u8> },

    /// Remove a key
    Remove { key: Vec<u8> },

    /// Create a named cursor positioned at `key`
    CreateCursor { cursor: Vec<u8>, key: Vec<u8> },

    /// Delete a named cursor
    DeleteCursor { cursor: Vec<u8> },

    /// Step a cursor forward, returning up to `count` entries
    GetFf { cursor: Vec<u8>, count: u16 },

    /// Step a cursor backward, returning up to `count` entries
    GetFb { cursor: Vec<u8>, count: u16 },

    /// Enumerate up to `count` keys from a cursor
    GetKeys { cursor: Vec<u8>, count: u16 },

    /// Enumerate up to `count` keys starting with `prefix`
    GetKeysPrefix {
        cursor: Vec<u8>,
        count: u16,
        prefix: Vec<u8>,
    },
}

impl Command {
    /// Get the command opcode
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Get { .. } => Opcode::Get,
            Command::Set { .. } => Opcode::Set,
            Command::Remove { .. } => Opcode::Remove,
            Command::CreateCursor { .. } => Opcode::CreateCursor,
            Command::DeleteCursor { .. } => Opcode::DeleteCursor,
            Command::GetFf { .. } => Opcode::GetFf,
            Command::GetFb { .. } => Opcode::GetFb,
            Command::GetKeys { .. } => Opcode::GetKeys,
            Command::GetKeysPrefix { .. } => Opcode::GetKeysPrefix,
        }
    }

    /// Whether the response to this command omits value fields
    pub fn keys_only(&self) -> bool {
        self.opcode().is_keys_only()
    }
}
