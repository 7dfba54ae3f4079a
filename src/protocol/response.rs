//! Response definitions
//!
//! Represents decoded server replies.

use super::{ErrorCode, Opcode};

/// Classification of a response frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Frame too short to hold the response header
    Invalid,

    /// Server reported an error (`ERR` opcode)
    Error(ErrorCode),

    /// Any recognised non-error opcode (OK, DATA_NOT_FOUND, ...)
    Opcode(Opcode),

    /// Opcode outside the known table
    Unknown(u16),
}

impl Status {
    /// Protocol name of the status, `INVALID` for the malformed sentinel
    pub fn name(&self) -> String {
        match self {
            Status::Invalid => "INVALID".to_string(),
            Status::Error(_) => Opcode::Err.name().to_string(),
            Status::Opcode(op) => op.name().to_string(),
            Status::Unknown(code) => format!("UNKNOWN({})", code),
        }
    }
}

/// One result entry, in server iteration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvEntry {
    pub key: Vec<u8>,

    /// `None` only for keys-only responses. A value cut off by a short frame
    /// is `Some(empty)`, with [`Response::truncated`] set.
    pub value: Option<Vec<u8>>,
}

impl KvEntry {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn key_only(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

/// A decoded response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status derived from the opcode
    pub status: Status,

    /// Entries in the order they appeared on the wire
    pub entries: Vec<KvEntry>,

    /// Decoding stopped before the frame was fully accounted for
    pub truncated: bool,
}

impl Response {
    /// The malformed-response sentinel
    pub fn invalid() -> Self {
        Self {
            status: Status::Invalid,
            entries: Vec::new(),
            truncated: true,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.status == Status::Invalid
    }

    /// Server error code, if this is an `ERR` response
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self.status {
            Status::Error(code) => Some(code),
            _ => None,
        }
    }

    /// Recognised opcode, `Some(Opcode::Err)` for error responses
    pub fn opcode(&self) -> Option<Opcode> {
        match self.status {
            Status::Opcode(op) => Some(op),
            Status::Error(_) => Some(Opcode::Err),
            Status::Invalid | Status::Unknown(_) => None,
        }
    }

    /// Value of the first entry, the usual shape of a GET reply
    pub fn first_value(&self) -> Option<&[u8]> {
        self.entries.first().and_then(|e| e.value.as_deref())
    }
}
