//! Opcode and error code tables
//!
//! Both tables are fixed by the server and never renumbered.

use std::fmt;

/// Request/response kinds (2 bytes on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Ok = 0,
    Err = 1,
    Get = 2,
    Set = 3,
    GetKeys = 4,
    GetKeysPrefix = 5,
    GetFf = 6,
    GetFb = 7,
    Remove = 8,
    CreateCursor = 9,
    DeleteCursor = 10,
    DataNotFound = 11,
    InvalidCommand = 12,
}

impl Opcode {
    /// Look up an opcode by its wire value
    pub fn from_u16(code: u16) -> Option<Self> {
        let opcode = match code {
            0 => Opcode::Ok,
            1 => Opcode::Err,
            2 => Opcode::Get,
            3 => Opcode::Set,
            4 => Opcode::GetKeys,
            5 => Opcode::GetKeysPrefix,
            6 => Opcode::GetFf,
            7 => Opcode::GetFb,
            8 => Opcode::Remove,
            9 => Opcode::CreateCursor,
            10 => Opcode::DeleteCursor,
            11 => Opcode::DataNotFound,
            12 => Opcode::InvalidCommand,
            _ => return None,
        };
        Some(opcode)
    }

    /// Wire value
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Protocol name, as printed by the reference clients
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Ok => "OK",
            Opcode::Err => "ERR",
            Opcode::Get => "GET",
            Opcode::Set => "SET",
            Opcode::GetKeys => "GET_KEYS",
            Opcode::GetKeysPrefix => "GET_KEYS_PREFIX",
            Opcode::GetFf => "GET_FF",
            Opcode::GetFb => "GET_FB",
            Opcode::Remove => "REMOVE",
            Opcode::CreateCursor => "CREATE_CURSOR",
            Opcode::DeleteCursor => "DELETE_CURSOR",
            Opcode::DataNotFound => "DATA_NOT_FOUND",
            Opcode::InvalidCommand => "INVALID_COMMAND",
        }
    }

    /// Requests of this kind use the cursor-stepping header
    /// (6 reserved bytes + 2-byte requested count).
    pub fn is_cursor_step(self) -> bool {
        matches!(
            self,
            Opcode::GetFf | Opcode::GetFb | Opcode::GetKeys | Opcode::GetKeysPrefix
        )
    }

    /// Responses to this kind carry keys without value fields
    pub fn is_keys_only(self) -> bool {
        matches!(self, Opcode::GetKeys | Opcode::GetKeysPrefix)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error codes carried in the body of an `ERR` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    Unknown = 0,
    PartitionDied = 1,
    CursorNotFound = 2,
    MsgTooShort = 3,
}

impl ErrorCode {
    /// Map a wire value; anything outside the table is `Unknown`
    pub fn from_u16(code: u16) -> Self {
        match code {
            1 => ErrorCode::PartitionDied,
            2 => ErrorCode::CursorNotFound,
            3 => ErrorCode::MsgTooShort,
            _ => ErrorCode::Unknown,
        }
    }

    /// Wire value
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Unknown => "UNKNOWN",
            ErrorCode::PartitionDied => "PARTITION_DIED",
            ErrorCode::CursorNotFound => "CURSOR_NOT_FOUND",
            ErrorCode::MsgTooShort => "MSG_TOO_SHORT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
