//! Protocol Module
//!
//! Client side of the YesSQL binary protocol.
//!
//! ## Frames
//! Every message, in either direction, is a frame:
//! ```text
//! ┌───────────────┬─────────────────────────────────────────┐
//! │ Total Len (8) │          Body (Total Len - 8)           │
//! └───────────────┴─────────────────────────────────────────┘
//! ```
//! All integers are big-endian. The length counts the prefix itself.
//!
//! ## Components
//! - [`codec`]: one encoder per request opcode, plus the response decoder
//! - [`frame`]: reads a single complete frame from a stream
//!
//! ### Opcodes
//! - 0: OK              - 7: GET_FB
//! - 1: ERR             - 8: REMOVE
//! - 2: GET             - 9: CREATE_CURSOR
//! - 3: SET             - 10: DELETE_CURSOR
//! - 4: GET_KEYS        - 11: DATA_NOT_FOUND
//! - 5: GET_KEYS_PREFIX - 12: INVALID_COMMAND
//! - 6: GET_FF
//!
//! ### Error Codes (ERR body)
//! - 0: UNKNOWN
//! - 1: PARTITION_DIED
//! - 2: CURSOR_NOT_FOUND
//! - 3: MSG_TOO_SHORT

mod command;
mod opcode;
mod response;
pub mod codec;
pub mod frame;

pub use command::{Command, Field};
pub use opcode::{ErrorCode, Opcode};
pub use response::{KvEntry, Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_create_cursor,
    encode_delete_cursor, encode_error_response, encode_get, encode_get_fb, encode_get_ff,
    encode_get_keys, encode_get_keys_prefix, encode_remove, encode_response, encode_set,
    LENGTH_PREFIX_SIZE, RESPONSE_HEADER_SIZE,
};
pub use frame::{read_frame, read_frame_limited, write_frame};
