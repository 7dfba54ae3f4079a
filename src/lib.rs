//! # yessql-client
//!
//! Client for the YesSQL key-value store:
//! - Byte-exact request encoding for every opcode
//! - Frame reader that survives arbitrary stream fragmentation
//! - Lenient response decoder (truncated input degrades, never panics)
//! - Blocking single-connection TCP client
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Client (network)                          │
//! │          one request in flight per connection                │
//! └──────┬──────────────────────────────────────────▲───────────┘
//!        │ Command                                   │ Response
//!        ▼                                           │
//! ┌─────────────┐      ┌──────────────┐      ┌───────┴───────┐
//! │   Encoder   │─────▶│  TCP stream  │─────▶│ Frame Reader  │
//! │  (codec)    │      │              │      │   (frame)     │
//! └─────────────┘      └──────────────┘      └───────┬───────┘
//!                                                    │ frame
//!                                                    ▼
//!                                            ┌───────────────┐
//!                                            │   Decoder     │
//!                                            │   (codec)     │
//!                                            └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ClientError, Result};
pub use config::ClientConfig;
pub use network::Client;
pub use protocol::{Command, ErrorCode, KvEntry, Opcode, Response, Status};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
