//! Network Module
//!
//! Blocking TCP transport for the protocol.
//!
//! ## Model
//! - One connection per [`Client`]
//! - Write request, read one response frame, decode; no pipelining
//! - No retries: a transport error ends the current operation

mod client;

pub use client::Client;
