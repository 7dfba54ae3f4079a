//! Frame I/O
//!
//! Reads and writes whole length-prefixed frames on a byte stream.
//!
//! A stream may hand back fewer bytes than asked for on any call, so the
//! reader keeps accumulating until the length prefix is satisfied. A frame is
//! either returned whole or not at all.

use std::io::{self, Read, Write};

use crate::error::{ClientError, Result};
use super::LENGTH_PREFIX_SIZE;

/// Read exactly one frame, prefix included
///
/// Blocks until the frame is complete or the stream fails.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    read_frame_limited(reader, u64::MAX)
}

/// Read exactly one frame, rejecting length prefixes above `max_len`
pub fn read_frame_limited<R: Read>(reader: &mut R, max_len: u64) -> Result<Vec<u8>> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    fill(reader, &mut prefix, 0, LENGTH_PREFIX_SIZE as u64)?;

    let total_len = u64::from_be_bytes(prefix);
    if total_len < LENGTH_PREFIX_SIZE as u64 {
        return Err(ClientError::InvalidFrameLength(total_len));
    }
    if total_len > max_len {
        return Err(ClientError::FrameTooLarge {
            len: total_len,
            max: max_len,
        });
    }

    let size = usize::try_from(total_len).map_err(|_| ClientError::FrameTooLarge {
        len: total_len,
        max: usize::MAX as u64,
    })?;
    let mut frame = Vec::new();
    frame
        .try_reserve_exact(size)
        .map_err(|_| ClientError::FrameTooLarge {
            len: total_len,
            max: max_len,
        })?;
    frame.extend_from_slice(&prefix);
    frame.resize(size, 0);

    fill(
        reader,
        &mut frame[LENGTH_PREFIX_SIZE..],
        LENGTH_PREFIX_SIZE as u64,
        total_len,
    )?;

    tracing::trace!(len = total_len, "frame received");
    Ok(frame)
}

/// Fill `buf` completely from `reader`
///
/// `offset` and `expected` only feed the error report when the peer closes
/// the stream early.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8], offset: u64, expected: u64) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(ClientError::ConnectionClosed {
                    received: offset + filled as u64,
                    expected,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Write one frame and flush
pub fn write_frame<W: Write>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer.write_all(frame)?;
    writer.flush()?;
    Ok(())
}
