use crate::protocol::error::{ProtocolError, Result};
use std::io::{Read, Write};
use tracing::debug;

/// Maximum accepted frame payload length in bytes.
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

/// Size of the big-endian length prefix in bytes.
pub const FRAME_HEADER_LEN: usize = 4;

/// Write one frame: a 4-byte big-endian length prefix followed by the payload.
///
/// Returns the total number of bytes written, header included.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<usize> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_LEN,
        });
    }

    let header = (payload.len() as u32).to_be_bytes();
    writer.write_all(&header)?;
    writer.write_all(payload)?;
    writer.flush()?;

    debug!(payload_len = payload.len(), "Frame written");
    Ok(FRAME_HEADER_LEN + payload.len())
}

/// Read one frame, blocking until the full payload has arrived.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header)?;

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        debug!(len, max = MAX_FRAME_LEN, "Oversized frame rejected");
        return Err(ProtocolError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    debug!(payload_len = len, "Frame read");
    Ok(payload)
}
