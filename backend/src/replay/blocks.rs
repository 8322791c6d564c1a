//! Replay data blocks.
//!
//! The game data follows the header as `block_count` zlib blocks:
//!
//! ```text
//! 2  compressed size (n)
//! 2  decompressed size
//! 4  checksum (ignored)
//! n  zlib stream
//! ```
//!
//! Streams are flushed, not finished, so they are inflated with a raw
//! [`Decompress`] rather than a reader that expects a stream end.

use flate2::{Decompress, FlushDecompress};

use crate::error::{ReplayError, ReplayResult};
use crate::models::ReplayHeader;

/// Size of a block header.
pub const BLOCK_HEADER_LEN: usize = 8;

/// Inflate every block and concatenate the game data.
pub fn decompress_blocks(bytes: &[u8], header: &ReplayHeader) -> ReplayResult<Vec<u8>> {
    let mut offset = header.header_size as usize;
    let mut data = Vec::with_capacity(header.decompressed_size as usize);

    for block in 0..header.block_count as usize {
        let head = bytes
            .get(offset..offset + BLOCK_HEADER_LEN)
            .ok_or(ReplayError::Truncated { needed: offset + BLOCK_HEADER_LEN, got: bytes.len() })?;
        let compressed = u16::from_le_bytes([head[0], head[1]]) as usize;
        let expected = u16::from_le_bytes([head[2], head[3]]) as usize;
        offset += BLOCK_HEADER_LEN;

        let raw = bytes
            .get(offset..offset + compressed)
            .ok_or(ReplayError::Truncated { needed: offset + compressed, got: bytes.len() })?;
        offset += compressed;

        let inflated = inflate(raw, expected).map_err(|message| ReplayError::Decompress { block, message })?;
        if inflated.len() != expected {
            return Err(ReplayError::BlockSize { block, expected, got: inflated.len() });
        }
        data.extend_from_slice(&inflated);
    }

    Ok(data)
}

/// Inflate at most `limit` bytes of one zlib stream.
fn inflate(raw: &[u8], limit: usize) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(limit);
    Decompress::new(true)
        .decompress_vec(raw, &mut out, FlushDecompress::Sync)
        .map_err(|e| e.to_string())?;
    out.truncate(limit);
    Ok(out)
}
