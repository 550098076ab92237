//! Persist a [`MatrixMap`] as a self-checking byte block.
//!
//! Block layout (little-endian):
//!
//! ```text
//! [magic u32][payload_len u16][postcard payload][crc32 over everything before it]
//! ```
//!
//! A block that does not start with the magic number (for example erased flash,
//! which reads as `0xFF`) loads as `Ok(None)`. A block with the right magic but
//! a bad length, checksum, or payload is an error.
//!
//! # Example
//!
//! ```rust
//! use matrix_envoy::led2d::{ledmap_block, MatrixMap, Panel};
//!
//! let map: MatrixMap<16> = MatrixMap::build(&[Panel::new(4, 4)], None, 16);
//! let mut block = [0xFF_u8; ledmap_block::max_block_len(16)];
//! let len = ledmap_block::save_block(&map, &mut block)?;
//!
//! let loaded: Option<MatrixMap<16>> = ledmap_block::load_block(&block[..len])?;
//! assert_eq!(loaded, Some(map));
//! # Ok::<(), matrix_envoy::Error>(())
//! ```

use crc32fast::Hasher;

use super::MatrixMap;
use crate::{Error, Result};

const MAGIC: u32 = 0x4C4D_4150; // 'LMAP'
const HEADER_SIZE: usize = 4 + 2; // Magic + PayloadLen
const CRC_SIZE: usize = 4;
// Five u16 varints (dimensions, length, overlap count, table length) at 3 bytes each.
const MAX_FIXED_PAYLOAD: usize = 5 * 3;

/// Largest block [`save_block`] can produce for a map of capacity `capacity`.
#[must_use]
pub const fn max_block_len(capacity: usize) -> usize {
    HEADER_SIZE + MAX_FIXED_PAYLOAD + 3 * capacity + CRC_SIZE
}

/// Serialize `map` into the start of `buffer` and return the block length.
///
/// # Errors
///
/// Returns [`Error::FormatError`] if `buffer` is too small for the block.
pub fn save_block<const N: usize>(map: &MatrixMap<N>, buffer: &mut [u8]) -> Result<usize> {
    let payload_room = buffer
        .len()
        .checked_sub(HEADER_SIZE + CRC_SIZE)
        .ok_or(Error::FormatError)?;
    let payload_len = postcard::to_slice(
        map,
        &mut buffer[HEADER_SIZE..HEADER_SIZE + payload_room],
    )
    .map_err(|_| {
        error!(
            "LedmapBlock: serialization failed or data too large (max {} bytes)",
            payload_room
        );
        Error::FormatError
    })?
    .len();
    let stored_len = u16::try_from(payload_len).map_err(|_| Error::FormatError)?;

    buffer[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    buffer[4..HEADER_SIZE].copy_from_slice(&stored_len.to_le_bytes());

    let crc_offset = HEADER_SIZE + payload_len;
    let crc = compute_crc(&buffer[0..crc_offset]);
    buffer[crc_offset..crc_offset + CRC_SIZE].copy_from_slice(&crc.to_le_bytes());

    info!("LedmapBlock: saved {} byte payload", payload_len);
    Ok(crc_offset + CRC_SIZE)
}

/// Load a map saved by [`save_block`].
///
/// # Errors
///
/// Returns [`Error::StorageCorrupted`] if the block carries the magic number
/// but its length, checksum, or payload is invalid, or the decoded map breaks
/// the invariants of a built map.
pub fn load_block<const N: usize>(bytes: &[u8]) -> Result<Option<MatrixMap<N>>> {
    if read_u32(bytes, 0) != Some(MAGIC) {
        info!("LedmapBlock: no mapping stored");
        return Ok(None);
    }

    let payload_len = bytes
        .get(4..HEADER_SIZE)
        .map(|len| u16::from_le_bytes([len[0], len[1]]))
        .map(usize::from)
        .ok_or(Error::StorageCorrupted)?;
    let crc_offset = HEADER_SIZE + payload_len;
    let Some(stored_crc) = read_u32(bytes, crc_offset) else {
        error!(
            "LedmapBlock: payload length {} exceeds block of {} bytes",
            payload_len,
            bytes.len()
        );
        return Err(Error::StorageCorrupted);
    };

    let computed_crc = compute_crc(&bytes[0..crc_offset]);
    if stored_crc != computed_crc {
        error!(
            "LedmapBlock: CRC mismatch (expected {}, found {})",
            computed_crc,
            stored_crc
        );
        return Err(Error::StorageCorrupted);
    }

    let map: MatrixMap<N> =
        postcard::from_bytes(&bytes[HEADER_SIZE..crc_offset]).map_err(|_| {
            error!("LedmapBlock: deserialization failed");
            Error::StorageCorrupted
        })?;
    if !map.is_consistent() {
        error!("LedmapBlock: stored mapping is inconsistent");
        return Err(Error::StorageCorrupted);
    }

    info!(
        "LedmapBlock: loaded {}x{} mapping",
        map.width(),
        map.height()
    );
    Ok(Some(map))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let word = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
}

/// Compute CRC32 checksum.
fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
