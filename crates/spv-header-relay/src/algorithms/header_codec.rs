//! # Header Codec
//!
//! Fixed-layout 80-byte header parsing and block identity hashing.
//!
//! Wire layout:
//!
//! | Offset | Size | Field | Encoding |
//! |--------|------|-------|----------|
//! | 0 | 4 | version | LE i32 |
//! | 4 | 32 | prev_hash | wire order (reversed identifier) |
//! | 36 | 32 | merkle_root | wire order (reversed identifier) |
//! | 68 | 4 | time | LE u32 |
//! | 72 | 4 | bits | LE u32 |
//! | 76 | 4 | nonce | LE u32 |
//!
//! The network writes hashes least-significant byte first. Every identifier
//! in this crate is held reversed, so that comparing bytes lexicographically
//! is comparing big-endian integers (which is what the PoW rule needs).

use crate::domain::{BlockHeader, Hash, RelayError, RAW_HEADER_LEN};
use primitive_types::U256;
use sha2::{Digest, Sha256};

/// Serialized header.
pub type RawHeader = [u8; RAW_HEADER_LEN];

/// Parse a raw header and compute its identifier.
pub fn parse(raw: &[u8]) -> Result<(BlockHeader, Hash), RelayError> {
    if raw.len() != RAW_HEADER_LEN {
        return Err(RelayError::Format(format!(
            "header must be {} bytes, got {}",
            RAW_HEADER_LEN,
            raw.len()
        )));
    }

    let header = BlockHeader {
        version: i32::from_le_bytes(read_4(raw, 0)),
        prev_hash: read_identifier(raw, 4),
        merkle_root: read_identifier(raw, 36),
        time: u32::from_le_bytes(read_4(raw, 68)),
        bits: u32::from_le_bytes(read_4(raw, 72)),
        nonce: u32::from_le_bytes(read_4(raw, 76)),
    };

    Ok((header, block_hash(raw)))
}

/// Serialize a header back to its wire form.
pub fn serialize(header: &BlockHeader) -> RawHeader {
    let mut raw = [0u8; RAW_HEADER_LEN];
    raw[0..4].copy_from_slice(&header.version.to_le_bytes());
    raw[4..36].copy_from_slice(&reverse(&header.prev_hash));
    raw[36..68].copy_from_slice(&reverse(&header.merkle_root));
    raw[68..72].copy_from_slice(&header.time.to_le_bytes());
    raw[72..76].copy_from_slice(&header.bits.to_le_bytes());
    raw[76..80].copy_from_slice(&header.nonce.to_le_bytes());
    raw
}

/// Identifier of a serialized header.
pub fn block_hash(raw: &[u8]) -> Hash {
    reverse(&sha256d(raw))
}

/// Double SHA-256, digest in natural (wire) order.
pub fn sha256d(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut output = [0u8; 32];
    output.copy_from_slice(&second);
    output
}

/// Reverse a 32-byte value between wire and identifier order.
pub fn reverse(hash: &Hash) -> Hash {
    let mut out = *hash;
    out.reverse();
    out
}

/// Identifier as a 256-bit integer.
pub fn hash_to_u256(hash: &Hash) -> U256 {
    U256::from_big_endian(hash)
}

fn read_4(raw: &[u8], offset: usize) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&raw[offset..offset + 4]);
    out
}

fn read_identifier(raw: &[u8], offset: usize) -> Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(&raw[offset..offset + 32]);
    out.reverse();
    out
}
