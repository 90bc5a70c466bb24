//! # Calldata Encoding
//!
//! Wire encoding for the escrow entrypoints. 256-bit values split
//! little-endian into `(low, high)` 128-bit limbs; byte strings encode as
//! the on-chain byte-array struct: full 31-byte big-endian chunks, a
//! pending word of the 0..=30 remaining bytes, and the remainder length.

use primitive_types::U256;
use sb_types::u256_words;

/// Bytes per full byte-array chunk.
const CHUNK_BYTES: usize = 31;

/// The on-chain byte-array representation of an arbitrary byte string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ByteArrayCalldata {
    /// Full 31-byte chunks, each as 0x-hex.
    pub data: Vec<String>,
    /// Remaining 0..=30 bytes as 0x-hex.
    pub pending_word: String,
    /// Length of the remainder in bytes.
    pub pending_word_len: usize,
}

impl ByteArrayCalldata {
    /// Flatten to calldata felts: `[len(data), data..., pending_word,
    /// pending_word_len]`.
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.data.len() + 3);
        out.push(felt_hex(self.data.len() as u128));
        out.extend(self.data.iter().cloned());
        out.push(self.pending_word.clone());
        out.push(felt_hex(self.pending_word_len as u128));
        out
    }
}

/// Encode a preimage byte string as the byte-array struct.
pub fn encode_preimage(preimage: &[u8]) -> ByteArrayCalldata {
    let mut chunks = preimage.chunks_exact(CHUNK_BYTES);
    let data: Vec<String> = chunks.by_ref().map(bytes_hex).collect();
    let remainder = chunks.remainder();
    ByteArrayCalldata {
        data,
        pending_word: bytes_hex(remainder),
        pending_word_len: remainder.len(),
    }
}

/// Format an integer as a 0x-hex felt.
pub fn felt_hex(value: u128) -> String {
    format!("0x{value:x}")
}

/// Format bytes as a 0x-hex big-endian integer. Empty bytes format as 0x0.
fn bytes_hex(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "0x0".to_string();
    }
    let stripped = hex::encode(bytes);
    let stripped = stripped.trim_start_matches('0');
    if stripped.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{stripped}")
    }
}

/// Encode a 256-bit value as its `(low, high)` limb felts.
pub fn u256_calldata(value: U256) -> [String; 2] {
    let (low, high) = u256_words(value);
    [felt_hex(low), felt_hex(high)]
}
