//! Digest rendering
//!
//! Digests are rendered as lowercase hex with every *leading* zero byte
//! dropped. Once a non-zero byte has been seen, later zero bytes are kept,
//! so `[0x00, 0xca, 0xfe]` renders as `"cafe"` and `[0x0c, 0xa1]` as `"0ca1"`.
//! An all-zero digest renders as the empty string.
//!
//! NOTE: this is not fixed-width digest formatting; it probably meant to strip
//! the sign byte of a two's-complement integer. The output must not change.

/// Render `bytes` as lowercase hex, skipping leading zero bytes
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len());
    hex::encode(&bytes[start..])
}
