//! # Hex Encoding/Decoding Utilities
//!
//! Hex helpers used for request/response dumps, provisioning output and
//! command-line input.
//!
//! ```rust
//! use lora_modbus_rs::util::hex::{decode_hex, format_hex_spaced};
//!
//! let frame = decode_hex("01 03 00 00 00 02 C4 0B").unwrap();
//! assert_eq!(format_hex_spaced(&frame), "01 03 00 00 00 02 C4 0B");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to an uppercase hex string without separators
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode a hex string to bytes
///
/// Whitespace is stripped and an optional `0x` prefix is accepted, so both
/// `"0103"` and `"01 03"` decode to `[0x01, 0x03]`.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = hex_str.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let cleaned: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }
    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Uppercase hex bytes separated by single spaces, as printed in dumps
pub fn format_hex_spaced(data: &[u8]) -> String {
    let encoded = hex::encode_upper(data);
    let mut out = String::with_capacity(data.len() * 3);
    for (i, pair) in encoded.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(pair[0] as char);
        out.push(pair[1] as char);
    }
    out
}

/// Multi-line dump with offsets, `bytes_per_line` bytes per line
pub fn pretty_hex(data: &[u8], bytes_per_line: usize) -> String {
    let per_line = bytes_per_line.max(1);
    data.chunks(per_line)
        .enumerate()
        .map(|(i, chunk)| format!("{:04X}: {}", i * per_line, format_hex_spaced(chunk)))
        .collect::<Vec<_>>()
        .join("\n")
}
