//! # Utility Modules
//!
//! Common helpers shared across the crate.

pub mod hex;

pub use hex::{decode_hex, encode_hex_upper, format_hex_spaced, pretty_hex, HexError};
