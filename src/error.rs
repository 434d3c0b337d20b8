//! # Gateway Error Handling
//!
//! This module defines the GatewayError enum, which represents the different error
//! types that can occur in the lora-modbus-rs crate. Layer-specific errors (flash,
//! serial transport, value codec, provisioning commands) live next to the code that
//! raises them and convert into `GatewayError` with `?`.

use crate::provision::command::CommandError;
use crate::storage::StoreError;
use crate::transport::TransportError;
use crate::value::CodecError;
use thiserror::Error;

/// Represents the different error types that can occur in the gateway core.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Flash read, erase or write failure, or an undecodable record.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Serial link configuration or exchange failure.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Value decoding failure.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Provisioning command could not be parsed.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Monitoring slot number outside 1..=16.
    #[error("Invalid slot number: {0}")]
    InvalidSlot(u8),

    /// Device number outside 1..=16.
    #[error("Invalid device number: {0}")]
    InvalidDevice(u8),

    /// Segment number outside 1..=16.
    #[error("Invalid segment number: {0}")]
    InvalidSegment(u8),

    /// A link profile selector has no entry in the baud/parity/stop-bit tables.
    #[error("Invalid link profile: {0}")]
    InvalidLinkProfile(String),

    /// Gateway configuration file could not be loaded or saved.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Config(e.to_string())
    }
}
