//! # Configuration Storage
//!
//! Device, segment and slot configuration lives in one fixed-size binary record
//! per device, each in its own flash page. The `Flash` trait is the
//! read/erase/write seam; `MemoryFlash` emulates NOR semantics in RAM and
//! `FileFlash` persists the same image to disk.

pub mod file;
pub mod memory;
pub mod record;
pub mod store;

pub use file::FileFlash;
pub use memory::MemoryFlash;
pub use record::{DeviceRecord, RECORD_SIZE};
pub use store::RecordStore;

use thiserror::Error;

/// Errors raised by the flash layer and the record store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Flash read failed at {address:#010X}")]
    ReadFailed { address: u32 },

    #[error("Flash erase failed at {address:#010X}")]
    EraseFailed { address: u32 },

    #[error("Flash write failed at {address:#010X}")]
    WriteFailed { address: u32 },

    #[error("Flash location {address:#010X} is not erased")]
    NotErased { address: u32 },

    #[error("Flash access out of range: {address:#010X} (+{len} bytes)")]
    OutOfRange { address: u32, len: usize },

    #[error("Invalid record index: {0}")]
    InvalidIndex(usize),

    #[error("Flash image I/O error: {0}")]
    Io(String),

    #[error("Record too short: need {needed} bytes, have {available}")]
    RecordTooShort { needed: usize, available: usize },
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Address-keyed non-volatile memory.
pub trait Flash {
    /// Fills `buf` from `address`.
    fn read(&self, address: u32, buf: &mut [u8]) -> Result<(), StoreError>;

    /// Erases every page overlapping `address..address + len` to 0xFF.
    fn erase(&mut self, address: u32, len: usize) -> Result<(), StoreError>;

    /// Programs `data` at `address`; the target must be erased.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), StoreError>;
}
