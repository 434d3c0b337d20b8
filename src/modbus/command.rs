//! Fixed-capacity raw Modbus request buffer shared by segments and monitoring slots.

use crate::constants::MAX_COMMAND_SIZE;
use std::fmt;

/// A fully encoded Modbus request frame (address, function, payload and CRC as
/// provisioned), stored in a 32-byte buffer with an explicit length.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawCommand {
    bytes: [u8; MAX_COMMAND_SIZE],
    len: u8,
}

impl RawCommand {
    /// Empty command.
    pub const fn empty() -> Self {
        RawCommand {
            bytes: [0u8; MAX_COMMAND_SIZE],
            len: 0,
        }
    }

    /// Builds a command from a frame, or `None` when it exceeds the buffer capacity.
    pub fn new(frame: &[u8]) -> Option<Self> {
        if frame.len() > MAX_COMMAND_SIZE {
            return None;
        }
        let mut bytes = [0u8; MAX_COMMAND_SIZE];
        bytes[..frame.len()].copy_from_slice(frame);
        Some(RawCommand {
            bytes,
            len: frame.len() as u8,
        })
    }

    /// Rebuilds a command from its persisted buffer and size byte.
    ///
    /// A size byte larger than the buffer (erased flash reads back 0xFF) is clamped.
    pub fn from_parts(bytes: [u8; MAX_COMMAND_SIZE], size: u8) -> Self {
        RawCommand {
            bytes,
            len: size.min(MAX_COMMAND_SIZE as u8),
        }
    }

    /// The whole persisted buffer, including bytes past `len`.
    pub fn buffer(&self) -> &[u8; MAX_COMMAND_SIZE] {
        &self.bytes
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for RawCommand {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for RawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawCommand({})", crate::util::hex::format_hex_spaced(self.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity() {
        assert!(RawCommand::new(&[0u8; 32]).is_some());
        assert!(RawCommand::new(&[0u8; 33]).is_none());
    }

    #[test]
    fn test_erased_size_is_clamped() {
        let cmd = RawCommand::from_parts([0xFF; 32], 0xFF);
        assert_eq!(cmd.len(), 32);
    }

    #[test]
    fn test_slice() {
        let cmd = RawCommand::new(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x02]).unwrap();
        assert_eq!(cmd.as_slice(), &[0x01, 0x03, 0x00, 0x00, 0x00, 0x02]);
        assert_eq!(cmd.buffer()[6], 0);
    }
}
