//! # Modbus RTU Response Framing
//!
//! Function-code classification of responses and the CRC-16/MODBUS trailer check
//! applied when a device has CRC checking enabled.

use crate::constants::RESPONSE_FUNCTION_OFFSET;
use crc::{Crc, CRC_16_MODBUS};

const MODBUS_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Command type carried in the function byte of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    CoilStatus = 1,
    InputStatus = 2,
    HoldingRegister = 3,
    DiscreteInput = 4,
}

impl CommandType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(CommandType::CoilStatus),
            2 => Some(CommandType::InputStatus),
            3 => Some(CommandType::HoldingRegister),
            4 => Some(CommandType::DiscreteInput),
            _ => None,
        }
    }

    /// Responses of this type carry 16-bit registers after the byte count.
    pub fn carries_registers(self) -> bool {
        matches!(self, CommandType::HoldingRegister | CommandType::DiscreteInput)
    }
}

/// Classifies a response by its function byte. Exception responses (high bit
/// set) and short buffers yield `None`.
pub fn classify(response: &[u8]) -> Option<CommandType> {
    response
        .get(RESPONSE_FUNCTION_OFFSET)
        .copied()
        .and_then(CommandType::from_code)
}

/// CRC-16/MODBUS over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    MODBUS_CRC.checksum(data)
}

/// Appends the CRC trailer, low byte first.
pub fn append_crc(frame: &mut Vec<u8>) {
    let crc = crc16(frame);
    frame.extend_from_slice(&crc.to_le_bytes());
}

/// True when the last two bytes are a valid CRC over the rest of the frame.
pub fn has_valid_crc(frame: &[u8]) -> bool {
    if frame.len() < 3 {
        return false;
    }
    let (body, trailer) = frame.split_at(frame.len() - 2);
    crc16(body).to_le_bytes() == [trailer[0], trailer[1]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_crc() {
        // Read holding registers, slave 1, addr 0, qty 2
        let mut frame = vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x02];
        append_crc(&mut frame);
        assert_eq!(&frame[6..], &[0xC4, 0x0B]);
        assert!(has_valid_crc(&frame));
    }

    #[test]
    fn test_corrupted_crc() {
        let mut frame = vec![0x01, 0x03, 0x02, 0x00, 0x2A];
        append_crc(&mut frame);
        frame[3] ^= 0x01;
        assert!(!has_valid_crc(&frame));
        assert!(!has_valid_crc(&[0x01, 0x03]));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&[0x01, 0x03, 0x02]), Some(CommandType::HoldingRegister));
        assert_eq!(classify(&[0x01, 0x04]), Some(CommandType::DiscreteInput));
        assert_eq!(classify(&[0x01, 0x83, 0x02]), None);
        assert_eq!(classify(&[0x01]), None);
        assert!(!CommandType::CoilStatus.carries_registers());
    }
}
