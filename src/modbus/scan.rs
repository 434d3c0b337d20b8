//! # Device Scan & Register Filtering
//!
//! A scan drives one segment request against one device and reduces the
//! response to what is forwarded upstream. Register responses (holding or input
//! registers) are reduced to the registers selected by the segment's validity
//! mask, in ascending position order, each serialized high byte first. Every
//! other response type is forwarded verbatim.

use super::device::DeviceConfig;
use super::frame::{classify, has_valid_crc, CommandType};
use crate::config::{ExchangeTiming, FilterLimits};
use crate::constants::{MAX_RESPONSE_SIZE, RESPONSE_PAYLOAD_OFFSET};
use crate::error::GatewayError;
use crate::transport::{exchange, Transport};
use log::{debug, info, warn};

/// How a response was reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Selected registers of a register response
    Registers {
        command: CommandType,
        /// Registers emitted
        selected: usize,
        /// Selected registers dropped because the output was full
        dropped: usize,
    },
    /// Whole response copied verbatim
    Raw,
    /// Response rejected by the CRC check
    Rejected,
}

/// Output of a segment scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredData {
    pub bytes: Vec<u8>,
    pub kind: FilterKind,
}

impl FilteredData {
    /// Filtered byte count.
    pub fn count(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Filtered registers decoded back to values (register responses only).
    pub fn registers(&self) -> Vec<u16> {
        match self.kind {
            FilterKind::Registers { .. } => self
                .bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Number of registers the response actually carries, bounded by both the
/// byte-count field and the bytes received.
fn registers_present(response: &[u8]) -> usize {
    let Some(&byte_count) = response.get(RESPONSE_PAYLOAD_OFFSET - 1) else {
        return 0;
    };
    let received = response.len().saturating_sub(RESPONSE_PAYLOAD_OFFSET);
    (byte_count as usize).min(received) / 2
}

/// Reduces `response` according to its command type and the validity mask.
pub fn filter_response(response: &[u8], valid_addresses: u64, limits: &FilterLimits) -> FilteredData {
    let command = match classify(response) {
        Some(command) if command.carries_registers() => command,
        _ => {
            let len = response.len().min(MAX_RESPONSE_SIZE);
            return FilteredData {
                bytes: response[..len].to_vec(),
                kind: FilterKind::Raw,
            };
        }
    };

    let present = registers_present(response);
    let mut registers: Vec<u16> = Vec::with_capacity(limits.max_output_registers.min(present));
    let mut dropped = 0;

    for position in 0..limits.candidates() {
        if valid_addresses & (1u64 << position) == 0 {
            continue;
        }
        if position >= present {
            // masked position past the end of the response
            continue;
        }
        let offset = position * 2 + RESPONSE_PAYLOAD_OFFSET;
        let value = u16::from_be_bytes([response[offset], response[offset + 1]]);
        debug!("Save register {position}: value = {value:04X}");

        if registers.len() < limits.max_output_registers {
            registers.push(value);
        } else {
            warn!("Filtered output full, dropping register {position}");
            dropped += 1;
        }
    }

    let selected = registers.len();
    let bytes = registers.iter().flat_map(|r| r.to_be_bytes()).collect();
    FilteredData {
        bytes,
        kind: FilterKind::Registers {
            command,
            selected,
            dropped,
        },
    }
}

/// Scans segment `segment_index` (zero based) of `device`.
///
/// The link is reconfigured to the device profile, the segment command is sent
/// verbatim, and whatever arrives inside the scan window is filtered.
pub async fn scan_segment<T: Transport + ?Sized>(
    transport: &mut T,
    device: &DeviceConfig,
    segment_index: usize,
    timing: &ExchangeTiming,
    limits: &FilterLimits,
) -> Result<FilteredData, GatewayError> {
    let segment = device.segment(segment_index)?;
    let settings = device.link.resolve()?;

    info!(
        "Scanning device {} segment {} ({})",
        device.id,
        segment_index + 1,
        settings
    );
    let response = exchange(transport, &settings, segment.command.as_slice(), &timing.window()).await?;

    if device.link.enable_crc_check && !has_valid_crc(&response) {
        warn!(
            "Device {} segment {}: response failed CRC check ({} bytes)",
            device.id,
            segment_index + 1,
            response.len()
        );
        return Ok(FilteredData {
            bytes: Vec::new(),
            kind: FilterKind::Rejected,
        });
    }

    let filtered = filter_response(&response, segment.valid_addresses, limits);
    debug!(
        "Register to send: {}",
        crate::util::hex::format_hex_spaced(&filtered.bytes)
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding_response(registers: &[u16]) -> Vec<u8> {
        let mut response = vec![0x01, 0x03, (registers.len() * 2) as u8];
        for r in registers {
            response.extend_from_slice(&r.to_be_bytes());
        }
        response
    }

    #[test]
    fn test_selects_in_ascending_position_order() {
        let response = holding_response(&[0x1111, 0x2222, 0x3333, 0x4444, 0x5555]);
        let filtered = filter_response(&response, 0b1001, &FilterLimits::default());
        assert_eq!(filtered.bytes, vec![0x11, 0x11, 0x44, 0x44]);
        assert_eq!(filtered.count(), 4);
        assert_eq!(filtered.registers(), vec![0x1111, 0x4444]);
    }

    #[test]
    fn test_positions_past_response_are_inert() {
        let response = holding_response(&[0xAAAA, 0xBBBB]);
        let filtered = filter_response(&response, u64::MAX, &FilterLimits::default());
        assert_eq!(filtered.registers(), vec![0xAAAA, 0xBBBB]);
    }

    #[test]
    fn test_crc_trailer_is_not_a_register() {
        let mut response = holding_response(&[0x0102]);
        response.extend_from_slice(&[0xDE, 0xAD]);
        let filtered = filter_response(&response, 0b11, &FilterLimits::default());
        assert_eq!(filtered.registers(), vec![0x0102]);
    }

    #[test]
    fn test_other_function_codes_pass_through() {
        let response = vec![0x01, 0x01, 0x01, 0x05, 0xAB, 0xCD];
        let filtered = filter_response(&response, 0xFF, &FilterLimits::default());
        assert_eq!(filtered.kind, FilterKind::Raw);
        assert_eq!(filtered.bytes, response);
        assert!(filtered.registers().is_empty());
    }

    #[test]
    fn test_capacity_drop() {
        let response = holding_response(&[1, 2, 3, 4]);
        let limits = FilterLimits {
            candidate_registers: 32,
            max_output_registers: 3,
        };
        let filtered = filter_response(&response, 0b1111, &limits);
        assert_eq!(filtered.registers(), vec![1, 2, 3]);
        assert_eq!(
            filtered.kind,
            FilterKind::Registers {
                command: CommandType::HoldingRegister,
                selected: 3,
                dropped: 1
            }
        );
    }

    #[test]
    fn test_candidate_window() {
        let registers: Vec<u16> = (0..40).collect();
        let response = holding_response(&registers);
        let mask = 1u64 << 35 | 1;
        let narrow = filter_response(&response, mask, &FilterLimits::default());
        assert_eq!(narrow.registers(), vec![0]);

        let wide = FilterLimits {
            candidate_registers: 64,
            max_output_registers: 64,
        };
        assert_eq!(filter_response(&response, mask, &wide).registers(), vec![0, 35]);
    }

    #[test]
    fn test_empty_response() {
        let filtered = filter_response(&[], 0xFF, &FilterLimits::default());
        assert_eq!(filtered.kind, FilterKind::Raw);
        assert!(filtered.is_empty());
    }
}
