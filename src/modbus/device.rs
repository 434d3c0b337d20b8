//! # Modbus Device Configuration
//!
//! A device is one RTU endpoint: an active flag, its slave ID, the link profile
//! selectors used to reconfigure the shared serial port, and up to sixteen
//! request segments.

use super::command::RawCommand;
use crate::constants::NUM_DEV_SEGMENTS;
use crate::error::GatewayError;
use crate::transport::{LinkSettings, Parity, StopBits};

/// Baud rates addressed by the persisted baud selector.
pub const MODBUS_BAUD_RATES: [u32; 8] = [9600, 115200, 1200, 2400, 4800, 19200, 38400, 57600];

/// Parities addressed by the persisted parity selector.
pub const PARITY_SETTINGS: [Parity; 3] = [Parity::None, Parity::Even, Parity::Odd];

/// Stop bits addressed by the persisted stop-bit selector (0 and 1 both mean one).
pub const STOP_BIT_SETTINGS: [StopBits; 3] = [StopBits::One, StopBits::One, StopBits::Two];

/// Persisted serial profile of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkProfile {
    pub baud_selector: u8,
    pub parity_selector: u8,
    pub stop_bits_selector: u8,
    /// Reject responses without a valid CRC-16 trailer
    pub enable_crc_check: bool,
    /// Protocol variant flag, persisted for the configuration interface
    pub standard_modbus: bool,
}

impl LinkProfile {
    /// Resolves the selectors against the baud, parity and stop-bit tables.
    pub fn resolve(&self) -> Result<LinkSettings, GatewayError> {
        let baud_rate = MODBUS_BAUD_RATES
            .get(self.baud_selector as usize)
            .copied()
            .ok_or_else(|| {
                GatewayError::InvalidLinkProfile(format!("baud selector {}", self.baud_selector))
            })?;
        let parity = PARITY_SETTINGS
            .get(self.parity_selector as usize)
            .copied()
            .ok_or_else(|| {
                GatewayError::InvalidLinkProfile(format!(
                    "parity selector {}",
                    self.parity_selector
                ))
            })?;
        let stop_bits = STOP_BIT_SETTINGS
            .get(self.stop_bits_selector as usize)
            .copied()
            .ok_or_else(|| {
                GatewayError::InvalidLinkProfile(format!(
                    "stop-bit selector {}",
                    self.stop_bits_selector
                ))
            })?;

        Ok(LinkSettings {
            baud_rate,
            parity,
            stop_bits,
        })
    }
}

/// One request recipe of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Segment {
    pub command: RawCommand,
    pub enabled: bool,
    /// Scan on the next send-now pass, then clear
    pub send_now: bool,
    /// Bit i set: the 16-bit register at response position i is forwarded
    pub valid_addresses: u64,
}

impl Segment {
    /// The segment `clear modbus-params` leaves behind: eight zero command bytes,
    /// disabled, empty mask.
    pub fn cleared() -> Self {
        Segment {
            command: RawCommand::new(&[0u8; 8]).unwrap_or_default(),
            enabled: false,
            send_now: false,
            valid_addresses: 0,
        }
    }

    /// Number of registers selected by the validity mask.
    pub fn selected_registers(&self) -> u32 {
        self.valid_addresses.count_ones()
    }
}

/// A provisioned Modbus RTU device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub active: bool,
    pub id: u8,
    pub link: LinkProfile,
    pub segments: [Segment; NUM_DEV_SEGMENTS],
}

impl DeviceConfig {
    /// Segment by zero-based index.
    pub fn segment(&self, index: usize) -> Result<&Segment, GatewayError> {
        self.segments
            .get(index)
            .ok_or(GatewayError::InvalidSegment(index.saturating_add(1) as u8))
    }

    /// Enabled segments with their zero-based index.
    pub fn enabled_segments(&self) -> impl Iterator<Item = (usize, &Segment)> {
        self.segments.iter().enumerate().filter(|(_, s)| s.enabled)
    }

    /// Device state after `clear modbus-params`.
    pub fn cleared() -> Self {
        DeviceConfig {
            active: false,
            id: 0,
            link: LinkProfile::default(),
            segments: [Segment::cleared(); NUM_DEV_SEGMENTS],
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            active: false,
            id: 0,
            link: LinkProfile::default(),
            segments: [Segment::default(); NUM_DEV_SEGMENTS],
        }
    }
}
