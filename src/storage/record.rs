//! # Device Record Layout
//!
//! One record per device page, little-endian:
//!
//! | Bytes | Field |
//! |-------|-------|
//! | 7     | header: active, id, baud, parity, stop bits, CRC check, standard Modbus |
//! | 16×43 | segments: command\[32\], size, enabled, send now, validity mask (u64) |
//! | 56    | slot: command\[32\], size, data type, value start, threshold active (u16), spike up\[4\], spike down\[4\], high\[4\], low\[4\], on change, trigger flag, active |
//!
//! Flag bytes decode as set only when they hold exactly 1, so an erased page
//! (all 0xFF) reads back as an inactive device with an inactive slot.

use super::StoreError;
use crate::constants::{MAX_COMMAND_SIZE, NUM_DEV_SEGMENTS};
use crate::modbus::{DeviceConfig, LinkProfile, RawCommand, Segment};
use crate::monitor::{SlotConfig, ThresholdFlags, Thresholds};
use bytes::{Buf, BufMut, BytesMut};

pub const HEADER_SIZE: usize = 7;
pub const SEGMENT_SIZE: usize = MAX_COMMAND_SIZE + 11;
pub const SLOT_SIZE: usize = MAX_COMMAND_SIZE + 24;
pub const RECORD_SIZE: usize = HEADER_SIZE + NUM_DEV_SEGMENTS * SEGMENT_SIZE + SLOT_SIZE;

/// Everything persisted for one device number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceRecord {
    pub device: DeviceConfig,
    pub slot: SlotConfig,
}

fn put_flag(buf: &mut BytesMut, flag: bool) {
    buf.put_u8(flag as u8);
}

fn get_flag(buf: &mut &[u8]) -> bool {
    buf.get_u8() == 1
}

fn put_command(buf: &mut BytesMut, command: &RawCommand) {
    buf.put_slice(command.buffer());
    buf.put_u8(command.len() as u8);
}

fn get_command(buf: &mut &[u8]) -> RawCommand {
    let mut bytes = [0u8; MAX_COMMAND_SIZE];
    buf.copy_to_slice(&mut bytes);
    RawCommand::from_parts(bytes, buf.get_u8())
}

fn get_operand(buf: &mut &[u8]) -> [u8; 4] {
    let mut operand = [0u8; 4];
    buf.copy_to_slice(&mut operand);
    operand
}

impl DeviceRecord {
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(RECORD_SIZE);
        let device = &self.device;

        put_flag(&mut buf, device.active);
        buf.put_u8(device.id);
        buf.put_u8(device.link.baud_selector);
        buf.put_u8(device.link.parity_selector);
        buf.put_u8(device.link.stop_bits_selector);
        put_flag(&mut buf, device.link.enable_crc_check);
        put_flag(&mut buf, device.link.standard_modbus);

        for segment in &device.segments {
            put_command(&mut buf, &segment.command);
            put_flag(&mut buf, segment.enabled);
            put_flag(&mut buf, segment.send_now);
            buf.put_u64_le(segment.valid_addresses);
        }

        let slot = &self.slot;
        put_command(&mut buf, &slot.command);
        buf.put_u8(slot.data_type);
        buf.put_u8(slot.value_start);
        buf.put_u16_le(slot.threshold_active.bits());
        buf.put_slice(&slot.thresholds.spike_up);
        buf.put_slice(&slot.thresholds.spike_down);
        buf.put_slice(&slot.thresholds.high);
        buf.put_slice(&slot.thresholds.low);
        put_flag(&mut buf, slot.on_change);
        put_flag(&mut buf, slot.trigger_flag);
        put_flag(&mut buf, slot.is_active);

        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < RECORD_SIZE {
            return Err(StoreError::RecordTooShort {
                needed: RECORD_SIZE,
                available: bytes.len(),
            });
        }
        let mut buf = &bytes[..RECORD_SIZE];

        let active = get_flag(&mut buf);
        let id = buf.get_u8();
        let link = LinkProfile {
            baud_selector: buf.get_u8(),
            parity_selector: buf.get_u8(),
            stop_bits_selector: buf.get_u8(),
            enable_crc_check: get_flag(&mut buf),
            standard_modbus: get_flag(&mut buf),
        };

        let mut segments = [Segment::default(); NUM_DEV_SEGMENTS];
        for segment in segments.iter_mut() {
            *segment = Segment {
                command: get_command(&mut buf),
                enabled: get_flag(&mut buf),
                send_now: get_flag(&mut buf),
                valid_addresses: buf.get_u64_le(),
            };
        }

        let slot = SlotConfig {
            command: get_command(&mut buf),
            data_type: buf.get_u8(),
            value_start: buf.get_u8(),
            threshold_active: ThresholdFlags::from_bits_retain(buf.get_u16_le()),
            thresholds: Thresholds {
                spike_up: get_operand(&mut buf),
                spike_down: get_operand(&mut buf),
                high: get_operand(&mut buf),
                low: get_operand(&mut buf),
            },
            on_change: get_flag(&mut buf),
            trigger_flag: get_flag(&mut buf),
            is_active: get_flag(&mut buf),
        };

        Ok(DeviceRecord {
            device: DeviceConfig {
                active,
                id,
                link,
                segments,
            },
            slot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_size() {
        assert_eq!(SEGMENT_SIZE, 43);
        assert_eq!(SLOT_SIZE, 56);
        assert_eq!(RECORD_SIZE, 751);
        assert_eq!(DeviceRecord::default().encode().len(), RECORD_SIZE);
    }

    #[test]
    fn test_erased_page_is_inactive() {
        let record = DeviceRecord::decode(&[0xFF; RECORD_SIZE]).unwrap();
        assert!(!record.device.active);
        assert!(!record.slot.is_active);
        assert!(record.device.enabled_segments().next().is_none());
        assert_eq!(record.slot.command.len(), MAX_COMMAND_SIZE);
    }

    #[test]
    fn test_layout_offsets() {
        let mut record = DeviceRecord::default();
        record.device.active = true;
        record.device.id = 7;
        record.device.segments[0].valid_addresses = 0x0000_0000_8000_0001;
        record.slot.threshold_active = ThresholdFlags::SPIKE_UP | ThresholdFlags::ON_CHANGE;
        record.slot.is_active = true;

        let bytes = record.encode();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], 7);
        let mask_at = HEADER_SIZE + MAX_COMMAND_SIZE + 3;
        assert_eq!(&bytes[mask_at..mask_at + 4], &[0x01, 0x00, 0x00, 0x80]);
        let active_at = HEADER_SIZE + NUM_DEV_SEGMENTS * SEGMENT_SIZE + MAX_COMMAND_SIZE + 3;
        assert_eq!(&bytes[active_at..active_at + 2], &[0x00, 0x88]);
        assert_eq!(bytes[RECORD_SIZE - 1], 1);

        assert_eq!(DeviceRecord::decode(&bytes).unwrap(), record);
    }

    #[test]
    fn test_short_record() {
        assert_eq!(
            DeviceRecord::decode(&[0u8; 10]),
            Err(StoreError::RecordTooShort {
                needed: RECORD_SIZE,
                available: 10
            })
        );
    }
}
