//! Text views of persisted configuration.

use crate::modbus::DeviceConfig;
use crate::monitor::SlotConfig;
use crate::storage::DeviceRecord;
use crate::util::hex::format_hex_spaced;
use crate::value::{decode, DataType};
use std::fmt::Write;

fn flag_text(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

fn write_link(out: &mut String, device: &DeviceConfig) {
    let _ = writeln!(out, "Baudrate: {}", device.link.baud_selector);
    let _ = writeln!(out, "Parity: {}", device.link.parity_selector);
    let _ = writeln!(out, "StopBits: {}", device.link.stop_bits_selector);
    if let Ok(settings) = device.link.resolve() {
        let _ = writeln!(out, "Link: {settings}");
    }
    let _ = writeln!(out, "CRC Check: {}", flag_text(device.link.enable_crc_check));
    let _ = writeln!(out, "Standard Modbus: {}", flag_text(device.link.standard_modbus));
    let _ = writeln!(out, "Device Enable: {}", flag_text(device.active));
}

/// View produced by `get modbus-params dev <d> seg <s>` (both 1 based).
pub fn render_device_segment(device_no: u8, segment_no: u8, device: &DeviceConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "###### Configuration for Dev ID: {device_no}, Seg ID: {segment_no}"
    );
    write_link(&mut out, device);

    let segment = (segment_no as usize)
        .checked_sub(1)
        .and_then(|index| device.segments.get(index));
    if let Some(segment) = segment {
        let _ = writeln!(out, "Segment {segment_no} Configuration:");
        let _ = writeln!(out, "enableSegment: {}", flag_text(segment.enabled));
        let _ = writeln!(out, "cmdRaw: {}", format_hex_spaced(segment.command.as_slice()));
        let _ = writeln!(out, "validAddresses: {:08X}", segment.valid_addresses);
        let _ = writeln!(out, "sendNow: {}", flag_text(segment.send_now));
    }
    out
}

fn threshold_line(out: &mut String, label: &str, raw: &[u8; 4], data_type: Option<DataType>) {
    let decoded = match data_type.map(|t| decode(raw, t)) {
        Some(Ok(value)) => value.to_string(),
        Some(Err(e)) => e.to_string(),
        None => "unsupported data type".to_string(),
    };
    let _ = writeln!(out, "{label}: {} ({decoded})", format_hex_spaced(raw));
}

fn write_slot(out: &mut String, slot: &SlotConfig) {
    let data_type = slot.data_type().ok();
    let _ = writeln!(
        out,
        "DataType: {} ({})",
        slot.data_type,
        data_type.map(|t| t.name()).unwrap_or("unsupported")
    );
    let _ = writeln!(out, "Data Start Index: {}", slot.value_start);
    let _ = writeln!(out, "Threshold Active: {:04X}", slot.threshold_active.bits());
    threshold_line(out, "Spike Up TH", &slot.thresholds.spike_up, data_type);
    threshold_line(out, "Spike Down TH", &slot.thresholds.spike_down, data_type);
    threshold_line(out, "Threshold High TH", &slot.thresholds.high, data_type);
    threshold_line(out, "Threshold Low TH", &slot.thresholds.low, data_type);
    let _ = writeln!(out, "On Change: {}", flag_text(slot.on_change));
    let _ = writeln!(out, "Active State: {}", flag_text(slot.is_active));
}

/// View produced by `view slot-params <n>` (1 based).
pub fn render_slot(slot_no: u8, record: &DeviceRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "MONITORING SLOT {slot_no} PARAMETERS:");
    let _ = writeln!(
        out,
        "ModBus Command: {}",
        format_hex_spaced(record.slot.command.as_slice())
    );
    write_link(&mut out, &record.device);
    write_slot(&mut out, &record.slot);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modbus::RawCommand;
    use crate::monitor::{ThresholdFlags, Thresholds};

    #[test]
    fn test_slot_view_decodes_thresholds() {
        let mut record = DeviceRecord::default();
        record.slot = SlotConfig {
            command: RawCommand::new(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x02]).unwrap(),
            data_type: DataType::FloatABCD.as_raw(),
            value_start: 3,
            threshold_active: ThresholdFlags::THRESHOLD_HIGH,
            thresholds: Thresholds {
                high: [0x41, 0xF0, 0x00, 0x00],
                ..Default::default()
            },
            ..Default::default()
        };

        let view = render_slot(1, &record);
        assert!(view.contains("ModBus Command: 01 03 00 00 00 02"));
        assert!(view.contains("DataType: 12 (Float_ABCD)"));
        assert!(view.contains("Threshold Active: 2000"));
        assert!(view.contains("Threshold High TH: 41 F0 00 00 (30.00)"));
    }

    #[test]
    fn test_unsupported_type_view() {
        let mut record = DeviceRecord::default();
        record.slot.data_type = 99;
        let view = render_slot(2, &record);
        assert!(view.contains("DataType: 99 (unsupported)"));
        assert!(view.contains("(unsupported data type)"));
    }

    #[test]
    fn test_device_segment_view() {
        let mut device = DeviceConfig::default();
        device.active = true;
        device.segments[1].valid_addresses = 0x0F;
        device.segments[1].enabled = true;
        let view = render_device_segment(1, 2, &device);
        assert!(view.contains("Link: 9600 8N1"));
        assert!(view.contains("Segment 2 Configuration:"));
        assert!(view.contains("validAddresses: 0000000F"));
        assert!(view.contains("Device Enable: true"));
    }
}
