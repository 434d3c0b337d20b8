//! # Provisioning Command Executor
//!
//! Applies parsed commands to the record store. Every write is a
//! read-modify-write of one device page; a failed read aborts the command
//! before anything is erased. Slot writes also refresh the in-memory working
//! copy of the monitoring engine.

use super::command::{ConfigCommand, SlotParams};
use super::render::{render_device_segment, render_slot};
use crate::constants::{NUM_DEVICES, NUM_DEV_SEGMENTS, NUM_MONITOR_SLOTS};
use crate::error::GatewayError;
use crate::modbus::DeviceConfig;
use crate::monitor::{MonitorEngine, SlotConfig};
use crate::storage::{Flash, RecordStore};
use log::info;

fn device_index(device: u8) -> Result<usize, GatewayError> {
    match device as usize {
        n @ 1..=NUM_DEVICES => Ok(n - 1),
        _ => Err(GatewayError::InvalidDevice(device)),
    }
}

fn segment_index(segment: u8) -> Result<usize, GatewayError> {
    match segment as usize {
        n @ 1..=NUM_DEV_SEGMENTS => Ok(n - 1),
        _ => Err(GatewayError::InvalidSegment(segment)),
    }
}

fn slot_index(slot: u8) -> Result<usize, GatewayError> {
    match slot as usize {
        n @ 1..=NUM_MONITOR_SLOTS => Ok(n - 1),
        _ => Err(GatewayError::InvalidSlot(slot)),
    }
}

fn apply_slot_params(slot: &mut SlotConfig, params: &SlotParams) {
    slot.command = params.command;
    slot.data_type = params.data_type;
    slot.value_start = params.value_start;
    slot.threshold_active = params.threshold_active;
    slot.thresholds = params.thresholds;
    slot.on_change = params.on_change;
    slot.trigger_flag = false;
}

/// Executes `command` and returns the text to show the operator.
pub fn execute<F: Flash>(
    command: &ConfigCommand,
    store: &mut RecordStore<F>,
    engine: &mut MonitorEngine,
) -> Result<String, GatewayError> {
    match *command {
        ConfigCommand::GetModbusParams { device, segment } => {
            let index = device_index(device)?;
            segment_index(segment)?;
            let record = store.load(index)?;
            Ok(render_device_segment(device, segment, &record.device))
        }

        ConfigCommand::SetDeviceParams {
            cmd_id,
            device,
            baud,
            parity,
            stop_bits,
            active,
        } => {
            let index = device_index(device)?;
            info!(
                "cmdID: {cmd_id}, DevId: {device}, Baudrate: {baud}, Parity: {parity}, StopBit: {stop_bits}, Active: {active}"
            );
            store.update(index, |record| {
                if cmd_id == 1 {
                    record.device.link.baud_selector = baud;
                    record.device.link.parity_selector = parity;
                    record.device.link.stop_bits_selector = stop_bits;
                    record.device.active = active;
                }
            })?;
            Ok(format!("Device {device} parameters saved"))
        }

        ConfigCommand::SetSegmentParams {
            device,
            segment,
            enable,
            send_now,
            valid_addresses,
            command,
            ..
        } => {
            let index = device_index(device)?;
            let seg = segment_index(segment)?;
            store.update(index, |record| {
                let target = &mut record.device.segments[seg];
                target.command = command;
                target.enabled = enable;
                target.send_now = send_now;
                target.valid_addresses = valid_addresses as u64;
            })?;
            Ok(format!("Device {device} segment {segment} saved"))
        }

        ConfigCommand::ClearModbusParams { device } => {
            let index = device_index(device)?;
            store.update(index, |record| record.device = DeviceConfig::cleared())?;
            Ok(format!("Device {device} parameters cleared"))
        }

        ConfigCommand::SetSlotParams(ref params) => {
            let index = slot_index(params.slot)?;
            info!(
                "Slot {}: data type {}, start {}, threshold active {:04X}",
                params.slot,
                params.data_type,
                params.value_start,
                params.threshold_active.bits()
            );
            let (_, record) = store.update(index, |record| apply_slot_params(&mut record.slot, params))?;
            engine.init_monitor_slot(params.slot, record.slot)?;
            Ok(render_slot(params.slot, &record))
        }

        ConfigCommand::ViewSlotParams { slot } => {
            let index = slot_index(slot)?;
            let record = store.load(index)?;
            Ok(render_slot(slot, &record))
        }

        ConfigCommand::ClearSlotParams { slot } => {
            let index = slot_index(slot)?;
            let (_, record) = store.update(index, |record| record.slot = SlotConfig::cleared())?;
            engine.init_monitor_slot(slot, record.slot)?;
            Ok(render_slot(slot, &record))
        }

        ConfigCommand::ClearAllSlotParams => {
            for index in 0..NUM_MONITOR_SLOTS {
                let (_, record) =
                    store.update(index, |record| record.slot = SlotConfig::cleared())?;
                engine.init_monitor_slot(index as u8 + 1, record.slot)?;
            }
            Ok("All monitoring slots cleared".to_string())
        }

        ConfigCommand::SetSlotActive { slot, active } => {
            let index = slot_index(slot)?;
            store.update(index, |record| record.slot.is_active = active)?;
            engine.set_slot_active(slot, active)?;
            Ok(format!("Slot {slot} active: {active}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::command::parse_command;
    use crate::storage::{MemoryFlash, StoreError};

    fn run(
        line: &str,
        store: &mut RecordStore<MemoryFlash>,
        engine: &mut MonitorEngine,
    ) -> Result<String, GatewayError> {
        execute(&parse_command(line)?, store, engine)
    }

    #[test]
    fn test_device_params_only_with_cmd_id_one() {
        let mut store = RecordStore::new(MemoryFlash::new());
        let mut engine = MonitorEngine::new();

        run("set device-params 2 1 1 1 2 1", &mut store, &mut engine).unwrap();
        assert!(!store.load(0).unwrap().device.active);

        run("set device-params 1 1 1 1 2 1", &mut store, &mut engine).unwrap();
        let device = store.load(0).unwrap().device;
        assert!(device.active);
        assert_eq!(device.link.baud_selector, 1);
        assert_eq!(device.link.stop_bits_selector, 2);
    }

    #[test]
    fn test_segment_and_view() {
        let mut store = RecordStore::new(MemoryFlash::new());
        let mut engine = MonitorEngine::new();
        run(
            "set segment-params 1 3 2 1 1 00 00 01 03 6 01 03 00 00 00 0A",
            &mut store,
            &mut engine,
        )
        .unwrap();

        let segment = store.load(2).unwrap().device.segments[1];
        assert!(segment.enabled && segment.send_now);
        assert_eq!(segment.valid_addresses, 0x0103);

        let view = run("get modbus-params dev 3 seg 2", &mut store, &mut engine).unwrap();
        assert!(view.contains("cmdRaw: 01 03 00 00 00 0A"));
    }

    #[test]
    fn test_slot_params_refresh_engine() {
        let mut store = RecordStore::new(MemoryFlash::new());
        let mut engine = MonitorEngine::new();
        let line = "set slot-params 1 4 C 3 20 00 00 00 00 00 00 00 00 00 41 F0 00 00 00 00 00 00 0 8 01 03 00 00 00 02 C4 0B";
        let view = run(line, &mut store, &mut engine).unwrap();
        assert!(view.contains("Threshold High TH: 41 F0 00 00 (30.00)"));

        let slot = engine.slot(4).unwrap();
        assert_eq!(slot.config.data_type, 12);
        assert_eq!(slot.config.command.len(), 8);
        assert_eq!(store.load(3).unwrap().slot, slot.config);
    }

    #[test]
    fn test_clear_and_activate_slots() {
        let mut store = RecordStore::new(MemoryFlash::new());
        let mut engine = MonitorEngine::new();

        run("set slot-active 2 1", &mut store, &mut engine).unwrap();
        assert!(store.load(1).unwrap().slot.is_active);
        assert!(engine.slot(2).unwrap().is_active());

        run("clear all slots-params", &mut store, &mut engine).unwrap();
        for index in 0..NUM_MONITOR_SLOTS {
            assert_eq!(store.load(index).unwrap().slot, SlotConfig::cleared());
        }
        assert_eq!(engine.active_slots().count(), 0);
    }

    #[test]
    fn test_clear_device_keeps_slot() {
        let mut store = RecordStore::new(MemoryFlash::new());
        let mut engine = MonitorEngine::new();
        run("set slot-active 1 1", &mut store, &mut engine).unwrap();
        run("set device-params 1 1 0 0 0 1", &mut store, &mut engine).unwrap();
        run("clear modbus-params dev 1", &mut store, &mut engine).unwrap();

        let record = store.load(0).unwrap();
        assert_eq!(record.device, DeviceConfig::cleared());
        assert!(record.slot.is_active);
    }

    #[test]
    fn test_out_of_range_numbers() {
        let mut store = RecordStore::new(MemoryFlash::new());
        let mut engine = MonitorEngine::new();
        assert!(matches!(
            run("get modbus-params dev 17 seg 1", &mut store, &mut engine),
            Err(GatewayError::InvalidDevice(17))
        ));
        assert!(matches!(
            run("get modbus-params dev 1 seg 0", &mut store, &mut engine),
            Err(GatewayError::InvalidSegment(0))
        ));
        assert!(matches!(
            run("view slot-params 0", &mut store, &mut engine),
            Err(GatewayError::InvalidSlot(0))
        ));
    }

    #[test]
    fn test_failed_read_aborts_without_write() {
        let mut store = RecordStore::new(MemoryFlash::new());
        let mut engine = MonitorEngine::new();
        store.flash_mut().set_fail_reads(true);
        let result = run("set slot-active 1 1", &mut store, &mut engine);
        assert!(matches!(
            result,
            Err(GatewayError::Storage(StoreError::ReadFailed { .. }))
        ));
        store.flash_mut().set_fail_reads(false);
        assert!(!store.load(0).unwrap().slot.is_active);
        assert!(!engine.slot(1).unwrap().is_active());
    }
}
