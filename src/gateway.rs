//! # Gateway
//!
//! The `Gateway` is the main entry point. It owns the serial transport, the
//! configuration record store and the monitoring engine. Scans, slot checks
//! and provisioning writes all take `&mut self`, so there is exactly one
//! writer to the store at any time.

use crate::config::GatewayConfig;
use crate::constants::{NUM_DEVICES, NUM_DEV_SEGMENTS, NUM_MONITOR_SLOTS};
use crate::error::GatewayError;
use crate::modbus::{scan_segment, FilteredData};
use crate::monitor::{MonitorEngine, SlotOutcome};
use crate::provision::{self, parse_command};
use crate::storage::{Flash, RecordStore};
use crate::transport::Transport;
use crate::uplink::{SegmentReading, UplinkBuilder};
use bytes::Bytes;
use log::{info, warn};
use std::time::Duration;

pub struct Gateway<T: Transport, F: Flash> {
    transport: T,
    store: RecordStore<F>,
    engine: MonitorEngine,
    config: GatewayConfig,
}

impl<T: Transport, F: Flash> Gateway<T, F> {
    pub fn new(transport: T, flash: F, config: GatewayConfig) -> Self {
        Gateway {
            transport,
            store: RecordStore::new(flash),
            engine: MonitorEngine::new(),
            config,
        }
    }

    /// Loads every persisted slot into the monitoring engine and applies the
    /// configured interval and active-slot mask. Unreadable records are
    /// logged and left at their defaults.
    pub fn boot(&mut self) -> Result<(), GatewayError> {
        for index in 0..NUM_MONITOR_SLOTS {
            let number = index as u8 + 1;
            match self.store.load(index) {
                Ok(record) => self.engine.init_monitor_slot(number, record.slot)?,
                Err(e) => warn!("Slot {number}: not loaded: {e}"),
            }
        }
        self.engine.init_monitor(
            Duration::from_secs(self.config.schedule.monitor_interval_secs),
            self.config.active_slots,
        );
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn store(&self) -> &RecordStore<F> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore<F> {
        &mut self.store
    }

    pub fn engine(&self) -> &MonitorEngine {
        &self.engine
    }

    /// Scans segment `segment_no` of device `device_no` (both 1 based).
    pub async fn scan_device(
        &mut self,
        device_no: u8,
        segment_no: u8,
    ) -> Result<FilteredData, GatewayError> {
        if !(1..=NUM_DEVICES).contains(&(device_no as usize)) {
            return Err(GatewayError::InvalidDevice(device_no));
        }
        if !(1..=NUM_DEV_SEGMENTS).contains(&(segment_no as usize)) {
            return Err(GatewayError::InvalidSegment(segment_no));
        }
        let record = self.store.load(device_no as usize - 1)?;
        scan_segment(
            &mut self.transport,
            &record.device,
            segment_no as usize - 1,
            &self.config.timing.scan,
            &self.config.filter,
        )
        .await
    }

    /// Scans every enabled segment of every active device. A failing device or
    /// segment is logged and skipped.
    pub async fn scan_cycle(&mut self) -> Vec<SegmentReading> {
        let mut readings = Vec::new();

        for index in 0..NUM_DEVICES {
            let device_no = index as u8 + 1;
            let record = match self.store.load(index) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Device {device_no}: skipped: {e}");
                    continue;
                }
            };
            if !record.device.active {
                continue;
            }

            for (seg, _) in record.device.enabled_segments() {
                match scan_segment(
                    &mut self.transport,
                    &record.device,
                    seg,
                    &self.config.timing.scan,
                    &self.config.filter,
                )
                .await
                {
                    Ok(data) => readings.push(SegmentReading {
                        device: device_no,
                        segment: seg as u8 + 1,
                        data,
                    }),
                    Err(e) => warn!("Device {device_no} segment {}: {e}", seg + 1),
                }
            }
        }

        info!("Scan cycle complete: {} readings", readings.len());
        readings
    }

    /// Scans every segment flagged send-now on an active device, then clears
    /// the flags of the scanned segments in storage.
    pub async fn flush_send_now(&mut self) -> Vec<SegmentReading> {
        let mut readings = Vec::new();

        for index in 0..NUM_DEVICES {
            let device_no = index as u8 + 1;
            let Ok(record) = self.store.load(index) else {
                continue;
            };
            if !record.device.active {
                continue;
            }

            let pending: Vec<usize> = record
                .device
                .segments
                .iter()
                .enumerate()
                .filter(|(_, s)| s.send_now)
                .map(|(i, _)| i)
                .collect();
            if pending.is_empty() {
                continue;
            }

            let mut scanned = Vec::with_capacity(pending.len());
            for seg in pending {
                match scan_segment(
                    &mut self.transport,
                    &record.device,
                    seg,
                    &self.config.timing.scan,
                    &self.config.filter,
                )
                .await
                {
                    Ok(data) => {
                        scanned.push(seg);
                        readings.push(SegmentReading {
                            device: device_no,
                            segment: seg as u8 + 1,
                            data,
                        });
                    }
                    Err(e) => warn!("Device {device_no} segment {}: send-now failed: {e}", seg + 1),
                }
            }

            if scanned.is_empty() {
                continue;
            }
            let cleared = self.store.update(index, |record| {
                for seg in &scanned {
                    record.device.segments[*seg].send_now = false;
                }
            });
            if let Err(e) = cleared {
                warn!("Device {device_no}: send-now flags not cleared: {e}");
            }
        }

        readings
    }

    /// Runs one monitoring check of slot `number` (1 based).
    pub async fn check_slot(&mut self, number: u8) -> Result<SlotOutcome, GatewayError> {
        self.engine
            .check_slot(
                number,
                &mut self.transport,
                &self.store,
                &self.config.timing.monitor,
            )
            .await
    }

    /// Checks every slot the engine marks active. Errors are logged per slot.
    pub async fn monitor_pass(&mut self) -> Vec<(u8, SlotOutcome)> {
        let numbers: Vec<u8> = self.engine.active_slots().collect();
        let mut outcomes = Vec::with_capacity(numbers.len());
        for number in numbers {
            match self.check_slot(number).await {
                Ok(outcome) => outcomes.push((number, outcome)),
                Err(e) => warn!("Slot {number}: check failed: {e}"),
            }
        }
        outcomes
    }

    /// Parses and executes one provisioning command line.
    pub fn execute(&mut self, line: &str) -> Result<String, GatewayError> {
        let command = parse_command(line)?;
        provision::execute(&command, &mut self.store, &mut self.engine)
    }

    /// Packs readings into one uplink payload.
    pub fn build_uplink(&self, readings: &[SegmentReading]) -> Bytes {
        let mut builder = UplinkBuilder::default();
        for reading in readings {
            builder.push_reading(reading);
        }
        if builder.dropped() > 0 {
            warn!("{} readings did not fit the uplink payload", builder.dropped());
        }
        builder.finish()
    }
}
