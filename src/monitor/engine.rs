//! # Monitoring Slot Engine
//!
//! Owns the sixteen in-memory slot working copies and runs a check against one
//! slot: load its persisted record, gate on the device and slot active flags,
//! exchange the slot command, decode the reading and evaluate its alarms.
//!
//! The previous reading only moves forward after a check that produced a
//! decodable value, so a silent or truncated response never manufactures a
//! spike on the following cycle.

use super::slot::{MonitorSlot, SlotConfig};
use super::threshold::{alarms, evaluate, Alarm, AlarmSet, Evaluation};
use crate::config::ExchangeTiming;
use crate::constants::{MIN_RESPONSE_BYTES, NUM_MONITOR_SLOTS};
use crate::error::GatewayError;
use crate::modbus::frame::has_valid_crc;
use crate::storage::{Flash, RecordStore};
use crate::transport::{exchange, Transport};
use crate::value::{decode, CodecError, Value};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::time::Duration;

/// One alarm notification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlarmEvent {
    /// Slot number, 1 based
    pub slot: u8,
    pub alarm: Alarm,
    pub value: Value,
    pub at: DateTime<Utc>,
}

/// Result of evaluating a decoded reading.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotReport {
    pub value: Value,
    pub prev_value: Option<Value>,
    pub alarms: Vec<AlarmEvent>,
}

/// What a slot check did.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotOutcome {
    /// Device or slot inactive; nothing sent, nothing changed
    Skipped { device_active: bool, slot_active: bool },
    /// Fewer than two bytes arrived, or the response failed the CRC check
    NoResponse { received: usize },
    /// Response present but the reading could not be decoded
    Undecodable(CodecError),
    Evaluated(SlotReport),
}

impl SlotOutcome {
    pub fn alarms(&self) -> &[AlarmEvent] {
        match self {
            SlotOutcome::Evaluated(report) => &report.alarms,
            _ => &[],
        }
    }
}

/// The monitoring slot engine.
#[derive(Debug, Clone)]
pub struct MonitorEngine {
    slots: [MonitorSlot; NUM_MONITOR_SLOTS],
    monitor_interval: Duration,
}

impl Default for MonitorEngine {
    fn default() -> Self {
        MonitorEngine {
            slots: [MonitorSlot::default(); NUM_MONITOR_SLOTS],
            monitor_interval: Duration::ZERO,
        }
    }
}

fn slot_index(number: u8) -> Result<usize, GatewayError> {
    match number as usize {
        n @ 1..=NUM_MONITOR_SLOTS => Ok(n - 1),
        _ => Err(GatewayError::InvalidSlot(number)),
    }
}

impl MonitorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the monitoring interval and marks slot i+1 active when bit i of
    /// `active_slots` is set.
    pub fn init_monitor(&mut self, monitor_interval: Duration, active_slots: u16) {
        self.monitor_interval = monitor_interval;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.config.is_active = active_slots & (1 << i) != 0;
        }
        info!(
            "Monitor initialised: interval {:?}, active slots {:#06X}",
            monitor_interval, active_slots
        );
    }

    /// Resets slot `number` (1 based) and populates it from `config`.
    pub fn init_monitor_slot(&mut self, number: u8, config: SlotConfig) -> Result<(), GatewayError> {
        let index = slot_index(number)?;
        self.slots[index] = MonitorSlot::new(config);
        Ok(())
    }

    pub fn monitor_interval(&self) -> Duration {
        self.monitor_interval
    }

    pub fn slot(&self, number: u8) -> Result<&MonitorSlot, GatewayError> {
        Ok(&self.slots[slot_index(number)?])
    }

    pub fn slots(&self) -> &[MonitorSlot; NUM_MONITOR_SLOTS] {
        &self.slots
    }

    /// Marks the in-memory copy of slot `number` active or inactive.
    pub fn set_slot_active(&mut self, number: u8, active: bool) -> Result<(), GatewayError> {
        let index = slot_index(number)?;
        self.slots[index].config.is_active = active;
        Ok(())
    }

    /// Slot numbers (1 based) whose in-memory copy is active.
    pub fn active_slots(&self) -> impl Iterator<Item = u8> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_active())
            .map(|(i, _)| i as u8 + 1)
    }

    /// Checks slot `number` (1..=16).
    pub async fn check_slot<T, F>(
        &mut self,
        number: u8,
        transport: &mut T,
        store: &RecordStore<F>,
        timing: &ExchangeTiming,
    ) -> Result<SlotOutcome, GatewayError>
    where
        T: Transport + ?Sized,
        F: Flash,
    {
        let index = slot_index(number)?;
        let record = store.load(index).map_err(|e| {
            error!("FAILED READING FLASH (slot {number}): {e}");
            GatewayError::from(e)
        })?;

        if !record.device.active || !record.slot.is_active {
            return Ok(SlotOutcome::Skipped {
                device_active: record.device.active,
                slot_active: record.slot.is_active,
            });
        }

        let settings = record.device.link.resolve()?;
        let slot = &mut self.slots[index];
        slot.refresh(record.slot);
        slot.value = None;
        slot.alarm_state = AlarmSet::empty();

        info!(" - - - - - - - Scanning Slot {number} - - - - - - - ");
        let response = exchange(
            transport,
            &settings,
            slot.config.command.as_slice(),
            &timing.window(),
        )
        .await?;

        let crc_failed = record.device.link.enable_crc_check
            && response.len() >= MIN_RESPONSE_BYTES
            && !has_valid_crc(&response);
        if crc_failed {
            warn!("Slot {number}: response failed CRC check");
        }
        if response.len() < MIN_RESPONSE_BYTES || crc_failed {
            warn!("Slot {number}: ERROR: NO RESPONSE ({} bytes)", response.len());
            return Ok(SlotOutcome::NoResponse {
                received: response.len(),
            });
        }

        let reading = slot.config.data_type().and_then(|data_type| {
            let offset = slot.config.value_start as usize;
            let value = response
                .get(offset..)
                .ok_or(CodecError::InsufficientData {
                    needed: offset + data_type.width(),
                    available: response.len(),
                })
                .and_then(|bytes| decode(bytes, data_type))?;

            let fired = evaluate(&Evaluation {
                value,
                prev_value: slot.prev_value,
                data_type,
                active: slot.config.threshold_active,
                on_change: slot.config.on_change,
                thresholds: &slot.config.thresholds,
            })?;
            Ok((value, fired))
        });

        let (value, fired) = match reading {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Slot {number}: cannot decode reading: {e}");
                return Ok(SlotOutcome::Undecodable(e));
            }
        };

        let at = Utc::now();
        let events: Vec<AlarmEvent> = alarms(fired)
            .map(|alarm| {
                warn!("Slot {number}: {alarm} (value {value})");
                AlarmEvent {
                    slot: number,
                    alarm,
                    value,
                    at,
                }
            })
            .collect();

        let prev_value = slot.prev_value;
        slot.value = Some(value);
        slot.alarm_state = fired;
        slot.prev_value = Some(value);

        Ok(SlotOutcome::Evaluated(SlotReport {
            value,
            prev_value,
            alarms: events,
        }))
    }
}
