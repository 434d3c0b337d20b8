//! Monitoring slot configuration and evolving state.

use super::threshold::{AlarmSet, ThresholdFlags, Thresholds};
use crate::modbus::RawCommand;
use crate::value::{CodecError, DataType, Value};

/// Persisted configuration of a monitoring slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotConfig {
    /// Request sent for this slot, independent of the device's segments
    pub command: RawCommand,
    /// Raw data type tag; unsupported tags are kept as stored and rejected at decode
    pub data_type: u8,
    /// Response byte offset where the value begins
    pub value_start: u8,
    pub threshold_active: ThresholdFlags,
    pub thresholds: Thresholds,
    pub on_change: bool,
    /// Persisted trigger flag value
    pub trigger_flag: bool,
    pub is_active: bool,
}

impl SlotConfig {
    /// The slot `clear slot-params` leaves behind: six zero command bytes,
    /// `Float_ABCD`, no thresholds, inactive.
    pub fn cleared() -> Self {
        SlotConfig {
            command: RawCommand::new(&[0u8; 6]).unwrap_or_default(),
            data_type: DataType::FloatABCD.as_raw(),
            ..Default::default()
        }
    }

    pub fn data_type(&self) -> Result<DataType, CodecError> {
        DataType::try_from(self.data_type)
    }
}

/// In-memory working copy of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonitorSlot {
    pub config: SlotConfig,
    /// Reading of the latest check; cleared when that check got no usable response
    pub value: Option<Value>,
    /// Reading of the last successful check
    pub prev_value: Option<Value>,
    /// Alarms raised by the latest evaluation
    pub alarm_state: AlarmSet,
}

impl MonitorSlot {
    /// Fresh working copy populated from `config`.
    pub fn new(config: SlotConfig) -> Self {
        MonitorSlot {
            config,
            ..Default::default()
        }
    }

    /// Replaces the configuration. Reading history is dropped when the data
    /// type tag changes.
    pub fn refresh(&mut self, config: SlotConfig) {
        if config.data_type != self.config.data_type {
            self.value = None;
            self.prev_value = None;
        }
        self.config = config;
    }

    pub fn is_active(&self) -> bool {
        self.config.is_active
    }
}
