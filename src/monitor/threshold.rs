//! # Threshold Evaluator
//!
//! Five alarm predicates over a slot's current and previous reading. Threshold
//! operands are stored as raw 4-byte buffers and reinterpreted with the slot's
//! own data type, so a threshold always lives in the same numeric domain as
//! the reading it is compared against.
//!
//! Differences for spike detection are computed in a widened signed domain
//! (`i64` for integer types, `f64` for floats): an unsigned reading falling
//! from 3 to 10 is a delta of -7, never a wrapped 65529.

use crate::value::{decode, CodecError, DataType, Value};
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

bitflags! {
    /// The slot's 16-bit `ThresholdActive` mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ThresholdFlags: u16 {
        const SPIKE_UP = 1 << 15;
        const SPIKE_DOWN = 1 << 14;
        const THRESHOLD_HIGH = 1 << 13;
        const THRESHOLD_LOW = 1 << 12;
        const ON_CHANGE = 1 << 11;
        /// Generic trigger flag; persisted, evaluates nothing
        const TRIGGER_FLAG = 1 << 10;
    }
}

bitflags! {
    /// Alarms raised by one evaluation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AlarmSet: u8 {
        const HIGH = 1 << 0;
        const LOW = 1 << 1;
        const SPIKE_UP = 1 << 2;
        const SPIKE_DOWN = 1 << 3;
        const ON_CHANGE = 1 << 4;
    }
}

/// A single alarm predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Alarm {
    High,
    Low,
    SpikeUp,
    SpikeDown,
    OnChange,
}

impl Alarm {
    /// Evaluation order.
    pub const ALL: [Alarm; 5] = [
        Alarm::High,
        Alarm::Low,
        Alarm::SpikeUp,
        Alarm::SpikeDown,
        Alarm::OnChange,
    ];

    /// Fixed notification text of the predicate.
    pub fn message(&self) -> &'static str {
        match self {
            Alarm::High => "#### ALARM HIGH DETECTED ####",
            Alarm::Low => "#### ALARM LOW DETECTED ####",
            Alarm::SpikeUp => "#### SPIKE UP ALARM DETECTED ####",
            Alarm::SpikeDown => "#### SPIKE DOWN ALARM DETECTED ####",
            Alarm::OnChange => "#### ON CHANGE ALARM DETECTED ####",
        }
    }

    pub fn flag(&self) -> AlarmSet {
        match self {
            Alarm::High => AlarmSet::HIGH,
            Alarm::Low => AlarmSet::LOW,
            Alarm::SpikeUp => AlarmSet::SPIKE_UP,
            Alarm::SpikeDown => AlarmSet::SPIKE_DOWN,
            Alarm::OnChange => AlarmSet::ON_CHANGE,
        }
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Raw threshold operands of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Thresholds {
    pub spike_up: [u8; 4],
    pub spike_down: [u8; 4],
    pub high: [u8; 4],
    pub low: [u8; 4],
}

/// Threshold operands decoded in the slot's domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedThresholds {
    pub spike_up: Value,
    pub spike_down: Value,
    pub high: Value,
    pub low: Value,
}

impl Thresholds {
    pub fn decode(&self, data_type: DataType) -> Result<DecodedThresholds, CodecError> {
        Ok(DecodedThresholds {
            spike_up: decode(&self.spike_up, data_type)?,
            spike_down: decode(&self.spike_down, data_type)?,
            high: decode(&self.high, data_type)?,
            low: decode(&self.low, data_type)?,
        })
    }
}

/// Inputs to one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation<'a> {
    pub value: Value,
    /// `None` until the slot has completed one successful check
    pub prev_value: Option<Value>,
    pub data_type: DataType,
    pub active: ThresholdFlags,
    pub on_change: bool,
    pub thresholds: &'a Thresholds,
}

/// `value != prev` in the decoded domain; floats compare by bit pattern.
fn changed(value: Value, prev: Value) -> bool {
    match (value, prev) {
        (Value::F32(a), Value::F32(b)) => a.to_bits() != b.to_bits(),
        _ => value != prev,
    }
}

/// Evaluates every gated predicate and returns the alarms that fired.
///
/// Spike and on-change predicates need a previous reading and stay silent
/// without one. On-change requires both the `ON_CHANGE` bit and the slot's
/// on-change flag.
pub fn evaluate(input: &Evaluation<'_>) -> Result<AlarmSet, CodecError> {
    let operands = input.thresholds.decode(input.data_type)?;
    let value = input.value.widen();
    let mut fired = AlarmSet::empty();

    if input.active.contains(ThresholdFlags::THRESHOLD_HIGH) && value.gt(operands.high.widen()) {
        fired |= AlarmSet::HIGH;
    }
    if input.active.contains(ThresholdFlags::THRESHOLD_LOW) && value.lt(operands.low.widen()) {
        fired |= AlarmSet::LOW;
    }

    if let Some(prev) = input.prev_value {
        let prev_wide = prev.widen();

        if input.active.contains(ThresholdFlags::SPIKE_UP) {
            if let Some(delta) = value.checked_sub(prev_wide) {
                if delta.gt(operands.spike_up.widen()) {
                    fired |= AlarmSet::SPIKE_UP;
                }
            }
        }
        if input.active.contains(ThresholdFlags::SPIKE_DOWN) {
            if let Some(delta) = prev_wide.checked_sub(value) {
                if delta.gt(operands.spike_down.widen()) {
                    fired |= AlarmSet::SPIKE_DOWN;
                }
            }
        }
        if input.on_change
            && input.active.contains(ThresholdFlags::ON_CHANGE)
            && changed(input.value, prev)
        {
            fired |= AlarmSet::ON_CHANGE;
        }
    }

    Ok(fired)
}

/// Iterates the alarms of a set in evaluation order.
pub fn alarms(set: AlarmSet) -> impl Iterator<Item = Alarm> {
    Alarm::ALL.into_iter().filter(move |a| set.contains(a.flag()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_thresholds(spike_up: f32, spike_down: f32, high: f32, low: f32) -> Thresholds {
        Thresholds {
            spike_up: spike_up.to_be_bytes(),
            spike_down: spike_down.to_be_bytes(),
            high: high.to_be_bytes(),
            low: low.to_be_bytes(),
        }
    }

    #[test]
    fn test_spike_up_float() {
        let thresholds = float_thresholds(3.0, 0.0, 0.0, 0.0);
        let input = Evaluation {
            value: Value::F32(15.0),
            prev_value: Some(Value::F32(10.0)),
            data_type: DataType::FloatABCD,
            active: ThresholdFlags::SPIKE_UP,
            on_change: false,
            thresholds: &thresholds,
        };
        assert_eq!(evaluate(&input).unwrap(), AlarmSet::SPIKE_UP);

        let thresholds = float_thresholds(6.0, 0.0, 0.0, 0.0);
        let input = Evaluation {
            thresholds: &thresholds,
            ..input
        };
        assert!(evaluate(&input).unwrap().is_empty());
    }

    #[test]
    fn test_gating_bits() {
        let thresholds = Thresholds {
            high: [0x00, 0x0A, 0, 0],
            low: [0x00, 0x64, 0, 0],
            ..Default::default()
        };
        let mut input = Evaluation {
            value: Value::U16(50),
            prev_value: None,
            data_type: DataType::Uint16AB,
            active: ThresholdFlags::empty(),
            on_change: false,
            thresholds: &thresholds,
        };
        assert!(evaluate(&input).unwrap().is_empty());

        input.active = ThresholdFlags::THRESHOLD_HIGH | ThresholdFlags::THRESHOLD_LOW;
        assert_eq!(evaluate(&input).unwrap(), AlarmSet::HIGH | AlarmSet::LOW);
    }

    #[test]
    fn test_unsigned_spike_down_does_not_wrap() {
        // 10 -> 3 is a drop of 7; 3 -> 10 must not look like a huge drop
        let thresholds = Thresholds {
            spike_down: [0x00, 0x05, 0, 0],
            spike_up: [0x00, 0x05, 0, 0],
            ..Default::default()
        };
        let mut input = Evaluation {
            value: Value::U16(3),
            prev_value: Some(Value::U16(10)),
            data_type: DataType::Uint16AB,
            active: ThresholdFlags::SPIKE_DOWN | ThresholdFlags::SPIKE_UP,
            on_change: false,
            thresholds: &thresholds,
        };
        assert_eq!(evaluate(&input).unwrap(), AlarmSet::SPIKE_DOWN);

        input.value = Value::U16(10);
        input.prev_value = Some(Value::U16(3));
        assert_eq!(evaluate(&input).unwrap(), AlarmSet::SPIKE_UP);
    }

    #[test]
    fn test_threshold_reinterpreted_with_slot_type() {
        // 0xFF 0xFE reads as -2 for Int16_AB
        let thresholds = Thresholds {
            low: [0xFF, 0xFE, 0, 0],
            ..Default::default()
        };
        let input = Evaluation {
            value: Value::I16(-5),
            prev_value: None,
            data_type: DataType::Int16AB,
            active: ThresholdFlags::THRESHOLD_LOW,
            on_change: false,
            thresholds: &thresholds,
        };
        assert_eq!(evaluate(&input).unwrap(), AlarmSet::LOW);
    }

    #[test]
    fn test_on_change_needs_bit_and_flag() {
        let thresholds = Thresholds::default();
        let mut input = Evaluation {
            value: Value::U8(2),
            prev_value: Some(Value::U8(1)),
            data_type: DataType::Uint8,
            active: ThresholdFlags::ON_CHANGE,
            on_change: false,
            thresholds: &thresholds,
        };
        assert!(evaluate(&input).unwrap().is_empty());

        input.on_change = true;
        assert_eq!(evaluate(&input).unwrap(), AlarmSet::ON_CHANGE);

        input.active = ThresholdFlags::TRIGGER_FLAG;
        assert!(evaluate(&input).unwrap().is_empty());
    }

    #[test]
    fn test_no_previous_reading() {
        let thresholds = Thresholds::default();
        let input = Evaluation {
            value: Value::I32(-100),
            prev_value: None,
            data_type: DataType::Int32ABCD,
            active: ThresholdFlags::all(),
            on_change: true,
            thresholds: &thresholds,
        };
        // only LOW can fire: -100 < 0
        assert_eq!(evaluate(&input).unwrap(), AlarmSet::LOW);
    }

    #[test]
    fn test_alarm_iteration_order() {
        let set = AlarmSet::ON_CHANGE | AlarmSet::HIGH | AlarmSet::SPIKE_DOWN;
        let order: Vec<Alarm> = alarms(set).collect();
        assert_eq!(order, vec![Alarm::High, Alarm::SpikeDown, Alarm::OnChange]);
        assert_eq!(Alarm::SpikeUp.to_string(), "#### SPIKE UP ALARM DETECTED ####");
    }
}
