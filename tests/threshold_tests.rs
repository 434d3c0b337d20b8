//! Tests for the threshold evaluator across numeric domains.

use lora_modbus_rs::monitor::threshold::alarms;
use lora_modbus_rs::monitor::{evaluate, AlarmSet, Evaluation, ThresholdFlags, Thresholds};
use lora_modbus_rs::{encode, Alarm, DataType, Value};

fn operands(data_type: DataType, spike: Value, high: Value, low: Value) -> Thresholds {
    Thresholds {
        spike_up: encode(spike, data_type).unwrap(),
        spike_down: encode(spike, data_type).unwrap(),
        high: encode(high, data_type).unwrap(),
        low: encode(low, data_type).unwrap(),
    }
}

fn run(
    data_type: DataType,
    value: Value,
    prev_value: Option<Value>,
    active: ThresholdFlags,
    thresholds: &Thresholds,
) -> AlarmSet {
    evaluate(&Evaluation {
        value,
        prev_value,
        data_type,
        active,
        on_change: true,
        thresholds,
    })
    .unwrap()
}

#[test]
fn test_signed_int16_thresholds() {
    let t = operands(
        DataType::Int16BA,
        Value::I16(10),
        Value::I16(-5),
        Value::I16(-50),
    );
    let flags = ThresholdFlags::THRESHOLD_HIGH | ThresholdFlags::THRESHOLD_LOW;

    assert_eq!(run(DataType::Int16BA, Value::I16(0), None, flags, &t), AlarmSet::HIGH);
    assert_eq!(run(DataType::Int16BA, Value::I16(-60), None, flags, &t), AlarmSet::LOW);
    assert_eq!(run(DataType::Int16BA, Value::I16(-20), None, flags, &t), AlarmSet::empty());
}

#[test]
fn test_float_spike_down() {
    let t = operands(
        DataType::FloatCDAB,
        Value::F32(2.5),
        Value::F32(0.0),
        Value::F32(0.0),
    );
    let fired = run(
        DataType::FloatCDAB,
        Value::F32(20.0),
        Some(Value::F32(23.0)),
        ThresholdFlags::SPIKE_DOWN | ThresholdFlags::SPIKE_UP,
        &t,
    );
    assert_eq!(fired, AlarmSet::SPIKE_DOWN);
}

#[test]
fn test_u32_spike_has_no_wraparound() {
    let t = operands(
        DataType::Uint32ABCD,
        Value::U32(100),
        Value::U32(0),
        Value::U32(0),
    );
    let fired = run(
        DataType::Uint32ABCD,
        Value::U32(0),
        Some(Value::U32(u32::MAX)),
        ThresholdFlags::SPIKE_UP,
        &t,
    );
    assert!(fired.is_empty());
}

#[test]
fn test_disabled_predicates_never_fire() {
    let t = operands(DataType::Uint8, Value::U8(0), Value::U8(0), Value::U8(255));
    let fired = run(
        DataType::Uint8,
        Value::U8(9),
        Some(Value::U8(1)),
        ThresholdFlags::TRIGGER_FLAG,
        &t,
    );
    assert!(fired.is_empty());
}

#[test]
fn test_no_previous_reading_silences_history_predicates() {
    let t = operands(DataType::Uint8, Value::U8(0), Value::U8(0), Value::U8(0));
    let fired = run(DataType::Uint8, Value::U8(200), None, ThresholdFlags::all(), &t);
    assert_eq!(fired, AlarmSet::HIGH);
}

#[test]
fn test_float_on_change_by_bits() {
    let t = Thresholds::default();
    let negative_zero = run(
        DataType::FloatABCD,
        Value::F32(-0.0),
        Some(Value::F32(0.0)),
        ThresholdFlags::ON_CHANGE,
        &t,
    );
    assert_eq!(negative_zero, AlarmSet::ON_CHANGE);

    let same = run(
        DataType::FloatABCD,
        Value::F32(1.25),
        Some(Value::F32(1.25)),
        ThresholdFlags::ON_CHANGE,
        &t,
    );
    assert!(same.is_empty());
}

#[test]
fn test_alarm_order_and_messages() {
    let all: Vec<Alarm> = alarms(AlarmSet::all()).collect();
    assert_eq!(all, Alarm::ALL.to_vec());
    assert_eq!(Alarm::High.to_string(), "#### ALARM HIGH DETECTED ####");
    assert_eq!(Alarm::SpikeDown.flag(), AlarmSet::SPIKE_DOWN);
}

#[test]
fn test_every_tag_evaluates() {
    // four-byte operands cover the widest tag
    let t = Thresholds::default();
    for data_type in DataType::ALL {
        let value = lora_modbus_rs::decode(&[0, 0, 0, 0], data_type).unwrap();
        assert!(evaluate(&Evaluation {
            value,
            prev_value: Some(value),
            data_type,
            active: ThresholdFlags::all(),
            on_change: true,
            thresholds: &t,
        })
        .is_ok());
    }
}
