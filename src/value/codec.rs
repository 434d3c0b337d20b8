//! Byte-order aware conversion between raw response bytes and typed values.

use super::data_type::{DataType, ValueKind};
use super::{CodecError, Value};
use log::trace;

/// Decodes the leading bytes of `bytes` as `data_type`.
///
/// Only the first 1, 2 or 4 bytes are read; trailing bytes are ignored. Decoding
/// is pure: the same bytes and tag always give the same value.
pub fn decode(bytes: &[u8], data_type: DataType) -> Result<Value, CodecError> {
    let width = data_type.width();
    if bytes.len() < width {
        return Err(CodecError::InsufficientData {
            needed: width,
            available: bytes.len(),
        });
    }

    let mut wire = [0u8; 4];
    wire[..width].copy_from_slice(&bytes[..width]);
    let [a, b, c, d] = data_type.byte_order().to_big_endian(wire);

    let value = match data_type.kind() {
        ValueKind::U8 => Value::U8(a),
        ValueKind::I8 => Value::I8(a as i8),
        ValueKind::U16 => Value::U16(u16::from_be_bytes([a, b])),
        ValueKind::I16 => Value::I16(i16::from_be_bytes([a, b])),
        ValueKind::U32 => Value::U32(u32::from_be_bytes([a, b, c, d])),
        ValueKind::I32 => Value::I32(i32::from_be_bytes([a, b, c, d])),
        ValueKind::F32 => Value::F32(f32::from_bits(u32::from_be_bytes([a, b, c, d]))),
    };

    trace!("{}: {}", data_type, value);
    Ok(value)
}

/// Decodes with a persisted numeric tag.
pub fn decode_tag(bytes: &[u8], tag: u8) -> Result<Value, CodecError> {
    decode(bytes, DataType::try_from(tag)?)
}

/// Lays `value` out in wire order for `data_type`, left aligned in a 4-byte
/// operand buffer. This is how threshold operands are produced from typed input.
///
/// Returns `None` when the value's domain does not match the tag.
pub fn encode(value: Value, data_type: DataType) -> Option<[u8; 4]> {
    if value.kind() != data_type.kind() {
        return None;
    }
    Some(data_type.byte_order().to_big_endian(value.to_be_slot()))
}
