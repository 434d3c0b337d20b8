//! # Value Codec
//!
//! Typed readings decoded from Modbus response bytes. A `Value` always carries
//! the numeric domain it was decoded into, so comparisons between a reading, its
//! previous reading and a threshold operand never depend on memory layout.

pub mod codec;
pub mod data_type;

pub use codec::{decode, decode_tag, encode};
pub use data_type::{ByteOrder, DataType, ValueKind};

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised while decoding raw bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unsupported data type tag: {0}")]
    UnsupportedDataType(u8),

    #[error("Unknown data type name: {0}")]
    UnknownDataTypeName(String),

    #[error("Insufficient data: need {needed} bytes, have {available}")]
    InsufficientData { needed: usize, available: usize },
}

/// A decoded reading or threshold operand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
}

/// A value widened into a domain where differences cannot wrap.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum Wide {
    Int(i64),
    Float(f64),
}

impl Wide {
    /// `self - other`, or `None` when the domains differ.
    pub fn checked_sub(self, other: Wide) -> Option<Wide> {
        match (self, other) {
            (Wide::Int(a), Wide::Int(b)) => Some(Wide::Int(a - b)),
            (Wide::Float(a), Wide::Float(b)) => Some(Wide::Float(a - b)),
            _ => None,
        }
    }

    /// Strict `>` within one domain; mismatched domains never compare greater.
    pub fn gt(self, other: Wide) -> bool {
        match (self, other) {
            (Wide::Int(a), Wide::Int(b)) => a > b,
            (Wide::Float(a), Wide::Float(b)) => a > b,
            _ => false,
        }
    }

    /// Strict `<` within one domain.
    pub fn lt(self, other: Wide) -> bool {
        match (self, other) {
            (Wide::Int(a), Wide::Int(b)) => a < b,
            (Wide::Float(a), Wide::Float(b)) => a < b,
            _ => false,
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::U8(_) => ValueKind::U8,
            Value::I8(_) => ValueKind::I8,
            Value::U16(_) => ValueKind::U16,
            Value::I16(_) => ValueKind::I16,
            Value::U32(_) => ValueKind::U32,
            Value::I32(_) => ValueKind::I32,
            Value::F32(_) => ValueKind::F32,
        }
    }

    pub fn widen(&self) -> Wide {
        match *self {
            Value::U8(v) => Wide::Int(v as i64),
            Value::I8(v) => Wide::Int(v as i64),
            Value::U16(v) => Wide::Int(v as i64),
            Value::I16(v) => Wide::Int(v as i64),
            Value::U32(v) => Wide::Int(v as i64),
            Value::I32(v) => Wide::Int(v as i64),
            Value::F32(v) => Wide::Float(v as f64),
        }
    }

    /// Big-endian bytes of the value, left aligned in a 4-byte slot.
    pub fn to_be_slot(&self) -> [u8; 4] {
        let mut slot = [0u8; 4];
        match *self {
            Value::U8(v) => slot[0] = v,
            Value::I8(v) => slot[0] = v as u8,
            Value::U16(v) => slot[..2].copy_from_slice(&v.to_be_bytes()),
            Value::I16(v) => slot[..2].copy_from_slice(&v.to_be_bytes()),
            Value::U32(v) => slot = v.to_be_bytes(),
            Value::I32(v) => slot = v.to_be_bytes(),
            Value::F32(v) => slot = v.to_bits().to_be_bytes(),
        }
        slot
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v:.2}"),
        }
    }
}
