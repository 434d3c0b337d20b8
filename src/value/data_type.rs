//! # Data-Type Tags
//!
//! A data-type tag selects the width, numeric domain and byte order used to
//! reinterpret raw response bytes. The numeric tag values are persisted in the
//! monitoring slot record and accepted by the provisioning commands, so they must
//! never be renumbered.

use super::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric domain a tag decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
}

impl ValueKind {
    /// Number of leading response bytes consumed.
    pub const fn width(self) -> usize {
        match self {
            ValueKind::U8 | ValueKind::I8 => 1,
            ValueKind::U16 | ValueKind::I16 => 2,
            ValueKind::U32 | ValueKind::I32 | ValueKind::F32 => 4,
        }
    }
}

/// Byte arrangement of a value on the wire. `A` is the most significant byte of
/// the reassembled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Single byte, no reordering
    Single,
    /// 16-bit big-endian
    AB,
    /// 16-bit byte swapped
    BA,
    /// 32-bit big-endian
    ABCD,
    /// 32-bit fully reversed (little-endian)
    DCBA,
    /// 32-bit big-endian words, bytes swapped inside each word
    BADC,
    /// 32-bit word swapped
    CDAB,
}

impl ByteOrder {
    /// Rearranges wire bytes into big-endian order (`A` first).
    ///
    /// Every permutation is its own inverse, so the same call maps a big-endian
    /// value back to wire order.
    pub fn to_big_endian(self, wire: [u8; 4]) -> [u8; 4] {
        let [a, b, c, d] = wire;
        match self {
            ByteOrder::Single | ByteOrder::AB | ByteOrder::ABCD => wire,
            ByteOrder::BA => [b, a, c, d],
            ByteOrder::DCBA => [d, c, b, a],
            ByteOrder::BADC => [b, a, d, c],
            ByteOrder::CDAB => [c, d, a, b],
        }
    }
}

/// Data-type tag of a monitored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DataType {
    Uint16AB = 0,
    Uint16BA = 1,
    Int16AB = 2,
    Int16BA = 3,
    Uint32ABCD = 4,
    Uint32DCBA = 5,
    Uint32BADC = 6,
    Uint32CDAB = 7,
    Int32ABCD = 8,
    Int32DCBA = 9,
    Int32BADC = 10,
    Int32CDAB = 11,
    FloatABCD = 12,
    FloatDCBA = 13,
    FloatBADC = 14,
    FloatCDAB = 15,
    Uint8 = 16,
    Int8 = 17,
}

impl DataType {
    /// All supported tags in numeric order.
    pub const ALL: [DataType; 18] = [
        DataType::Uint16AB,
        DataType::Uint16BA,
        DataType::Int16AB,
        DataType::Int16BA,
        DataType::Uint32ABCD,
        DataType::Uint32DCBA,
        DataType::Uint32BADC,
        DataType::Uint32CDAB,
        DataType::Int32ABCD,
        DataType::Int32DCBA,
        DataType::Int32BADC,
        DataType::Int32CDAB,
        DataType::FloatABCD,
        DataType::FloatDCBA,
        DataType::FloatBADC,
        DataType::FloatCDAB,
        DataType::Uint8,
        DataType::Int8,
    ];

    /// Looks up a persisted tag.
    pub fn from_raw(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Persisted tag value.
    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    pub const fn kind(self) -> ValueKind {
        match self {
            DataType::Uint16AB | DataType::Uint16BA => ValueKind::U16,
            DataType::Int16AB | DataType::Int16BA => ValueKind::I16,
            DataType::Uint32ABCD
            | DataType::Uint32DCBA
            | DataType::Uint32BADC
            | DataType::Uint32CDAB => ValueKind::U32,
            DataType::Int32ABCD | DataType::Int32DCBA | DataType::Int32BADC | DataType::Int32CDAB => {
                ValueKind::I32
            }
            DataType::FloatABCD | DataType::FloatDCBA | DataType::FloatBADC | DataType::FloatCDAB => {
                ValueKind::F32
            }
            DataType::Uint8 => ValueKind::U8,
            DataType::Int8 => ValueKind::I8,
        }
    }

    pub const fn byte_order(self) -> ByteOrder {
        match self {
            DataType::Uint8 | DataType::Int8 => ByteOrder::Single,
            DataType::Uint16AB | DataType::Int16AB => ByteOrder::AB,
            DataType::Uint16BA | DataType::Int16BA => ByteOrder::BA,
            DataType::Uint32ABCD | DataType::Int32ABCD | DataType::FloatABCD => ByteOrder::ABCD,
            DataType::Uint32DCBA | DataType::Int32DCBA | DataType::FloatDCBA => ByteOrder::DCBA,
            DataType::Uint32BADC | DataType::Int32BADC | DataType::FloatBADC => ByteOrder::BADC,
            DataType::Uint32CDAB | DataType::Int32CDAB | DataType::FloatCDAB => ByteOrder::CDAB,
        }
    }

    /// Number of leading bytes the tag consumes.
    pub const fn width(self) -> usize {
        self.kind().width()
    }

    /// Canonical name, as printed in diagnostics and accepted by `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Uint16AB => "uInt16_AB",
            DataType::Uint16BA => "uInt16_BA",
            DataType::Int16AB => "Int16_AB",
            DataType::Int16BA => "Int16_BA",
            DataType::Uint32ABCD => "uInt32_ABCD",
            DataType::Uint32DCBA => "uInt32_DCBA",
            DataType::Uint32BADC => "uInt32_BADC",
            DataType::Uint32CDAB => "uInt32_CDAB",
            DataType::Int32ABCD => "Int32_ABCD",
            DataType::Int32DCBA => "Int32_DCBA",
            DataType::Int32BADC => "Int32_BADC",
            DataType::Int32CDAB => "Int32_CDAB",
            DataType::FloatABCD => "Float_ABCD",
            DataType::FloatDCBA => "Float_DCBA",
            DataType::FloatBADC => "Float_BADC",
            DataType::FloatCDAB => "Float_CDAB",
            DataType::Uint8 => "uInt8",
            DataType::Int8 => "Int8",
        }
    }
}

impl TryFrom<u8> for DataType {
    type Error = CodecError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        DataType::from_raw(tag).ok_or(CodecError::UnsupportedDataType(tag))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = CodecError;

    /// Accepts the canonical name (case and separator insensitive) or the numeric tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(tag) = s.trim().parse::<u8>() {
            return DataType::try_from(tag);
        }
        let wanted = normalize(s);
        DataType::ALL
            .iter()
            .copied()
            .find(|dt| normalize(dt.name()) == wanted)
            .ok_or(CodecError::UnknownDataTypeName(s.to_string()))
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', '_', ' '], "")
}
