//! # Uplink Payload Assembly
//!
//! Filtered segment readings are packed back to back into one bounded uplink
//! payload. Each entry is framed as
//!
//! ```text
//! [device: u8][segment: u8][length: u8][filtered bytes; length]
//! ```
//!
//! with 1-based device and segment numbers. An entry that does not fit is
//! dropped whole and reported; the payload built so far stays valid.

use crate::constants::MAX_UPLINK_PAYLOAD;
use crate::modbus::FilteredData;
use bytes::{BufMut, Bytes, BytesMut};
use log::warn;

/// Entry header size.
pub const ENTRY_HEADER_SIZE: usize = 3;

/// One scanned segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentReading {
    /// Device number, 1 based
    pub device: u8,
    /// Segment number, 1 based
    pub segment: u8,
    pub data: FilteredData,
}

/// Bounded uplink payload builder.
#[derive(Debug)]
pub struct UplinkBuilder {
    buf: BytesMut,
    capacity: usize,
    dropped: usize,
}

impl Default for UplinkBuilder {
    fn default() -> Self {
        Self::new(MAX_UPLINK_PAYLOAD)
    }
}

impl UplinkBuilder {
    pub fn new(capacity: usize) -> Self {
        UplinkBuilder {
            buf: BytesMut::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Appends raw bytes at the current end; returns the new payload length,
    /// or `None` (payload unchanged) when they do not fit.
    pub fn append(&mut self, data: &[u8]) -> Option<usize> {
        if self.buf.len() + data.len() > self.capacity {
            warn!(
                "Uplink payload full: {} + {} bytes exceeds {}",
                self.buf.len(),
                data.len(),
                self.capacity
            );
            self.dropped += 1;
            return None;
        }
        self.buf.put_slice(data);
        Some(self.buf.len())
    }

    /// Appends one framed reading. Readings without data are skipped.
    pub fn push_reading(&mut self, reading: &SegmentReading) -> bool {
        let data = &reading.data.bytes;
        if data.is_empty() {
            return false;
        }
        let Ok(len) = u8::try_from(data.len()) else {
            warn!(
                "Device {} segment {}: {} bytes cannot be framed",
                reading.device,
                reading.segment,
                data.len()
            );
            self.dropped += 1;
            return false;
        };

        let mut entry = Vec::with_capacity(ENTRY_HEADER_SIZE + data.len());
        entry.extend_from_slice(&[reading.device, reading.segment, len]);
        entry.extend_from_slice(data);
        self.append(&entry).is_some()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    /// Entries or appends rejected so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Takes the payload, leaving the builder empty.
    pub fn finish(&mut self) -> Bytes {
        self.dropped = 0;
        self.buf.split().freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modbus::FilterKind;

    fn reading(device: u8, segment: u8, bytes: Vec<u8>) -> SegmentReading {
        SegmentReading {
            device,
            segment,
            data: FilteredData {
                bytes,
                kind: FilterKind::Raw,
            },
        }
    }

    #[test]
    fn test_entries_are_framed() {
        let mut builder = UplinkBuilder::default();
        assert!(builder.push_reading(&reading(1, 2, vec![0xAA, 0xBB])));
        assert!(builder.push_reading(&reading(3, 1, vec![0x01])));
        assert_eq!(
            builder.finish().as_ref(),
            &[1, 2, 2, 0xAA, 0xBB, 3, 1, 1, 0x01]
        );
        assert!(builder.is_empty());
    }

    #[test]
    fn test_overflow_drops_whole_entry() {
        let mut builder = UplinkBuilder::new(8);
        assert!(builder.push_reading(&reading(1, 1, vec![1, 2, 3])));
        assert!(!builder.push_reading(&reading(1, 2, vec![4, 5])));
        assert_eq!(builder.len(), 6);
        assert_eq!(builder.remaining(), 2);
        assert_eq!(builder.dropped(), 1);
        assert_eq!(builder.append(&[9, 9]), Some(8));
    }

    #[test]
    fn test_empty_reading_skipped() {
        let mut builder = UplinkBuilder::default();
        assert!(!builder.push_reading(&reading(1, 1, Vec::new())));
        assert_eq!(builder.dropped(), 0);
    }
}
