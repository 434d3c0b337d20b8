//! # lora-modbus-rs - Modbus RTU Gateway Core for LoRaWAN Sensor Nodes
//!
//! The lora-modbus-rs crate implements the data path of a LoRaWAN gateway that
//! polls up to sixteen Modbus RTU field devices over a shared RS-485 link.
//!
//! ## Features
//!
//! - Decode raw Modbus response bytes into typed values under 18 width and
//!   byte-order conversions
//! - Evaluate high, low, spike-up, spike-down and on-change alarms per
//!   monitoring slot, tracking the previous reading across checks
//! - Scan device segments and reduce register responses to the registers
//!   selected by a validity bitmask
//! - Persist device, segment and slot configuration in per-device flash records
//! - Provision everything through a line-oriented command set
//! - Pack filtered readings into a bounded uplink payload
//!
//! ## Usage
//!
//! ```rust
//! use lora_modbus_rs::{decode, DataType, Value};
//!
//! let value = decode(&[0x41, 0xAC, 0x00, 0x00], DataType::FloatABCD).unwrap();
//! assert_eq!(value, Value::F32(21.5));
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod modbus;
pub mod monitor;
pub mod provision;
pub mod storage;
pub mod transport;
pub mod uplink;
pub mod util;
pub mod value;

pub use crate::config::GatewayConfig;
pub use crate::error::GatewayError;
pub use crate::gateway::Gateway;
pub use crate::logging::{init_logger, log_info};

// Value codec
pub use value::{decode, decode_tag, encode, ByteOrder, CodecError, DataType, Value, ValueKind};

// Scan pipeline
pub use modbus::{filter_response, scan_segment, DeviceConfig, FilteredData, RawCommand, Segment};

// Monitoring
pub use monitor::{Alarm, AlarmEvent, AlarmSet, MonitorEngine, SlotConfig, SlotOutcome};

// Storage and provisioning
pub use provision::{parse_command, ConfigCommand};
pub use storage::{DeviceRecord, FileFlash, Flash, MemoryFlash, RecordStore, StoreError};

// Transport
pub use transport::mock::MockTransport;
pub use transport::serial::SerialTransport;
pub use transport::{LinkSettings, Transport, TransportError};

pub use uplink::{SegmentReading, UplinkBuilder};
