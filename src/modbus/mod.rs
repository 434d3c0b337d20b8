//! The modbus module contains the device/segment model, Modbus RTU response
//! framing and the segment scan & register filtering pipeline.

pub mod command;
pub mod device;
pub mod frame;
pub mod scan;

pub use command::RawCommand;
pub use device::{DeviceConfig, LinkProfile, Segment};
pub use frame::CommandType;
pub use scan::{filter_response, scan_segment, FilterKind, FilteredData};
