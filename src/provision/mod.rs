//! The provision module contains the configuration command set: a `nom`
//! parser for command lines, the executor applying them to the record store
//! and the text views they print.

pub mod command;
pub mod executor;
pub mod render;

pub use command::{parse_command, CommandError, ConfigCommand, SlotParams};
pub use executor::execute;
pub use render::{render_device_segment, render_slot};
