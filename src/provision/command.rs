//! # Provisioning Command Parser
//!
//! Parses the line-oriented configuration commands into `ConfigCommand`.
//! Device, segment and slot numbers are 1 based. `set slot-params` takes every
//! field in hex; `set segment-params` takes its validity mask bytes, the
//! command size and the command bytes in hex and everything else in decimal.

use crate::constants::MAX_COMMAND_SIZE;
use crate::modbus::RawCommand;
use crate::monitor::{ThresholdFlags, Thresholds};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map, map_res, value},
    multi::many0,
    sequence::{preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

/// Errors raised while parsing a command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid input format for '{command}'")]
    InvalidFormat { command: &'static str },

    #[error("Command size {0} exceeds {MAX_COMMAND_SIZE} bytes")]
    CommandTooLong(usize),

    #[error("Command size is {declared} but {found} command bytes were given")]
    CommandLength { declared: usize, found: usize },
}

/// Parameters of `set slot-params`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotParams {
    pub cmd_id: u8,
    pub slot: u8,
    pub data_type: u8,
    pub value_start: u8,
    pub threshold_active: ThresholdFlags,
    pub thresholds: Thresholds,
    pub on_change: bool,
    pub command: RawCommand,
}

/// A parsed provisioning command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    GetModbusParams {
        device: u8,
        segment: u8,
    },
    /// Only `cmd_id == 1` changes the profile; other ids rewrite the record as is
    SetDeviceParams {
        cmd_id: u8,
        device: u8,
        baud: u8,
        parity: u8,
        stop_bits: u8,
        active: bool,
    },
    SetSegmentParams {
        cmd_id: u8,
        device: u8,
        segment: u8,
        enable: bool,
        send_now: bool,
        valid_addresses: u32,
        command: RawCommand,
    },
    ClearModbusParams {
        device: u8,
    },
    SetSlotParams(SlotParams),
    ViewSlotParams {
        slot: u8,
    },
    ClearSlotParams {
        slot: u8,
    },
    ClearAllSlotParams,
    SetSlotActive {
        slot: u8,
        active: bool,
    },
}

const KEYWORDS: [&str; 9] = [
    "get modbus-params",
    "set device-params",
    "set segment-params",
    "clear modbus-params",
    "set slot-params",
    "view slot-params",
    "clear slot-params",
    "clear all slots-params",
    "set slot-active",
];

fn dec_u8(input: &str) -> IResult<&str, u8> {
    map_res(digit1, |s: &str| s.parse::<u8>())(input)
}

fn hex_u8(input: &str) -> IResult<&str, u8> {
    map_res(
        take_while_m_n(1, 2, |c: char| c.is_ascii_hexdigit()),
        |s: &str| u8::from_str_radix(s, 16),
    )(input)
}

fn arg<'a, O>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    preceded(space1, parser)
}

fn operand(input: &str) -> IResult<&str, [u8; 4]> {
    map(
        tuple((arg(hex_u8), arg(hex_u8), arg(hex_u8), arg(hex_u8))),
        |(a, b, c, d)| [a, b, c, d],
    )(input)
}

/// Declared command size followed by the command bytes, all hex.
fn command_bytes(input: &str) -> IResult<&str, (u8, Vec<u8>)> {
    tuple((arg(hex_u8), many0(arg(hex_u8))))(input)
}

fn build_command(declared: u8, bytes: Vec<u8>) -> Result<RawCommand, CommandError> {
    let declared = declared as usize;
    if declared > MAX_COMMAND_SIZE {
        return Err(CommandError::CommandTooLong(declared));
    }
    if bytes.len() != declared {
        return Err(CommandError::CommandLength {
            declared,
            found: bytes.len(),
        });
    }
    RawCommand::new(&bytes).ok_or(CommandError::CommandTooLong(declared))
}

/// Intermediate parse result; variable-length commands are validated after
/// the grammar matched.
#[derive(Clone)]
enum Parsed {
    Ready(ConfigCommand),
    Segment {
        head: (u8, u8, u8, u8, u8, [u8; 4]),
        size: u8,
        bytes: Vec<u8>,
    },
    Slot {
        head: (u8, u8, u8, u8, u8, u8),
        operands: ([u8; 4], [u8; 4], [u8; 4], [u8; 4]),
        on_change: u8,
        size: u8,
        bytes: Vec<u8>,
    },
}

fn get_modbus_params(input: &str) -> IResult<&str, Parsed> {
    map(
        preceded(
            tag("get modbus-params dev"),
            tuple((arg(dec_u8), preceded(tuple((space1, tag("seg"))), arg(dec_u8)))),
        ),
        |(device, segment)| Parsed::Ready(ConfigCommand::GetModbusParams { device, segment }),
    )(input)
}

fn set_device_params(input: &str) -> IResult<&str, Parsed> {
    map(
        preceded(
            tag("set device-params"),
            tuple((
                arg(dec_u8),
                arg(dec_u8),
                arg(dec_u8),
                arg(dec_u8),
                arg(dec_u8),
                arg(dec_u8),
            )),
        ),
        |(cmd_id, device, baud, parity, stop_bits, active)| {
            Parsed::Ready(ConfigCommand::SetDeviceParams {
                cmd_id,
                device,
                baud,
                parity,
                stop_bits,
                active: active != 0,
            })
        },
    )(input)
}

fn set_segment_params(input: &str) -> IResult<&str, Parsed> {
    map(
        preceded(
            tag("set segment-params"),
            tuple((
                arg(dec_u8),
                arg(dec_u8),
                arg(dec_u8),
                arg(dec_u8),
                arg(dec_u8),
                operand,
                command_bytes,
            )),
        ),
        |(cmd_id, device, segment, enable, send_now, mask, (size, bytes))| Parsed::Segment {
            head: (cmd_id, device, segment, enable, send_now, mask),
            size,
            bytes,
        },
    )(input)
}

fn clear_modbus_params(input: &str) -> IResult<&str, Parsed> {
    map(preceded(tag("clear modbus-params dev"), arg(dec_u8)), |device| {
        Parsed::Ready(ConfigCommand::ClearModbusParams { device })
    })(input)
}

fn set_slot_params(input: &str) -> IResult<&str, Parsed> {
    map(
        preceded(
            tag("set slot-params"),
            tuple((
                tuple((
                    arg(hex_u8),
                    arg(hex_u8),
                    arg(hex_u8),
                    arg(hex_u8),
                    arg(hex_u8),
                    arg(hex_u8),
                )),
                tuple((operand, operand, operand, operand)),
                arg(hex_u8),
                command_bytes,
            )),
        ),
        |(head, operands, on_change, (size, bytes))| Parsed::Slot {
            head,
            operands,
            on_change,
            size,
            bytes,
        },
    )(input)
}

fn slot_number_command(input: &str) -> IResult<&str, Parsed> {
    alt((
        map(preceded(tag("view slot-params"), arg(dec_u8)), |slot| {
            Parsed::Ready(ConfigCommand::ViewSlotParams { slot })
        }),
        map(preceded(tag("clear slot-params"), arg(dec_u8)), |slot| {
            Parsed::Ready(ConfigCommand::ClearSlotParams { slot })
        }),
        value(
            Parsed::Ready(ConfigCommand::ClearAllSlotParams),
            tag("clear all slots-params"),
        ),
        map(
            preceded(tag("set slot-active"), tuple((arg(dec_u8), arg(dec_u8)))),
            |(slot, state)| {
                Parsed::Ready(ConfigCommand::SetSlotActive {
                    slot,
                    active: state == 1,
                })
            },
        ),
    ))(input)
}

fn parse_line(input: &str) -> IResult<&str, Parsed> {
    all_consuming(terminated(
        alt((
            get_modbus_params,
            set_device_params,
            set_segment_params,
            clear_modbus_params,
            set_slot_params,
            slot_number_command,
        )),
        space0,
    ))(input)
}

/// Parses one provisioning command line.
pub fn parse_command(line: &str) -> Result<ConfigCommand, CommandError> {
    let line = line.trim();
    let parsed = match parse_line(line) {
        Ok((_, parsed)) => parsed,
        Err(_) => {
            return Err(match KEYWORDS.iter().find(|k| line.starts_with(**k)) {
                Some(command) => CommandError::InvalidFormat { command: *command },
                None => CommandError::UnknownCommand(line.to_string()),
            })
        }
    };

    match parsed {
        Parsed::Ready(command) => Ok(command),
        Parsed::Segment {
            head: (cmd_id, device, segment, enable, send_now, mask),
            size,
            bytes,
        } => Ok(ConfigCommand::SetSegmentParams {
            cmd_id,
            device,
            segment,
            enable: enable != 0,
            send_now: send_now != 0,
            valid_addresses: u32::from_be_bytes(mask),
            command: build_command(size, bytes)?,
        }),
        Parsed::Slot {
            head: (cmd_id, slot, data_type, value_start, active_hi, active_lo),
            operands: (spike_up, spike_down, high, low),
            on_change,
            size,
            bytes,
        } => Ok(ConfigCommand::SetSlotParams(SlotParams {
            cmd_id,
            slot,
            data_type,
            value_start,
            threshold_active: ThresholdFlags::from_bits_retain(u16::from_be_bytes([
                active_hi, active_lo,
            ])),
            thresholds: Thresholds {
                spike_up,
                spike_down,
                high,
                low,
            },
            on_change: on_change == 1,
            command: build_command(size, bytes)?,
        })),
    }
}
