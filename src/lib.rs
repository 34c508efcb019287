#![no_std]

mod codec;
mod command;
mod decode;
mod frame;
mod register;

// Host command to module 0x01, register 0x0021 (set output voltage), 750.0 V
// ID 158101A0  DATA 00 00 00 21 44 3B 80 00

/// Manufacturer id carried in bits 24..=28 of every identifier.
pub const MXR_ID: u8 = 0x15;
/// Module type carried in bits 16..=23 of every identifier.
pub const MODULE_TYPE: u8 = 0x81;
/// Source address used by the monitoring host when it issues commands.
pub const MONITOR_ADDRESS: u8 = 0xA0;
/// Register whose value is a 32-bit alarm bitmap.
pub const ALARM_REGISTER: u16 = 0x0100;

pub const PAYLOAD_LENGTH: usize = 8;

const ID_HEX_LENGTH: usize = 8;
const PAYLOAD_HEX_LENGTH: usize = PAYLOAD_LENGTH * 2;

/// Length of a cleaned-up hex transcript (identifier followed by payload)
pub const TRANSCRIPT_LENGTH: usize = ID_HEX_LENGTH + PAYLOAD_HEX_LENGTH;

/// Length of a payload rendered as space separated hex bytes
pub const PAYLOAD_DISPLAY_LENGTH: usize = PAYLOAD_LENGTH * 3 - 1;

/// Length of the `ID: 0x........  DATA: ..` display line
pub const DISPLAY_STRING_LENGTH: usize = 6 + ID_HEX_LENGTH + 8 + PAYLOAD_DISPLAY_LENGTH;

pub use command::*;
pub use decode::*;
pub use frame::*;
pub use register::*;

pub use embedded_can::{ExtendedId, Frame, Id};
