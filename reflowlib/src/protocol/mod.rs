//! Wire protocol for the oven control link.

/// Two-byte marker that precedes every frame, in either direction.
pub const FRAME_MARKER: [u8; 2] = [0xfa, 0xaf];

/// Fixed length of the telemetry payload that follows an inbound marker.
///
/// Telemetry carries no type byte: the only frame shape the oven sends
/// is identified by position after the marker alone.
pub const TELEMETRY_LEN: usize = 13;

pub const BAUD_RATE: u32 = 115200;

mod messages;
pub use messages::*;

pub mod parse;
pub use parse::{parse_command, MessageParse};

pub mod resync;
pub use resync::Resynchronizer;

pub mod serialize;
pub use serialize::MessageSerialize;
