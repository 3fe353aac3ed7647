use nom::error::Error;
use nom::Parser;

use super::{HostMessage, FRAME_MARKER};

/// A trait for parseable command messages.
pub trait MessageParse: Sized {
    /// Expected body length for a type byte, if the type is known.
    fn body_len(typ: u8) -> Option<usize>;

    /// Parse the body of a message, given the frame type byte.
    fn parse_body<'a>(typ: u8) -> impl Parser<&'a [u8], Self, Error<&'a [u8]>>;
}

/// Scan a buffer for one complete framed host command.
///
/// Returns the number of bytes that may be discarded from the front of
/// the buffer, and the command if one was completed. Consumed bytes
/// never include the start of a possible partial frame, so the caller
/// can drain them and keep reading into the remainder.
///
/// A marker followed by an unrecognized type byte is a false start:
/// scanning resumes one byte past the offending marker, so a corrupted
/// frame costs at most its own length before the stream re-locks.
pub fn parse_command(input: &[u8]) -> (usize, Option<HostMessage>) {
    let mut search = 0;

    loop {
        // find the next candidate marker
        let Some(found) = input[search..].iter().position(|&b| b == FRAME_MARKER[0]) else {
            // no first marker byte anywhere, everything is noise
            return (input.len(), None);
        };
        let start = search + found;

        let Some(&second) = input.get(start + 1) else {
            // a first marker byte at the very end, wait for its successor
            return (start, None);
        };
        if second != FRAME_MARKER[1] {
            // not a marker pair. The successor may itself start one.
            search = start + 1;
            continue;
        }

        let Some(&typ) = input.get(start + 2) else {
            return (start, None);
        };
        let Some(body_len) = HostMessage::body_len(typ) else {
            search = start + 1;
            continue;
        };

        let body_start = start + 3;
        let Some(body) = input.get(body_start..body_start + body_len) else {
            // frame started but the body is still in flight
            return (start, None);
        };

        match HostMessage::parse_body(typ).parse(body) {
            Ok((_, msg)) => return (body_start + body_len, Some(msg)),
            Err(_) => {
                search = start + 1;
                continue;
            }
        }
    }
}
