//! Recovery of telemetry frame boundaries from an unstructured stream.

use super::{FRAME_MARKER, TELEMETRY_LEN};

/// Progress of the marker search and payload accumulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum State {
    /// Scanning for the first marker byte.
    SeekMarker1,
    /// First marker byte seen, examining its successor.
    SeekMarker2,
    /// Marker complete, collecting the fixed-length payload.
    Accumulate { buf: [u8; TELEMETRY_LEN], len: usize },
}

/// Recovers complete telemetry payloads from arbitrary chunks of port
/// bytes.
///
/// One instance per connection. Bytes outside a marker/payload sequence
/// are inter-frame noise and dropped without any error: a corrupted or
/// misaligned stretch of stream re-locks on the next valid marker pair,
/// because the scan always restarts at the successor of the byte that
/// broke the match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Resynchronizer {
    state: State,
}

impl Resynchronizer {
    pub const fn new() -> Self {
        Self {
            state: State::SeekMarker1,
        }
    }

    /// Drop any partial progress and restart the marker search.
    pub fn reset(&mut self) {
        self.state = State::SeekMarker1;
    }

    /// Feed one chunk, yielding each payload it completes.
    ///
    /// State persists across calls, so successive chunks from a live
    /// connection may split a frame anywhere, including inside the
    /// marker. The returned iterator is lazy; dropping it early leaves
    /// the remaining chunk bytes unconsumed.
    pub fn feed<'r, 'c>(&'r mut self, chunk: &'c [u8]) -> Feed<'r, 'c> {
        Feed {
            resync: self,
            bytes: chunk.iter(),
        }
    }

    fn push(&mut self, byte: u8) -> Option<[u8; TELEMETRY_LEN]> {
        match &mut self.state {
            State::SeekMarker1 => {
                if byte == FRAME_MARKER[0] {
                    self.state = State::SeekMarker2;
                }
                None
            }
            State::SeekMarker2 => {
                if byte == FRAME_MARKER[1] {
                    self.state = State::Accumulate {
                        buf: [0; TELEMETRY_LEN],
                        len: 0,
                    };
                } else if byte != FRAME_MARKER[0] {
                    // a lone first marker byte is dropped, not reinterpreted
                    self.state = State::SeekMarker1;
                }
                // on another first marker byte, treat it as a fresh candidate
                None
            }
            State::Accumulate { buf, len } => {
                buf[*len] = byte;
                *len += 1;
                if *len == TELEMETRY_LEN {
                    let payload = *buf;
                    self.state = State::SeekMarker1;
                    Some(payload)
                } else {
                    None
                }
            }
        }
    }
}

impl Default for Resynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy iterator over the payloads completed by one chunk.
///
/// See [Resynchronizer::feed].
#[derive(Debug)]
pub struct Feed<'r, 'c> {
    resync: &'r mut Resynchronizer,
    bytes: core::slice::Iter<'c, u8>,
}

impl Iterator for Feed<'_, '_> {
    type Item = [u8; TELEMETRY_LEN];

    fn next(&mut self) -> Option<Self::Item> {
        for &byte in self.bytes.by_ref() {
            if let Some(payload) = self.resync.push(byte) {
                return Some(payload);
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use quickcheck_macros::quickcheck;

    const PAYLOAD: [u8; TELEMETRY_LEN] = [
        0x00, 0x01, 0x02, 0x01, 0x00, 0xe8, 0x03, 0x00, 0x00, 0xd0, 0x07, 0x00, 0x00,
    ];

    fn framed(payload: &[u8; TELEMETRY_LEN]) -> Vec<u8> {
        let mut bytes = FRAME_MARKER.to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn empty_chunk() {
        let mut resync = Resynchronizer::new();
        assert_eq!(resync.feed(b"").count(), 0);
    }

    #[test]
    fn noise_only() {
        let mut resync = Resynchronizer::new();
        assert_eq!(resync.feed(b"hello oven").count(), 0);
        assert_eq!(resync, Resynchronizer::new());
    }

    #[test]
    fn one_frame_exact() {
        let mut resync = Resynchronizer::new();
        let frames: Vec<_> = resync.feed(&framed(&PAYLOAD)).collect();
        assert_eq!(frames, vec![PAYLOAD]);
    }

    #[test]
    fn marker_bytes_inside_noise() {
        // 11 FA 22 FA AF <payload> 33: exactly one frame
        let mut stream = vec![0x11, 0xfa, 0x22];
        stream.extend_from_slice(&framed(&PAYLOAD));
        stream.push(0x33);

        let mut resync = Resynchronizer::new();
        let frames: Vec<_> = resync.feed(&stream).collect();
        assert_eq!(frames, vec![PAYLOAD]);
    }

    #[test]
    fn doubled_first_marker_byte() {
        // FA FA AF: the second FA is a fresh candidate, not noise
        let mut stream = vec![0xfa];
        stream.extend_from_slice(&framed(&PAYLOAD));

        let mut resync = Resynchronizer::new();
        let frames: Vec<_> = resync.feed(&stream).collect();
        assert_eq!(frames, vec![PAYLOAD]);
    }

    #[test]
    fn lone_marker_byte_is_dropped() {
        // FA AF after "FA 00" must not be seen: the 00 reverts the search
        // and the AF alone does not start a frame
        let mut resync = Resynchronizer::new();
        assert_eq!(resync.feed(b"\xfa\x00\xaf").count(), 0);
        assert_eq!(resync, Resynchronizer::new());
    }

    #[test]
    fn frame_split_across_feeds() {
        let stream = framed(&PAYLOAD);
        let mut resync = Resynchronizer::new();
        // split inside the marker, then inside the payload
        assert_eq!(resync.feed(&stream[..1]).count(), 0);
        assert_eq!(resync.feed(&stream[1..7]).count(), 0);
        let frames: Vec<_> = resync.feed(&stream[7..]).collect();
        assert_eq!(frames, vec![PAYLOAD]);
    }

    #[test]
    fn reset_discards_partial_frame() {
        let stream = framed(&PAYLOAD);
        let mut resync = Resynchronizer::new();
        assert_eq!(resync.feed(&stream[..9]).count(), 0);
        resync.reset();
        // the tail of the old frame is now noise
        assert_eq!(resync.feed(&stream[9..]).count(), 0);
        // and a fresh frame still parses
        let frames: Vec<_> = resync.feed(&stream).collect();
        assert_eq!(frames, vec![PAYLOAD]);
    }

    #[test]
    fn back_to_back_frames() {
        let other: [u8; TELEMETRY_LEN] = [0xfa; TELEMETRY_LEN];
        let mut stream = framed(&PAYLOAD);
        stream.extend_from_slice(&framed(&other));

        let mut resync = Resynchronizer::new();
        let frames: Vec<_> = resync.feed(&stream).collect();
        assert_eq!(frames, vec![PAYLOAD, other]);
    }

    #[quickcheck]
    fn chunking_invariance(frames: Vec<Vec<u8>>, noise: Vec<u8>, splits: Vec<usize>) -> bool {
        // fixed-size payloads with arbitrary contents, marker bytes included
        let payloads: Vec<[u8; TELEMETRY_LEN]> = frames
            .iter()
            .map(|frame| {
                let mut payload = [0u8; TELEMETRY_LEN];
                for (slot, byte) in payload.iter_mut().zip(frame.iter()) {
                    *slot = *byte;
                }
                payload
            })
            .collect();

        // interleave noise that cannot contain a first marker byte
        let mut noise = noise.iter().map(|b| b & 0x7f);
        let mut stream = Vec::new();
        for payload in &payloads {
            stream.extend(noise.by_ref().take(3));
            stream.extend_from_slice(&framed(payload));
        }
        stream.extend(noise);

        // reference: the whole stream in one feed
        let mut reference = Resynchronizer::new();
        let expected: Vec<_> = reference.feed(&stream).collect();
        if expected != payloads {
            return false;
        }

        // the same stream in arbitrary chunks
        let mut resync = Resynchronizer::new();
        let mut produced = Vec::new();
        let mut rest = &stream[..];
        for split in splits {
            let cut = split % (rest.len() + 1);
            let (chunk, tail) = rest.split_at(cut);
            produced.extend(resync.feed(chunk));
            rest = tail;
        }
        produced.extend(resync.feed(rest));

        produced == expected
    }
}
