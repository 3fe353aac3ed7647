//! Message types used on the oven control link.

use nom::{error::Error, Parser};

use super::parse::MessageParse;
use super::serialize::{MessageSerialize, Serializer};
use super::TELEMETRY_LEN;

/// A trait for command messages with statically-known type bytes.
pub trait MessageType {
    const TYPE: u8;
}

/// Operating mode reported by the oven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Standby,
    Heating,
    Holding,
    Cooling,
    /// A wire value outside the defined set, preserved as-is.
    Unknown(u8),
}

impl Mode {
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => Self::Standby,
            1 => Self::Heating,
            2 => Self::Holding,
            3 => Self::Cooling,
            other => Self::Unknown(other),
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            Self::Standby => 0,
            Self::Heating => 1,
            Self::Holding => 2,
            Self::Cooling => 3,
            Self::Unknown(other) => other,
        }
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Standby => write!(f, "Standby"),
            Self::Heating => write!(f, "Heating"),
            Self::Holding => write!(f, "Holding"),
            Self::Cooling => write!(f, "Cooling"),
            Self::Unknown(other) => write!(f, "Unknown ({:#04x})", other),
        }
    }
}

/// Run mode reported by the oven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunMode {
    Off,
    Profile,
    Hold,
    /// A wire value outside the defined set, preserved as-is.
    Unknown(u8),
}

impl RunMode {
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => Self::Off,
            1 => Self::Profile,
            2 => Self::Hold,
            other => Self::Unknown(other),
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Profile => 1,
            Self::Hold => 2,
            Self::Unknown(other) => other,
        }
    }
}

impl core::fmt::Display for RunMode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Off => write!(f, "Off/Standby"),
            Self::Profile => write!(f, "Reflow Profile"),
            Self::Hold => write!(f, "Preheat/Hold"),
            Self::Unknown(other) => write!(f, "Unknown ({:#04x})", other),
        }
    }
}

/// Profile stage reported by the oven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    Standby,
    SoakRamp,
    SoakHold,
    PeakRamp,
    PeakHold,
    Cool,
    /// A wire value outside the defined set, preserved as-is.
    Unknown(u8),
}

impl Stage {
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => Self::Standby,
            1 => Self::SoakRamp,
            2 => Self::SoakHold,
            3 => Self::PeakRamp,
            4 => Self::PeakHold,
            5 => Self::Cool,
            other => Self::Unknown(other),
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            Self::Standby => 0,
            Self::SoakRamp => 1,
            Self::SoakHold => 2,
            Self::PeakRamp => 3,
            Self::PeakHold => 4,
            Self::Cool => 5,
            Self::Unknown(other) => other,
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Standby => write!(f, "Standby"),
            Self::SoakRamp => write!(f, "Ramp to Soak"),
            Self::SoakHold => write!(f, "Soak"),
            Self::PeakRamp => write!(f, "Ramp to Peak"),
            Self::PeakHold => write!(f, "Peak Hold"),
            Self::Cool => write!(f, "Cooling"),
            Self::Unknown(other) => write!(f, "Unknown ({:#04x})", other),
        }
    }
}

/// Status frame sent by the oven, the only inbound frame shape.
///
/// Temperatures are transmitted in hundredths of a degree Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    pub mode: Mode,
    pub run_mode: RunMode,
    pub stage: Stage,
    pub fan_on: bool,
    pub lamp_on: bool,
    /// First probe, 1/100 °C.
    pub temp1: u32,
    /// Second probe, 1/100 °C.
    pub temp2: u32,
}

impl Telemetry {
    pub fn temp1_celsius(&self) -> f64 {
        f64::from(self.temp1) / 100.0
    }

    pub fn temp2_celsius(&self) -> f64 {
        f64::from(self.temp2) / 100.0
    }

    /// Average of the two probes in °C, the value the rolling display plots.
    pub fn average_celsius(&self) -> f64 {
        (self.temp1_celsius() + self.temp2_celsius()) / 2.0
    }

    /// Decode one complete payload as recovered by the resynchronizer.
    ///
    /// Total over any 13 bytes: out-of-range enum bytes surface as
    /// `Unknown`, never as a decode failure or a silent default.
    pub fn decode(payload: &[u8; TELEMETRY_LEN]) -> Self {
        Self {
            mode: Mode::from_wire(payload[0]),
            run_mode: RunMode::from_wire(payload[1]),
            stage: Stage::from_wire(payload[2]),
            fan_on: payload[3] != 0,
            lamp_on: payload[4] != 0,
            temp1: u32::from_le_bytes([payload[5], payload[6], payload[7], payload[8]]),
            temp2: u32::from_le_bytes([payload[9], payload[10], payload[11], payload[12]]),
        }
    }
}

impl MessageSerialize for Telemetry {
    fn frame_type(&self) -> Option<u8> {
        None
    }

    fn message_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_u8(self.mode.to_wire())?;
        ser.write_u8(self.run_mode.to_wire())?;
        ser.write_u8(self.stage.to_wire())?;
        ser.write_u8(self.fan_on as u8)?;
        ser.write_u8(self.lamp_on as u8)?;
        ser.write_le_u32(self.temp1)?;
        ser.write_le_u32(self.temp2)
    }
}

/// Reflow profile parameters, as carried by [SetProfile].
///
/// Times are whole seconds, temperatures whole °C. Unlike telemetry,
/// there is no fractional scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReflowProfile {
    pub soak_time: u16,
    pub soak_temp: u16,
    pub peak_time: u16,
    pub peak_temp: u16,
}

/// Type 1, host command: change the operating and run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetMode {
    pub mode: Mode,
    pub run_mode: RunMode,
}

impl MessageType for SetMode {
    const TYPE: u8 = 1;
}

impl MessageSerialize for SetMode {
    fn frame_type(&self) -> Option<u8> {
        Some(Self::TYPE)
    }

    fn message_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_u8(self.mode.to_wire())?;
        ser.write_u8(self.run_mode.to_wire())
    }
}

impl MessageParse for SetMode {
    fn body_len(typ: u8) -> Option<usize> {
        (typ == Self::TYPE).then_some(2)
    }

    fn parse_body<'a>(typ: u8) -> impl Parser<&'a [u8], Self, Error<&'a [u8]>> {
        move |input| {
            let input = if typ != Self::TYPE {
                nom::combinator::fail::<_, (), _>(input)?.0
            } else {
                input
            };

            let (input, mode) = nom::number::complete::u8(input)?;
            let (input, run_mode) = nom::number::complete::u8(input)?;
            Ok((
                input,
                SetMode {
                    mode: Mode::from_wire(mode),
                    run_mode: RunMode::from_wire(run_mode),
                },
            ))
        }
    }
}

/// Type 2, host command: upload a reflow profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetProfile {
    pub profile: ReflowProfile,
}

impl MessageType for SetProfile {
    const TYPE: u8 = 2;
}

impl MessageSerialize for SetProfile {
    fn frame_type(&self) -> Option<u8> {
        Some(Self::TYPE)
    }

    fn message_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_le_u16(self.profile.soak_time)?;
        ser.write_le_u16(self.profile.soak_temp)?;
        ser.write_le_u16(self.profile.peak_time)?;
        ser.write_le_u16(self.profile.peak_temp)
    }
}

impl MessageParse for SetProfile {
    fn body_len(typ: u8) -> Option<usize> {
        (typ == Self::TYPE).then_some(8)
    }

    fn parse_body<'a>(typ: u8) -> impl Parser<&'a [u8], Self, Error<&'a [u8]>> {
        move |input| {
            let input = if typ != Self::TYPE {
                nom::combinator::fail::<_, (), _>(input)?.0
            } else {
                input
            };

            let (input, soak_time) = nom::number::complete::le_u16(input)?;
            let (input, soak_temp) = nom::number::complete::le_u16(input)?;
            let (input, peak_time) = nom::number::complete::le_u16(input)?;
            let (input, peak_temp) = nom::number::complete::le_u16(input)?;
            Ok((
                input,
                SetProfile {
                    profile: ReflowProfile {
                        soak_time,
                        soak_temp,
                        peak_time,
                        peak_temp,
                    },
                },
            ))
        }
    }
}

/// Any command sent from the host computer to the oven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostMessage {
    /// Type 1, change operating and run mode.
    SetMode(SetMode),
    /// Type 2, upload a reflow profile.
    SetProfile(SetProfile),
}

impl MessageSerialize for HostMessage {
    fn frame_type(&self) -> Option<u8> {
        match self {
            Self::SetMode(m) => m.frame_type(),
            Self::SetProfile(m) => m.frame_type(),
        }
    }

    fn message_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::SetMode(m) => m.message_body(ser),
            Self::SetProfile(m) => m.message_body(ser),
        }
    }
}

impl MessageParse for HostMessage {
    fn body_len(typ: u8) -> Option<usize> {
        SetMode::body_len(typ).or(SetProfile::body_len(typ))
    }

    fn parse_body<'a>(typ: u8) -> impl Parser<&'a [u8], Self, Error<&'a [u8]>> {
        move |input| match typ {
            SetMode::TYPE => SetMode::parse_body(typ).map(Self::SetMode).parse(input),
            SetProfile::TYPE => SetProfile::parse_body(typ)
                .map(Self::SetProfile)
                .parse(input),

            // we don't recognize the type byte
            _ => nom::combinator::fail(input),
        }
    }
}

#[cfg(test)]
#[cfg(feature = "alloc")]
mod test {
    use super::super::parse::parse_command;
    use super::super::serialize::SerializerVec;
    use super::*;

    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    pub(crate) fn encode<M>(msg: &M) -> alloc::vec::Vec<u8>
    where
        M: MessageSerialize,
    {
        let mut ser = SerializerVec::new();
        msg.frame(&mut ser).unwrap();
        ser.done()
    }

    fn command_roundtrip(msg: HostMessage) -> bool {
        let bytes = encode(&msg);
        parse_command(&bytes) == (bytes.len(), Some(msg))
    }

    impl Arbitrary for Mode {
        fn arbitrary(g: &mut Gen) -> Self {
            Mode::from_wire(u8::arbitrary(g))
        }
    }

    impl Arbitrary for RunMode {
        fn arbitrary(g: &mut Gen) -> Self {
            RunMode::from_wire(u8::arbitrary(g))
        }
    }

    impl Arbitrary for Stage {
        fn arbitrary(g: &mut Gen) -> Self {
            Stage::from_wire(u8::arbitrary(g))
        }
    }

    impl Arbitrary for Telemetry {
        fn arbitrary(g: &mut Gen) -> Self {
            Self {
                mode: Mode::arbitrary(g),
                run_mode: RunMode::arbitrary(g),
                stage: Stage::arbitrary(g),
                fan_on: bool::arbitrary(g),
                lamp_on: bool::arbitrary(g),
                temp1: u32::arbitrary(g),
                temp2: u32::arbitrary(g),
            }
        }
    }

    impl Arbitrary for ReflowProfile {
        fn arbitrary(g: &mut Gen) -> Self {
            Self {
                soak_time: u16::arbitrary(g),
                soak_temp: u16::arbitrary(g),
                peak_time: u16::arbitrary(g),
                peak_temp: u16::arbitrary(g),
            }
        }
    }

    impl Arbitrary for SetMode {
        fn arbitrary(g: &mut Gen) -> Self {
            Self {
                mode: Mode::arbitrary(g),
                run_mode: RunMode::arbitrary(g),
            }
        }
    }

    impl Arbitrary for SetProfile {
        fn arbitrary(g: &mut Gen) -> Self {
            Self {
                profile: ReflowProfile::arbitrary(g),
            }
        }
    }

    #[quickcheck]
    fn roundtrip_set_mode(msg: SetMode) -> bool {
        command_roundtrip(HostMessage::SetMode(msg))
    }

    #[quickcheck]
    fn roundtrip_set_profile(msg: SetProfile) -> bool {
        command_roundtrip(HostMessage::SetProfile(msg))
    }

    #[quickcheck]
    fn roundtrip_telemetry(msg: Telemetry) -> bool {
        let bytes = encode(&msg);
        let mut payload = [0u8; TELEMETRY_LEN];
        payload.copy_from_slice(&bytes[2..]);
        bytes.len() == 2 + TELEMETRY_LEN && Telemetry::decode(&payload) == msg
    }

    #[quickcheck]
    fn enum_wire_values_canonical(value: u8) -> bool {
        Mode::from_wire(value).to_wire() == value
            && RunMode::from_wire(value).to_wire() == value
            && Stage::from_wire(value).to_wire() == value
    }

    #[test]
    fn encode_set_mode_heating_profile() {
        let msg = SetMode {
            mode: Mode::Heating,
            run_mode: RunMode::Profile,
        };
        assert_eq!(encode(&msg), b"\xfa\xaf\x01\x01\x01");
    }

    #[test]
    fn encode_set_profile_field_order() {
        let msg = SetProfile {
            profile: ReflowProfile {
                soak_time: 90,
                soak_temp: 150,
                peak_time: 30,
                peak_temp: 230,
            },
        };
        assert_eq!(
            encode(&msg),
            b"\xfa\xaf\x02\x5a\x00\x96\x00\x1e\x00\xe6\x00"
        );
    }

    #[test]
    fn decode_telemetry_example() {
        let payload = [
            0x00, 0x01, 0x02, 0x01, 0x00, 0xe8, 0x03, 0x00, 0x00, 0xd0, 0x07, 0x00, 0x00,
        ];
        let frame = Telemetry::decode(&payload);
        assert_eq!(frame.mode, Mode::Standby);
        assert_eq!(frame.run_mode, RunMode::Profile);
        assert_eq!(frame.stage, Stage::SoakHold);
        assert!(frame.fan_on);
        assert!(!frame.lamp_on);
        assert_eq!(frame.temp1, 1000);
        assert_eq!(frame.temp2, 2000);
        assert_eq!(frame.temp1_celsius(), 10.0);
        assert_eq!(frame.temp2_celsius(), 20.0);
        assert_eq!(frame.average_celsius(), 15.0);
    }

    #[test]
    fn decode_telemetry_out_of_range_enums() {
        let payload = [
            0x07, 0xff, 0x20, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let frame = Telemetry::decode(&payload);
        assert_eq!(frame.mode, Mode::Unknown(0x07));
        assert_eq!(frame.run_mode, RunMode::Unknown(0xff));
        assert_eq!(frame.stage, Stage::Unknown(0x20));
        // any nonzero byte reads as true
        assert!(frame.lamp_on);
        assert!(!frame.fan_on);
    }
}
