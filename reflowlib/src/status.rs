//! Last-reported controller state.

use crate::protocol::{Mode, RunMode, Stage, Telemetry};

/// The mode, run mode, stage, and output flags last reported by the
/// oven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OvenStatus {
    pub mode: Mode,
    pub run_mode: RunMode,
    pub stage: Stage,
    pub fan_on: bool,
    pub lamp_on: bool,
}

impl From<&Telemetry> for OvenStatus {
    fn from(frame: &Telemetry) -> Self {
        Self {
            mode: frame.mode,
            run_mode: frame.run_mode,
            stage: frame.stage,
            fan_on: frame.fan_on,
            lamp_on: frame.lamp_on,
        }
    }
}

/// Latch of the most recent [OvenStatus].
///
/// The oven is authoritative: every reported state is accepted as-is,
/// with no client-side opinion about which transitions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusLatch {
    current: Option<OvenStatus>,
}

impl StatusLatch {
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Overwrite the latch with a newly decoded frame.
    pub fn update(&mut self, frame: &Telemetry) {
        self.current = Some(frame.into());
    }

    /// Last-reported status, or [None] before the first frame arrives.
    pub fn current(&self) -> Option<OvenStatus> {
        self.current
    }
}
