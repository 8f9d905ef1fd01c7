//! Fault injection profiles: per-regime walk parameters and onset jumps.

use crate::fault::{FaultKind, MotorState};
use crate::tags::Channel;
use crate::walk::{ChannelRange, WalkStep};

/// Which branch of the synthesizer a tick takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First tick of a freshly entered fault.
    Onset,
    /// Any other tick.
    Steady,
}

/// How one channel evolves during a steady tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelRule {
    Walk(WalkStep),
    /// Keep the previous value untouched.
    Hold,
}

/// How one channel is set on the onset tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OnsetRule {
    /// Jump to a fresh draw from the range.
    Jump(ChannelRange),
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyProfile {
    pub vibration: ChannelRule,
    pub temperature: ChannelRule,
    pub current: ChannelRule,
    pub speed: ChannelRule,
}

impl SteadyProfile {
    pub fn rule(&self, channel: Channel) -> ChannelRule {
        match channel {
            Channel::Vibration => self.vibration,
            Channel::Temperature => self.temperature,
            Channel::Current => self.current,
            Channel::Speed => self.speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnsetProfile {
    pub vibration: OnsetRule,
    pub temperature: OnsetRule,
    pub current: OnsetRule,
    pub speed: OnsetRule,
}

impl OnsetProfile {
    pub fn rule(&self, channel: Channel) -> OnsetRule {
        match channel {
            Channel::Vibration => self.vibration,
            Channel::Temperature => self.temperature,
            Channel::Current => self.current,
            Channel::Speed => self.speed,
        }
    }
}

const fn walk(magnitude: f64, min: f64, max: f64) -> ChannelRule {
    ChannelRule::Walk(WalkStep::new(magnitude, min, max))
}

const fn jump(min: f64, max: f64) -> OnsetRule {
    OnsetRule::Jump(ChannelRange::new(min, max))
}

pub const NORMAL: SteadyProfile = SteadyProfile {
    vibration: walk(0.05, 0.1, 0.6),
    temperature: walk(0.5, 45.0, 65.0),
    current: walk(0.3, 6.0, 10.0),
    speed: walk(2.0, 1470.0, 1500.0),
};

pub const fn steady_profile(state: MotorState) -> SteadyProfile {
    match state {
        MotorState::Normal => NORMAL,
        MotorState::Faulted(FaultKind::PalierDefaillant) => SteadyProfile {
            vibration: walk(0.1, 1.5, 4.0),
            temperature: walk(0.5, 45.0, 90.0),
            current: walk(0.3, 6.0, 15.0),
            speed: ChannelRule::Hold,
        },
        MotorState::Faulted(FaultKind::FreinBloque) => SteadyProfile {
            vibration: walk(0.1, 0.5, 2.0),
            temperature: walk(1.0, 60.0, 100.0),
            current: walk(0.5, 6.0, 20.0),
            speed: walk(5.0, 1000.0, 1400.0),
        },
        MotorState::Faulted(FaultKind::SurchauffeStator) => SteadyProfile {
            vibration: walk(0.05, 0.2, 1.5),
            temperature: walk(1.0, 80.0, 120.0),
            current: walk(0.4, 8.0, 20.0),
            speed: walk(2.0, 1350.0, 1480.0),
        },
        MotorState::Faulted(FaultKind::GrippageMecanique) => SteadyProfile {
            vibration: walk(0.15, 1.0, 4.0),
            temperature: walk(0.8, 60.0, 110.0),
            current: walk(0.5, 6.0, 18.0),
            speed: walk(3.0, 1200.0, 1450.0),
        },
    }
}

pub const fn onset_profile(kind: FaultKind) -> OnsetProfile {
    match kind {
        FaultKind::PalierDefaillant => OnsetProfile {
            vibration: jump(2.5, 3.5),
            temperature: jump(70.0, 85.0),
            current: jump(10.0, 14.0),
            speed: OnsetRule::Hold,
        },
        FaultKind::FreinBloque => OnsetProfile {
            vibration: jump(1.0, 1.8),
            temperature: jump(80.0, 100.0),
            current: jump(12.0, 18.0),
            speed: jump(1100.0, 1300.0),
        },
        FaultKind::SurchauffeStator => OnsetProfile {
            vibration: jump(0.6, 1.0),
            temperature: jump(95.0, 110.0),
            current: jump(12.0, 18.0),
            speed: jump(1350.0, 1450.0),
        },
        FaultKind::GrippageMecanique => OnsetProfile {
            vibration: jump(2.5, 3.8),
            temperature: jump(80.0, 100.0),
            current: jump(10.0, 15.0),
            speed: jump(1200.0, 1350.0),
        },
    }
}

/// Range every value emitted for `channel` in this cell of the table must
/// fall in.
///
/// Held channels keep the value of the last normal tick, since every fault
/// is entered from `Normal`.
pub fn declared_range(state: MotorState, phase: Phase, channel: Channel) -> ChannelRange {
    let held = || match NORMAL.rule(channel) {
        ChannelRule::Walk(step) => step.range,
        ChannelRule::Hold => unreachable!("normal profile walks every channel"),
    };

    match (state, phase) {
        (MotorState::Faulted(kind), Phase::Onset) => match onset_profile(kind).rule(channel) {
            OnsetRule::Jump(range) => range,
            OnsetRule::Hold => held(),
        },
        _ => match steady_profile(state).rule(channel) {
            ChannelRule::Walk(step) => step.range,
            ChannelRule::Hold => held(),
        },
    }
}
