//! Operating regimes and fault kinds of the simulated motor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named failure modes the motor can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Bearing failure.
    PalierDefaillant,
    /// Brake locked on.
    FreinBloque,
    /// Stator overheating.
    SurchauffeStator,
    /// Mechanical seizure.
    GrippageMecanique,
}

impl FaultKind {
    pub const ALL: [FaultKind; 4] = [
        FaultKind::PalierDefaillant,
        FaultKind::FreinBloque,
        FaultKind::SurchauffeStator,
        FaultKind::GrippageMecanique,
    ];

    /// Identifier used on the wire and in the store.
    pub const fn as_str(self) -> &'static str {
        match self {
            FaultKind::PalierDefaillant => "palier_defaillant",
            FaultKind::FreinBloque => "frein_bloque",
            FaultKind::SurchauffeStator => "surchauffe_stator",
            FaultKind::GrippageMecanique => "grippage_mecanique",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level operating mode as reported in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Regime {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "anormal")]
    Faulted,
}

impl Regime {
    pub const fn as_str(self) -> &'static str {
        match self {
            Regime::Normal => "normal",
            Regime::Faulted => "anormal",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regime together with the fault it carries. A fault exists only while faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotorState {
    #[default]
    Normal,
    Faulted(FaultKind),
}

impl MotorState {
    pub const fn regime(self) -> Regime {
        match self {
            MotorState::Normal => Regime::Normal,
            MotorState::Faulted(_) => Regime::Faulted,
        }
    }

    pub const fn active_fault(self) -> Option<FaultKind> {
        match self {
            MotorState::Normal => None,
            MotorState::Faulted(kind) => Some(kind),
        }
    }
}
