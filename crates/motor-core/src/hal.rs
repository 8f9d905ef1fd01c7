use crate::evolution::{SimulationState, Transition};
use crate::sample::SensorSample;
use chrono::{DateTime, Utc};

/// Result of one simulation tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub tick: u64,
    pub state: SimulationState,
    pub transition: Option<Transition>,
    pub sample: SensorSample,
}

pub trait SampleSource: Send {
    fn tick(&mut self, timestamp: DateTime<Utc>) -> TickOutcome;
}
