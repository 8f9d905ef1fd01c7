use motor_core::{FaultKind, SensorSample};
use motor_io::metrics::{
    init_metrics, record_fault_onset, record_sample, serve_metrics, RECOVERIES,
};
use std::thread;
use tracing::info;

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

/// Regime change seen between two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegimeChange {
    Onset(FaultKind),
    Recovery(FaultKind),
}

/// Follows the published stream and updates the regime metrics.
#[derive(Debug, Default)]
pub struct RegimeTracker {
    active: Option<FaultKind>,
}

impl RegimeTracker {
    pub fn observe(&mut self, sample: &SensorSample) -> Option<RegimeChange> {
        record_sample(sample);

        let change = match (self.active, sample.fault) {
            (None, Some(kind)) => Some(RegimeChange::Onset(kind)),
            (Some(kind), None) => Some(RegimeChange::Recovery(kind)),
            // The generator never switches fault kinds without passing through normal.
            (Some(prev), Some(kind)) if prev != kind => Some(RegimeChange::Onset(kind)),
            _ => None,
        };
        self.active = sample.fault;

        match change {
            Some(RegimeChange::Onset(kind)) => record_fault_onset(kind),
            Some(RegimeChange::Recovery(_)) => RECOVERIES.inc(),
            None => {}
        }
        change
    }
}
