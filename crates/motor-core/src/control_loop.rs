use crate::evolution::Transition;
use crate::hal::SampleSource;
use crate::sample::SensorSample;
use crate::timebase::TimeBase;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct LoopConfig {
    pub tick_interval: Duration,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// A tick starting later than this past its deadline counts as missed.
    pub overrun_tolerance: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            max_ticks: None,
            overrun_tolerance: Duration::from_millis(50),
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct ExecutionStats {
    pub ticks_executed: u64,
    pub ticks_missed: u64,
    pub fault_onsets: u64,
    pub recoveries: u64,
    pub max_lateness_us: u64,
}

/// Why [`TickLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StopRequested,
    TickLimit,
    ConsumerGone,
}

pub struct TickLoop<S: SampleSource> {
    source: S,
    config: LoopConfig,
    sink: Sender<SensorSample>,
    stats: ExecutionStats,
    timebase: TimeBase,
}

impl<S: SampleSource> TickLoop<S> {
    pub fn new(
        source: S,
        config: LoopConfig,
        sink: Sender<SensorSample>,
        timebase: TimeBase,
    ) -> Self {
        Self {
            source,
            config,
            sink,
            stats: ExecutionStats::default(),
            timebase,
        }
    }

    pub fn run(&mut self, stop: &AtomicBool) -> StopReason {
        let mut next_tick = Instant::now();

        loop {
            if let Some(limit) = self.config.max_ticks {
                if self.stats.ticks_executed >= limit {
                    return StopReason::TickLimit;
                }
            }

            // Sleep in short slices so a stop request is honoured promptly.
            loop {
                if stop.load(Ordering::Relaxed) {
                    return StopReason::StopRequested;
                }
                let now = Instant::now();
                if now >= next_tick {
                    break;
                }
                std::thread::sleep((next_tick - now).min(Duration::from_millis(20)));
            }

            let lateness = Instant::now().duration_since(next_tick);
            if lateness > self.config.overrun_tolerance {
                self.stats.ticks_missed += 1;
                warn!(
                    "tick {} started {}ms late",
                    self.stats.ticks_executed + 1,
                    lateness.as_millis()
                );
            }
            self.stats.max_lateness_us = self.stats.max_lateness_us.max(lateness.as_micros() as u64);

            let outcome = self.source.tick(self.timebase.wall_clock());
            self.stats.ticks_executed += 1;

            match outcome.transition {
                Some(Transition::FaultOnset(kind)) => {
                    self.stats.fault_onsets += 1;
                    info!("tick {}: fault onset {}", outcome.tick, kind);
                }
                Some(Transition::Recovered(kind)) => {
                    self.stats.recoveries += 1;
                    info!("tick {}: recovered from {}", outcome.tick, kind);
                }
                None => {}
            }
            debug!(
                "tick {} at {}us: {} cycles in regime",
                outcome.tick,
                self.timebase.now_us(),
                outcome.state.cycles_in_regime
            );

            if self.sink.send(outcome.sample).is_err() {
                warn!("sample consumer hung up, stopping tick loop");
                return StopReason::ConsumerGone;
            }

            next_tick += self.config.tick_interval;
        }
    }

    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::MotorSimulator;
    use std::sync::mpsc;

    fn fast_config(max_ticks: u64) -> LoopConfig {
        LoopConfig {
            tick_interval: Duration::ZERO,
            max_ticks: Some(max_ticks),
            overrun_tolerance: Duration::from_secs(60),
        }
    }

    #[test]
    fn emits_one_sample_per_tick_until_limit() {
        let (tx, rx) = mpsc::channel();
        let stop = AtomicBool::new(false);
        let mut tick_loop = TickLoop::new(
            MotorSimulator::seeded(3),
            fast_config(250),
            tx,
            TimeBase::new(),
        );

        assert_eq!(tick_loop.run(&stop), StopReason::TickLimit);
        assert_eq!(tick_loop.stats().ticks_executed, 250);
        let samples: Vec<SensorSample> = rx.try_iter().collect();
        assert_eq!(samples.len(), 250);
        let last = samples.last().unwrap();
        assert_eq!(tick_loop.source().state().regime(), last.regime);
        assert_eq!(tick_loop.source().state().active_fault(), last.fault);
    }

    #[test]
    fn counts_transitions() {
        let (tx, rx) = mpsc::channel();
        let stop = AtomicBool::new(false);
        let mut tick_loop = TickLoop::new(
            MotorSimulator::seeded(77),
            fast_config(3_000),
            tx,
            TimeBase::new(),
        );
        tick_loop.run(&stop);

        let samples: Vec<SensorSample> = rx.try_iter().collect();
        let onsets = samples
            .windows(2)
            .filter(|w| w[0].fault.is_none() && w[1].fault.is_some())
            .count() as u64;
        assert!(tick_loop.stats().fault_onsets > 0);
        assert_eq!(tick_loop.stats().fault_onsets, onsets);
    }

    #[test]
    fn stops_when_consumer_hangs_up() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let stop = AtomicBool::new(false);
        let mut tick_loop = TickLoop::new(
            MotorSimulator::seeded(1),
            fast_config(10),
            tx,
            TimeBase::new(),
        );
        assert_eq!(tick_loop.run(&stop), StopReason::ConsumerGone);
        assert_eq!(tick_loop.stats().ticks_executed, 1);
    }

    #[test]
    fn honours_stop_flag() {
        let (tx, _rx) = mpsc::channel();
        let stop = AtomicBool::new(true);
        let mut tick_loop = TickLoop::new(
            MotorSimulator::seeded(1),
            LoopConfig::default(),
            tx,
            TimeBase::new(),
        );
        assert_eq!(tick_loop.run(&stop), StopReason::StopRequested);
        assert_eq!(tick_loop.stats().ticks_executed, 0);
    }
}
