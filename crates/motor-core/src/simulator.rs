use crate::evolution::{advance, EvolutionPolicy, SimulationState, Transition};
use crate::hal::{SampleSource, TickOutcome};
use crate::random::RandomSource;
use crate::sample::ChannelState;
use crate::synth::synthesize;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Simulated motor: state machine plus channel history and its random source.
#[derive(Debug, Clone)]
pub struct MotorSimulator<R> {
    state: SimulationState,
    channels: ChannelState,
    policy: EvolutionPolicy,
    rng: R,
    ticks: u64,
}

impl MotorSimulator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: RandomSource> MotorSimulator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            state: SimulationState::new(),
            channels: ChannelState::default(),
            policy: EvolutionPolicy::default(),
            rng,
            ticks: 0,
        }
    }

    pub fn with_policy(mut self, policy: EvolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Evolve the state, then synthesize the reading for the new state.
    pub fn step(&mut self, timestamp: DateTime<Utc>) -> TickOutcome {
        let (state, transition) = advance(self.state, &self.policy, &mut self.rng);
        let (sample, channels) = synthesize(&state, self.channels, timestamp, &mut self.rng);
        self.state = state;
        self.channels = channels;
        self.ticks += 1;
        TickOutcome {
            tick: self.ticks,
            state,
            transition,
            sample,
        }
    }
}

impl<R: RandomSource + Send> SampleSource for MotorSimulator<R> {
    fn tick(&mut self, timestamp: DateTime<Utc>) -> TickOutcome {
        self.step(timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FaultKind, Regime};

    #[test]
    fn identical_seeds_produce_identical_streams() {
        let now = Utc::now();
        let mut a = MotorSimulator::seeded(17);
        let mut b = MotorSimulator::seeded(17);
        for _ in 0..300 {
            assert_eq!(a.step(now).sample, b.step(now).sample);
        }
    }

    #[test]
    fn first_tick_is_normal_walk() {
        let mut sim = MotorSimulator::seeded(1);
        let outcome = sim.step(Utc::now());
        assert_eq!(outcome.tick, 1);
        assert_eq!(outcome.sample.regime, Regime::Normal);
        assert_eq!(outcome.state.cycles_in_regime, 1);
        assert!((outcome.sample.speed - 1480.0).abs() <= 2.0);
    }

    #[test]
    fn custom_policy_drives_the_regime() {
        let policy = EvolutionPolicy {
            fault_gate_cycles: 0,
            fault_probability: 1.0,
            fault_weights: [0, 0, 1, 0],
            recovery_min_cycles: 2,
            recovery_max_cycles: 2,
        };
        let mut sim = MotorSimulator::seeded(8).with_policy(policy);
        let now = Utc::now();

        let onset = sim.step(now);
        assert_eq!(
            onset.transition,
            Some(Transition::FaultOnset(FaultKind::SurchauffeStator))
        );
        assert_eq!(onset.sample.regime, Regime::Faulted);

        // Counter reaches 1, then 2, and recovers once it exceeds 2.
        assert_eq!(sim.step(now).transition, None);
        assert_eq!(sim.step(now).transition, None);
        let recovered = sim.step(now);
        assert_eq!(
            recovered.transition,
            Some(Transition::Recovered(FaultKind::SurchauffeStator))
        );
        assert_eq!(recovered.sample.regime, Regime::Normal);
        assert_eq!(sim.state().regime(), Regime::Normal);
    }

    #[test]
    fn eventually_faults_and_recovers() {
        let mut sim = MotorSimulator::seeded(4242);
        let now = Utc::now();
        let mut onsets = 0;
        let mut recoveries = 0;
        for _ in 0..5_000 {
            match sim.step(now).transition {
                Some(Transition::FaultOnset(_)) => onsets += 1,
                Some(Transition::Recovered(_)) => recoveries += 1,
                None => {}
            }
        }
        assert!(onsets > 0);
        assert!(recoveries > 0);
        assert!(onsets - recoveries <= 1);
    }
}
