//! State evolution policy: when the motor falls into a fault and when it
//! recovers.

use crate::fault::{FaultKind, MotorState, Regime};
use crate::profile::Phase;
use crate::random::RandomSource;

#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionPolicy {
    /// Cycles in `Normal` that must be exceeded before a fault can start.
    pub fault_gate_cycles: u64,
    /// Per-tick chance of entering a fault once the gate is open.
    pub fault_probability: f64,
    /// Relative weights, in `FaultKind::ALL` order.
    pub fault_weights: [u32; 4],
    /// Inclusive bounds of the recovery threshold re-drawn on every faulted tick.
    pub recovery_min_cycles: u64,
    pub recovery_max_cycles: u64,
}

impl Default for EvolutionPolicy {
    fn default() -> Self {
        Self {
            fault_gate_cycles: 40,
            fault_probability: 0.4,
            fault_weights: [3, 2, 2, 3],
            recovery_min_cycles: 60,
            recovery_max_cycles: 125,
        }
    }
}

impl EvolutionPolicy {
    pub fn choose_fault<R: RandomSource + ?Sized>(&self, rng: &mut R) -> FaultKind {
        let idx = rng.weighted(&self.fault_weights);
        FaultKind::ALL[idx.min(FaultKind::ALL.len() - 1)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    FaultOnset(FaultKind),
    Recovered(FaultKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulationState {
    pub motor: MotorState,
    pub cycles_in_regime: u64,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regime(&self) -> Regime {
        self.motor.regime()
    }

    pub fn active_fault(&self) -> Option<FaultKind> {
        self.motor.active_fault()
    }

    /// Onset while on the tick that entered the current fault.
    ///
    /// The counter is incremented before the transition check, so a faulted
    /// state only ever shows zero cycles on its entry tick.
    pub fn phase(&self) -> Phase {
        match self.motor {
            MotorState::Faulted(_) if self.cycles_in_regime == 0 => Phase::Onset,
            _ => Phase::Steady,
        }
    }
}

/// Advance the state by one tick.
pub fn advance<R: RandomSource + ?Sized>(
    state: SimulationState,
    policy: &EvolutionPolicy,
    rng: &mut R,
) -> (SimulationState, Option<Transition>) {
    let cycles = state.cycles_in_regime + 1;

    match state.motor {
        MotorState::Normal => {
            if cycles > policy.fault_gate_cycles && rng.unit() < policy.fault_probability {
                let kind = policy.choose_fault(rng);
                let next = SimulationState {
                    motor: MotorState::Faulted(kind),
                    cycles_in_regime: 0,
                };
                return (next, Some(Transition::FaultOnset(kind)));
            }
        }
        MotorState::Faulted(kind) => {
            let threshold = rng.integer(policy.recovery_min_cycles, policy.recovery_max_cycles);
            if cycles > threshold {
                let next = SimulationState {
                    motor: MotorState::Normal,
                    cycles_in_regime: 0,
                };
                return (next, Some(Transition::Recovered(kind)));
            }
        }
    }

    let next = SimulationState {
        motor: state.motor,
        cycles_in_regime: cycles,
    };
    (next, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Scripted draws: fixed gate value, fixed fault index, fixed threshold.
    struct Scripted {
        gate: f64,
        fault_idx: usize,
        threshold: u64,
    }

    impl RandomSource for Scripted {
        fn unit(&mut self) -> f64 {
            self.gate
        }

        fn uniform(&mut self, low: f64, _high: f64) -> f64 {
            low
        }

        fn integer(&mut self, _low: u64, _high: u64) -> u64 {
            self.threshold
        }

        fn weighted(&mut self, _weights: &[u32]) -> usize {
            self.fault_idx
        }
    }

    fn always_fault() -> Scripted {
        Scripted {
            gate: 0.0,
            fault_idx: 1,
            threshold: 60,
        }
    }

    #[test]
    fn gate_holds_until_tick_41() {
        let policy = EvolutionPolicy::default();
        let mut rng = always_fault();
        let mut state = SimulationState::new();

        for tick in 1..=40 {
            let (next, transition) = advance(state, &policy, &mut rng);
            assert_eq!(transition, None, "unexpected transition at tick {tick}");
            assert_eq!(next.cycles_in_regime, tick);
            state = next;
        }

        let (state, transition) = advance(state, &policy, &mut rng);
        assert_eq!(transition, Some(Transition::FaultOnset(FaultKind::FreinBloque)));
        assert_eq!(state.motor, MotorState::Faulted(FaultKind::FreinBloque));
        assert_eq!(state.cycles_in_regime, 0);
        assert_eq!(state.phase(), Phase::Onset);
    }

    #[test]
    fn high_gate_draw_keeps_normal() {
        let policy = EvolutionPolicy::default();
        let mut rng = Scripted {
            gate: 0.4,
            ..always_fault()
        };
        let state = SimulationState {
            motor: MotorState::Normal,
            cycles_in_regime: 500,
        };
        let (next, transition) = advance(state, &policy, &mut rng);
        assert_eq!(transition, None);
        assert_eq!(next.cycles_in_regime, 501);
    }

    #[test]
    fn recovery_requires_exceeding_threshold() {
        let policy = EvolutionPolicy::default();
        let mut rng = always_fault();
        let kind = FaultKind::GrippageMecanique;
        let state = SimulationState {
            motor: MotorState::Faulted(kind),
            cycles_in_regime: 59,
        };

        let (state, transition) = advance(state, &policy, &mut rng);
        assert_eq!(transition, None);
        assert_eq!(state.cycles_in_regime, 60);
        assert_eq!(state.active_fault(), Some(kind));
        assert_eq!(state.phase(), Phase::Steady);

        let (state, transition) = advance(state, &policy, &mut rng);
        assert_eq!(transition, Some(Transition::Recovered(kind)));
        assert_eq!(state.motor, MotorState::Normal);
        assert_eq!(state.active_fault(), None);
        assert_eq!(state.cycles_in_regime, 0);
    }

    #[test]
    fn faulted_never_switches_fault_directly() {
        let policy = EvolutionPolicy::default();
        let mut rng = StdRng::seed_from_u64(99);
        let mut state = SimulationState::new();
        for _ in 0..20_000 {
            let previous = state;
            let (next, transition) = advance(state, &policy, &mut rng);
            if let (MotorState::Faulted(a), MotorState::Faulted(b)) = (previous.motor, next.motor)
            {
                assert_eq!(a, b);
            }
            match transition {
                Some(Transition::FaultOnset(_)) => {
                    assert_eq!(previous.regime(), Regime::Normal)
                }
                Some(Transition::Recovered(_)) => {
                    assert_eq!(previous.regime(), Regime::Faulted)
                }
                None => assert_eq!(next.cycles_in_regime, previous.cycles_in_regime + 1),
            }
            state = next;
        }
    }

    #[test]
    fn weighted_selection_matches_proportions() {
        let policy = EvolutionPolicy::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let draws = 10_000;
        let mut counts = [0usize; 4];
        for _ in 0..draws {
            let kind = policy.choose_fault(&mut rng);
            let idx = FaultKind::ALL.iter().position(|k| *k == kind).unwrap();
            counts[idx] += 1;
        }
        let expected = [0.3, 0.2, 0.2, 0.3];
        for (count, want) in counts.iter().zip(expected) {
            let observed = *count as f64 / draws as f64;
            assert!(
                (observed - want).abs() < 0.03,
                "observed {observed}, expected {want}"
            );
        }
    }
}
