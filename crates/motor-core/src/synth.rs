//! Sample synthesis: turns the current simulation state into one reading.

use crate::evolution::SimulationState;
use crate::fault::MotorState;
use crate::profile::{onset_profile, steady_profile, ChannelRule, OnsetRule, Phase};
use crate::random::RandomSource;
use crate::sample::{ChannelState, SensorSample};
use crate::tags::Channel;
use crate::walk::round2;
use chrono::{DateTime, Utc};

/// Produce the reading for this tick and the channel state to carry forward.
pub fn synthesize<R: RandomSource + ?Sized>(
    state: &SimulationState,
    channels: ChannelState,
    timestamp: DateTime<Utc>,
    rng: &mut R,
) -> (SensorSample, ChannelState) {
    let mut next = channels;

    match (state.motor, state.phase()) {
        (MotorState::Faulted(kind), Phase::Onset) => {
            let onset = onset_profile(kind);
            for channel in Channel::ALL {
                if let OnsetRule::Jump(range) = onset.rule(channel) {
                    next.set(channel, round2(rng.uniform(range.min, range.max)));
                }
            }
        }
        (motor, _) => {
            let profile = steady_profile(motor);
            for channel in Channel::ALL {
                if let ChannelRule::Walk(step) = profile.rule(channel) {
                    next.set(channel, step.apply(next.get(channel), rng));
                }
            }
        }
    }

    let sample = SensorSample {
        timestamp,
        regime: state.regime(),
        fault: state.active_fault(),
        vibration: next.vibration,
        temperature: next.temperature,
        current: next.current,
        speed: next.speed,
    };
    (sample, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{FaultKind, Regime};
    use crate::profile::declared_range;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn onset_state(kind: FaultKind) -> SimulationState {
        SimulationState {
            motor: MotorState::Faulted(kind),
            cycles_in_regime: 0,
        }
    }

    #[test]
    fn onset_jumps_into_declared_ranges() {
        let mut rng = StdRng::seed_from_u64(5);
        for kind in FaultKind::ALL {
            for _ in 0..200 {
                let state = onset_state(kind);
                let (sample, _) = synthesize(&state, ChannelState::default(), Utc::now(), &mut rng);
                for channel in Channel::ALL {
                    let range = declared_range(state.motor, Phase::Onset, channel);
                    assert!(range.contains(sample.value(channel)), "{kind} {channel:?}");
                }
            }
        }
    }

    #[test]
    fn palier_onset_leaves_speed_alone() {
        let mut rng = StdRng::seed_from_u64(6);
        let channels = ChannelState {
            speed: 1487.25,
            ..ChannelState::default()
        };
        let state = onset_state(FaultKind::PalierDefaillant);
        let (sample, next) = synthesize(&state, channels, Utc::now(), &mut rng);
        assert_eq!(sample.speed, 1487.25);
        assert_eq!(next.speed, 1487.25);
        assert!(sample.vibration >= 2.5 && sample.vibration <= 3.5);
    }

    #[test]
    fn steady_fault_clamps_normal_values_into_fault_range() {
        let mut rng = StdRng::seed_from_u64(8);
        let state = SimulationState {
            motor: MotorState::Faulted(FaultKind::PalierDefaillant),
            cycles_in_regime: 3,
        };
        let (sample, _) = synthesize(&state, ChannelState::default(), Utc::now(), &mut rng);
        assert_eq!(sample.vibration, 1.5);
    }

    #[test]
    fn sample_labels_follow_state() {
        let mut rng = StdRng::seed_from_u64(9);
        let (sample, _) = synthesize(
            &SimulationState::new(),
            ChannelState::default(),
            Utc::now(),
            &mut rng,
        );
        assert_eq!(sample.regime, Regime::Normal);
        assert_eq!(sample.fault, None);

        let (sample, _) = synthesize(
            &onset_state(FaultKind::SurchauffeStator),
            ChannelState::default(),
            Utc::now(),
            &mut rng,
        );
        assert_eq!(sample.regime, Regime::Faulted);
        assert_eq!(sample.fault, Some(FaultKind::SurchauffeStator));
    }
}
