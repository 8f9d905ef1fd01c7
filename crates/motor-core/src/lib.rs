pub mod control_loop;
pub mod evolution;
pub mod fault;
pub mod hal;
pub mod profile;
pub mod random;
pub mod sample;
pub mod simulator;
pub mod synth;
pub mod tags;
pub mod timebase;
pub mod walk;

pub use control_loop::{ExecutionStats, LoopConfig, StopReason, TickLoop};
pub use evolution::{advance, EvolutionPolicy, SimulationState, Transition};
pub use fault::{FaultKind, MotorState, Regime};
pub use hal::{SampleSource, TickOutcome};
pub use profile::{declared_range, Phase};
pub use random::RandomSource;
pub use sample::{ChannelState, SensorSample};
pub use simulator::MotorSimulator;
pub use synth::synthesize;
pub use tags::{Channel, Tag};
pub use timebase::TimeBase;
pub use walk::{bounded_walk, ChannelRange};
