use crate::infra::store::SampleStore;
use crate::runtime::config::RuntimeConfig;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry::{self, RegimeChange, RegimeTracker};
use motor_core::{
    ExecutionStats, LoopConfig, MotorSimulator, SensorSample, SimulationState, StopReason,
    TickLoop, TimeBase,
};
use motor_io::metrics::STORE_FAILURES;
use motor_io::{Bridge, BridgeConfig, BridgeError};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("failed to open sample store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub fn run_from_args() {
    let config = RuntimeConfig::from_env();
    if config.show_help {
        RuntimeConfig::print_help();
        return;
    }

    let _log_guard = init_tracing(config.json_logs, config.log_dir.as_deref());
    if let Err(e) = run(config) {
        error!(error = %e, "motor-twin failed to start");
        std::process::exit(1);
    }
}

pub fn run(config: RuntimeConfig) -> Result<(), StartupError> {
    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let mut store = open_store(config.store_path.as_deref())?;
    let stop = Arc::new(AtomicBool::new(false));

    let (bridge_tx, bridge_handle) = if config.bridge_enabled {
        let bridge = Bridge::bind(build_bridge_config(&config))?;
        if let Ok(addr) = bridge.local_addr() {
            info!(addr = %addr, "Starting bridge");
        }
        let (tx, rx) = mpsc::channel::<SensorSample>();
        let stop_bridge = Arc::clone(&stop);
        (Some(tx), Some(thread::spawn(move || bridge.run(rx, stop_bridge))))
    } else {
        info!("Bridge disabled");
        (None, None)
    };

    let loop_config = LoopConfig {
        tick_interval: Duration::from_millis(config.interval_ms),
        max_ticks: config.max_ticks,
        ..LoopConfig::default()
    };
    info!(
        interval_ms = config.interval_ms,
        max_ticks = ?config.max_ticks,
        seed = ?config.seed,
        "Starting simulation loop"
    );

    let (sample_tx, sample_rx) = mpsc::channel::<SensorSample>();
    let seed = config.seed;
    let stop_sim = Arc::clone(&stop);
    let sim_handle = thread::spawn(move || {
        let source = match seed {
            Some(seed) => MotorSimulator::seeded(seed),
            None => MotorSimulator::from_entropy(),
        };
        let mut tick_loop = TickLoop::new(source, loop_config, sample_tx, TimeBase::new());
        let reason = tick_loop.run(&stop_sim);
        let final_state = tick_loop.source().state();
        (reason, tick_loop.stats().clone(), final_state)
    });

    let publisher_handle = thread::spawn(move || {
        let mut bridge_tx = bridge_tx;
        let mut tracker = RegimeTracker::default();
        let mut published = 0u64;

        for sample in sample_rx {
            match tracker.observe(&sample) {
                Some(RegimeChange::Onset(kind)) => warn!(fault = %kind, "Fault onset"),
                Some(RegimeChange::Recovery(kind)) => info!(fault = %kind, "Motor recovered"),
                None => {}
            }
            info!(
                timestamp = %sample.timestamp,
                etat_moteur = %sample.regime,
                anomalie = sample.fault.map(|f| f.as_str()).unwrap_or("none"),
                vibration = sample.vibration,
                temperature = sample.temperature,
                courant = sample.current,
                vitesse = sample.speed,
                "Sample"
            );

            if let Some(store) = store.as_mut() {
                if let Err(e) = store.append(&sample) {
                    STORE_FAILURES.inc();
                    warn!(error = %e, path = %store.path().display(), "Failed to store sample");
                }
            }

            if let Some(tx) = &bridge_tx {
                if tx.send(sample).is_err() {
                    warn!("Bridge stopped, continuing without it");
                    bridge_tx = None;
                }
            }
            published += 1;
        }

        let stored = store.as_ref().map(SampleStore::appended);
        (published, stored)
    });

    info!("motor-twin running");

    if let Some(seconds) = config.run_seconds {
        info!(seconds, "Running for limited duration");
        let deadline = Instant::now() + Duration::from_secs(seconds);
        while Instant::now() < deadline && !sim_handle.is_finished() {
            thread::sleep(Duration::from_millis(50));
        }
        stop.store(true, Ordering::Relaxed);
    }

    let (reason, stats, final_state) = match sim_handle.join() {
        Ok(result) => result,
        Err(_) => {
            error!("Simulation thread panicked");
            stop.store(true, Ordering::Relaxed);
            (
                StopReason::StopRequested,
                ExecutionStats::default(),
                SimulationState::new(),
            )
        }
    };

    let (published, stored) = publisher_handle.join().unwrap_or_else(|_| {
        error!("Publisher thread panicked");
        (0, None)
    });

    if let Some(handle) = bridge_handle {
        match handle.join() {
            Ok(bridge_stats) => info!(
                samples_published = bridge_stats.samples_published,
                clients_served = bridge_stats.clients_served,
                slow_drops = bridge_stats.slow_drops,
                "Bridge stopped"
            ),
            Err(_) => error!("Bridge thread panicked"),
        }
    }

    info!(
        reason = ?reason,
        ticks_executed = stats.ticks_executed,
        ticks_missed = stats.ticks_missed,
        fault_onsets = stats.fault_onsets,
        recoveries = stats.recoveries,
        max_lateness_us = stats.max_lateness_us,
        final_regime = %final_state.regime(),
        cycles_in_regime = final_state.cycles_in_regime,
        samples_published = published,
        samples_stored = ?stored,
        "Run complete"
    );
    Ok(())
}

fn build_bridge_config(config: &RuntimeConfig) -> BridgeConfig {
    BridgeConfig {
        bind_addr: config.bind_addr.clone(),
        topic: config.topic.clone(),
        max_clients: config.max_clients,
        require_handshake: config.require_handshake,
        ..Default::default()
    }
}

fn open_store(path: Option<&Path>) -> Result<Option<SampleStore>, StartupError> {
    let Some(path) = path else {
        return Ok(None);
    };

    if path.exists() {
        match SampleStore::read_all(path) {
            Ok(existing) => info!(
                path = %path.display(),
                records = existing.len(),
                "Appending to existing sample store"
            ),
            Err(e) => warn!(error = %e, path = %path.display(), "Existing sample store has unreadable records"),
        }
    }

    let store = SampleStore::open(path).map_err(|source| StartupError::Store {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %store.path().display(), "Sample store enabled");
    Ok(Some(store))
}
