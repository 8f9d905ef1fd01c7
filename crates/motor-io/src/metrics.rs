//! Prometheus metrics for the motor telemetry generator.
//!
//! Channel gauges mirror the latest sample; counters track regime
//! transitions and the health of the sample consumers.

use motor_core::{tags, Channel, FaultKind, Regime, SensorSample};
use prometheus::{
    Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Sample Metrics
// ============================================================================

/// Latest value of each sensor channel, one gauge per channel tag, in
/// `Channel::ALL` order
pub static CHANNEL_GAUGES: LazyLock<[Gauge; 4]> = LazyLock::new(|| {
    Channel::ALL.map(|channel| {
        let tag = channel.tag();
        let gauge = Gauge::new(tag.metric, format!("Latest emitted {} ({})", tag.key, tag.unit))
            .unwrap();
        REGISTRY.register(Box::new(gauge.clone())).unwrap();
        gauge
    })
});

pub fn channel_gauge(channel: Channel) -> &'static Gauge {
    &CHANNEL_GAUGES[channel as usize]
}

/// Current regime (0 = normal, 1 = faulted)
pub static REGIME_FAULTED: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(tags::REGIME.metric, "Current regime (0=normal, 1=faulted)").unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Total samples emitted by the simulator
pub static SAMPLES_EMITTED: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new("motor_samples_emitted_total", "Total samples emitted").unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

// ============================================================================
// Regime Transition Metrics
// ============================================================================

/// Fault onsets by fault kind
pub static FAULT_ONSETS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(tags::FAULT.metric, "Fault onsets by fault kind"),
        &["fault"],
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Recoveries back to normal operation
pub static RECOVERIES: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "motor_recoveries_total",
        "Transitions from a fault back to normal operation",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

// ============================================================================
// Runtime Metrics
// ============================================================================

/// Failed appends to the sample store
pub static STORE_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "motor_store_failures_total",
        "Samples that could not be appended to the store",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Connected bridge subscribers
pub static BRIDGE_SUBSCRIBERS: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        "motor_bridge_subscribers",
        "Subscribers currently connected to the bridge",
    )
    .unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Subscribers dropped because they could not keep up
pub static BRIDGE_SLOW_DROPS: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        "motor_bridge_slow_subscriber_drops_total",
        "Subscribers disconnected for exceeding the pending output bound",
    )
    .unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
});

/// Update the sample gauges from one emitted sample.
pub fn record_sample(sample: &SensorSample) {
    for channel in Channel::ALL {
        channel_gauge(channel).set(sample.value(channel));
    }
    REGIME_FAULTED.set(match sample.regime {
        Regime::Normal => 0.0,
        Regime::Faulted => 1.0,
    });
    SAMPLES_EMITTED.inc();
}

pub fn record_fault_onset(kind: FaultKind) {
    FAULT_ONSETS.with_label_values(&[kind.as_str()]).inc();
}

// ============================================================================
// Metrics HTTP Server
// ============================================================================

/// Start the metrics HTTP server on the given address.
/// Returns a join handle for the server thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => {
                    let encoder = TextEncoder::new();
                    let mut buffer = Vec::new();

                    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
                        tracing::warn!("Failed to encode metrics: {}", e);
                        let _ = request.respond(
                            Response::from_string("Internal Server Error").with_status_code(500),
                        );
                        continue;
                    }

                    let response = Response::from_data(buffer).with_header(
                        tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/plain; version=0.0.4"[..],
                        )
                        .unwrap(),
                    );
                    let _ = request.respond(response);
                }
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                "/ready" => {
                    // Ready once the first sample went out
                    if SAMPLES_EMITTED.get() > 0 {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    let _ = CHANNEL_GAUGES.len();
    for kind in FaultKind::ALL {
        let _ = FAULT_ONSETS.with_label_values(&[kind.as_str()]);
    }
    let _ = REGIME_FAULTED.get();
    let _ = SAMPLES_EMITTED.get();
    let _ = RECOVERIES.get();
    let _ = STORE_FAILURES.get();
    let _ = BRIDGE_SUBSCRIBERS.get();
    let _ = BRIDGE_SLOW_DROPS.get();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn record_sample_updates_gauges() {
        init_metrics();
        let before = SAMPLES_EMITTED.get();
        let sample = SensorSample {
            timestamp: Utc::now(),
            regime: Regime::Faulted,
            fault: Some(FaultKind::GrippageMecanique),
            vibration: 3.1,
            temperature: 92.4,
            current: 13.2,
            speed: 1290.0,
        };
        record_sample(&sample);
        record_fault_onset(FaultKind::GrippageMecanique);

        assert!(SAMPLES_EMITTED.get() > before);
        assert_eq!(REGIME_FAULTED.get(), 1.0);
        assert_eq!(channel_gauge(Channel::Speed).get(), 1290.0);
        assert_eq!(channel_gauge(Channel::Temperature).get(), 92.4);
        assert!(
            FAULT_ONSETS
                .with_label_values(&["grippage_mecanique"])
                .get()
                >= 1
        );
    }

    #[test]
    fn channel_gauges_are_exported_under_tag_names() {
        init_metrics();
        let names: Vec<String> = REGISTRY
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        for channel in Channel::ALL {
            assert!(names.iter().any(|n| n == channel.tag().metric), "{channel:?}");
        }
        let speed = REGISTRY
            .gather()
            .into_iter()
            .find(|family| family.get_name() == "motor_speed_rpm")
            .unwrap();
        assert!(speed.get_help().contains("rpm"));
    }
}
