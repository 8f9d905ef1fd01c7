use motor_io::DEFAULT_TOPIC;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub run_seconds: Option<u64>,
    pub max_ticks: Option<u64>,
    pub interval_ms: u64,
    pub seed: Option<u64>,
    pub bind_addr: String,
    pub topic: String,
    pub bridge_enabled: bool,
    pub require_handshake: bool,
    pub max_clients: usize,
    pub store_path: Option<PathBuf>,
    pub metrics_addr: Option<String>,
    pub json_logs: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            run_seconds: None,
            max_ticks: None,
            interval_ms: 2_000,
            seed: None,
            bind_addr: "127.0.0.1:7000".to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            bridge_enabled: true,
            require_handshake: false,
            max_clients: 16,
            store_path: None,
            metrics_addr: None,
            json_logs: false,
            log_dir: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--run-seconds" => {
                    if i + 1 < args.len() {
                        cfg.run_seconds = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--max-ticks" => {
                    if i + 1 < args.len() {
                        cfg.max_ticks = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--interval-ms" => {
                    if i + 1 < args.len() {
                        cfg.interval_ms = args[i + 1].parse().unwrap_or(2_000);
                        i += 1;
                    }
                }
                "--seed" => {
                    if i + 1 < args.len() {
                        cfg.seed = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--bind" => {
                    if i + 1 < args.len() {
                        cfg.bind_addr = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--topic" => {
                    if i + 1 < args.len() {
                        cfg.topic = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--no-bridge" => {
                    cfg.bridge_enabled = false;
                }
                "--require-handshake" => {
                    cfg.require_handshake = true;
                }
                "--max-clients" => {
                    if i + 1 < args.len() {
                        cfg.max_clients = args[i + 1].parse().unwrap_or(16);
                        i += 1;
                    }
                }
                "--store" => {
                    if i + 1 < args.len() {
                        cfg.store_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--metrics-addr" => {
                    if i + 1 < args.len() {
                        cfg.metrics_addr = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--log-dir" => {
                    if i + 1 < args.len() {
                        cfg.log_dir = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        cfg
    }

    pub fn print_help() {
        println!(
            r#"motor-twin - Synthetic motor telemetry generator

USAGE:
    motor-twin [OPTIONS]

OPTIONS:
    --interval-ms <MS>      Delay between simulation ticks [default: 2000]
    --seed <N>              Seed the simulator for a reproducible stream
    --max-ticks <N>         Stop after emitting N samples
    --run-seconds <SECS>    Run for a fixed duration then exit
    --bind <ADDR>           Bridge TCP bind address [default: 127.0.0.1:7000]
    --topic <NAME>          Topic samples are published on [default: sensors/motor]
    --no-bridge             Disable the TCP bridge (store and logs only)
    --require-handshake     Only publish to clients that sent a hello message
    --max-clients <N>       Maximum concurrent bridge subscribers [default: 16]
    --store <PATH>          Append every sample to a JSONL file
    --metrics-addr <ADDR>   Enable Prometheus metrics server on address (e.g., 0.0.0.0:9090)
    --json-logs             Output logs in JSON format (for log aggregation)
    --log-dir <PATH>        Also write JSON logs to a daily-rotated file in PATH
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log filter (e.g., RUST_LOG=debug,motor_core=trace)

EXAMPLES:
    # Stream samples every two seconds and keep a history
    motor-twin --store /var/lib/motor-twin/samples.jsonl --metrics-addr 0.0.0.0:9090

    # Fast reproducible run
    motor-twin --seed 42 --interval-ms 10 --max-ticks 500 --no-bridge
"#
        );
    }
}
