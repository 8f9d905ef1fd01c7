use crate::metrics::{BRIDGE_SLOW_DROPS, BRIDGE_SUBSCRIBERS};
use crate::protocol::{topic_matches, IncomingMessage, SampleMsg, DEFAULT_TOPIC};
use motor_core::SensorSample;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub struct BridgeConfig {
    pub bind_addr: String,
    /// Topic every sample is published on.
    pub topic: String,
    pub max_clients: usize,
    /// Hold samples back from a client until it sent a supported `hello`.
    pub require_handshake: bool,
    /// Pending output above which a subscriber is considered stuck and dropped.
    pub max_pending_bytes: usize,
    /// Longest incoming line accepted from a subscriber.
    pub max_line_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7000".to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            max_clients: 16,
            require_handshake: false,
            max_pending_bytes: 1 << 20,
            max_line_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to configure listener: {0}")]
    Listener(#[from] io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub samples_published: u64,
    pub clients_served: u64,
    pub slow_drops: u64,
}

#[derive(Debug)]
struct Subscriber {
    stream: TcpStream,
    addr: SocketAddr,
    recv_buf: Vec<u8>,
    send_buf: Vec<u8>,
    filters: Vec<String>,
    handshake_seen: bool,
    client_id: Option<String>,
}

impl Subscriber {
    fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        Self {
            stream,
            addr,
            recv_buf: Vec::with_capacity(1024),
            send_buf: Vec::new(),
            filters: Vec::new(),
            handshake_seen: false,
            client_id: None,
        }
    }

    fn wants(&self, topic: &str, require_handshake: bool) -> bool {
        if require_handshake && !self.handshake_seen {
            return false;
        }
        self.filters.iter().any(|filter| topic_matches(filter, topic))
    }

    fn add_filter(&mut self, filter: String) {
        if !self.filters.contains(&filter) {
            self.filters.push(filter);
        }
    }

    /// Read whatever is available. Returns `false` once the client is gone.
    fn poll_read(&mut self, config: &BridgeConfig) -> bool {
        let mut temp = [0u8; 1024];
        loop {
            match self.stream.read(&mut temp) {
                Ok(0) => {
                    info!(client_addr = %self.addr, "Subscriber disconnected");
                    return false;
                }
                Ok(n) => {
                    self.recv_buf.extend_from_slice(&temp[..n]);
                    let unterminated = match self.recv_buf.iter().rposition(|b| *b == b'\n') {
                        Some(pos) => self.recv_buf.len() - pos - 1,
                        None => self.recv_buf.len(),
                    };
                    if unterminated > config.max_line_bytes {
                        warn!(
                            client_addr = %self.addr,
                            buffered = unterminated,
                            limit = config.max_line_bytes,
                            "Dropping subscriber, incoming line too long"
                        );
                        return false;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    warn!(client_addr = %self.addr, error = %err, "Subscriber read error");
                    return false;
                }
            }
        }

        while let Some(pos) = self.recv_buf.iter().position(|b| *b == b'\n') {
            let line = self.recv_buf.drain(..=pos).collect::<Vec<u8>>();
            let Ok(text) = std::str::from_utf8(&line) else {
                continue;
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            match IncomingMessage::parse(trimmed) {
                Some(msg) => self.handle_incoming(msg, config),
                None => debug!(client_addr = %self.addr, "Ignoring unrecognised message"),
            }
        }
        true
    }

    #[instrument(skip(self, msg, config), fields(client_addr = %self.addr))]
    fn handle_incoming(&mut self, msg: IncomingMessage, config: &BridgeConfig) {
        match msg {
            IncomingMessage::Hello(hello) => {
                if !hello.protocol_version.is_supported() {
                    warn!(
                        major = hello.protocol_version.major,
                        minor = hello.protocol_version.minor,
                        "Unsupported protocol version"
                    );
                    return;
                }
                self.handshake_seen = true;
                self.client_id = hello.client_id;
                if hello.topics.is_empty() {
                    self.add_filter(config.topic.clone());
                }
                for topic in hello.topics {
                    self.add_filter(topic);
                }
                info!(
                    client_id = ?self.client_id,
                    filters = ?self.filters,
                    "Subscriber handshake received"
                );
            }
            IncomingMessage::Subscribe(sub) => {
                if config.require_handshake && !self.handshake_seen {
                    warn!("Subscribe received before handshake");
                    return;
                }
                debug!(topic = %sub.topic, "Subscriber added topic filter");
                self.add_filter(sub.topic);
            }
        }
    }

    /// Write as much pending output as the socket takes. Returns `false` on
    /// a dead connection.
    fn flush(&mut self) -> bool {
        while !self.send_buf.is_empty() {
            match self.stream.write(&self.send_buf) {
                Ok(0) => {
                    info!(client_addr = %self.addr, "Subscriber disconnected");
                    return false;
                }
                Ok(n) => {
                    self.send_buf.drain(..n);
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    warn!(client_addr = %self.addr, error = %err, "Subscriber write error");
                    return false;
                }
            }
        }
        true
    }
}

/// TCP publisher fanning samples out to subscribed clients as JSON lines.
pub struct Bridge {
    listener: TcpListener,
    config: BridgeConfig,
}

impl Bridge {
    pub fn bind(config: BridgeConfig) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(&config.bind_addr).map_err(|source| BridgeError::Bind {
            addr: config.bind_addr.clone(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Publish samples until `stop` is set or the sample sender hangs up.
    pub fn run(self, samples: Receiver<SensorSample>, stop: Arc<AtomicBool>) -> BridgeStats {
        let config = self.config;
        info!(
            addr = %config.bind_addr,
            topic = %config.topic,
            require_handshake = config.require_handshake,
            "Bridge listening"
        );

        let mut subscribers: Vec<Subscriber> = Vec::new();
        let mut stats = BridgeStats::default();
        let mut sequence: u64 = 0;

        loop {
            if stop.load(std::sync::atomic::Ordering::Relaxed) {
                break;
            }

            loop {
                match self.listener.accept() {
                    Ok((stream, addr)) => {
                        if subscribers.len() >= config.max_clients {
                            warn!(client_addr = %addr, max = config.max_clients, "Rejecting subscriber, bridge full");
                            continue;
                        }
                        if let Err(err) = stream.set_nonblocking(true) {
                            warn!(client_addr = %addr, error = %err, "Failed to set nonblocking on subscriber");
                            continue;
                        }
                        let _ = stream.set_nodelay(true);
                        info!(client_addr = %addr, "Subscriber connected");
                        let mut subscriber = Subscriber::new(stream, addr);
                        if !config.require_handshake {
                            subscriber.add_filter(config.topic.clone());
                        }
                        subscribers.push(subscriber);
                        stats.clients_served += 1;
                    }
                    Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                    Err(err) => {
                        warn!("Bridge accept error: {}", err);
                        break;
                    }
                }
            }

            let mut upstream_closed = false;
            loop {
                match samples.try_recv() {
                    Ok(sample) => {
                        sequence = sequence.wrapping_add(1);
                        let msg = SampleMsg::new(&config.topic, sequence, &sample);
                        let line = match serde_json::to_string(&msg) {
                            Ok(line) => line,
                            Err(err) => {
                                warn!(error = %err, "Failed to encode sample");
                                continue;
                            }
                        };
                        for subscriber in subscribers
                            .iter_mut()
                            .filter(|s| s.wants(&config.topic, config.require_handshake))
                        {
                            subscriber.send_buf.extend_from_slice(line.as_bytes());
                            subscriber.send_buf.push(b'\n');
                        }
                        stats.samples_published += 1;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        upstream_closed = true;
                        break;
                    }
                }
            }

            subscribers.retain_mut(|subscriber| {
                if !subscriber.poll_read(&config) || !subscriber.flush() {
                    return false;
                }
                if subscriber.send_buf.len() > config.max_pending_bytes {
                    warn!(
                        client_addr = %subscriber.addr,
                        pending = subscriber.send_buf.len(),
                        "Dropping slow subscriber"
                    );
                    BRIDGE_SLOW_DROPS.inc();
                    stats.slow_drops += 1;
                    return false;
                }
                true
            });
            BRIDGE_SUBSCRIBERS.set(subscribers.len() as i64);

            if upstream_closed {
                info!("Sample source closed, stopping bridge");
                break;
            }

            std::thread::sleep(Duration::from_millis(5));
        }

        BRIDGE_SUBSCRIBERS.set(0);
        stats
    }
}
