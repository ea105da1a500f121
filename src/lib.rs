//! YARU: a reliable, in-order, connection-oriented byte-stream transport
//! layered on top of UDP.
//!
//! A [`YaruSocket`] pairs one underlying [`std::net::UdpSocket`] with a
//! background receive thread and, per unacked outbound packet, a
//! retransmission-timer thread. All of that shared state lives behind a
//! single mutex (see the `endpoint` module), the same shape this crate's
//! prior TCP-over-TUN stack threaded through its own receive loop and every
//! stream handle as `Arc<Mutex<Manager>>`.
//!
//! Packet framing and integrity live in [`packet`]; configuration in
//! [`YaruConfig`]; errors in [`YaruError`].

mod config;
mod endpoint;
mod error;
pub mod packet;

pub use config::YaruConfig;
pub use error::YaruError;

use std::net::{ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{info, warn};

use endpoint::{run_receive_loop, Endpoint, RetransmitTimer, POLL_INTERVAL};

/// A reliable byte-stream-like transport over one UDP socket.
///
/// `write`/`read` are non-blocking by contract: `write` either enqueues a
/// packet or fails immediately with [`YaruError::SendWindowFull`]; `read`
/// returns whatever contiguous, in-order data is currently deliverable,
/// which may be empty.
pub struct YaruSocket {
    endpoint: Arc<Mutex<Endpoint>>,
    socket: Arc<UdpSocket>,
    config: YaruConfig,
    closing: Arc<AtomicBool>,
    receive_thread: Option<JoinHandle<()>>,
}

impl YaruSocket {
    /// Creates an unbound endpoint (ephemeral local port) and spawns its
    /// receive loop, using [`YaruConfig::default`].
    pub fn new() -> std::io::Result<Self> {
        Self::with_config(YaruConfig::default())
    }

    /// As [`YaruSocket::new`], with an explicit window size and timeout.
    pub fn with_config(config: YaruConfig) -> std::io::Result<Self> {
        Self::construct(UdpSocket::bind("0.0.0.0:0")?, config)
    }

    /// Binds the underlying datagram socket to `addr` and spawns the
    /// receive loop, using [`YaruConfig::default`].
    ///
    /// `std::net::UdpSocket` only ever comes into existence already bound,
    /// so — unlike the Python reference, whose socket objects support a
    /// bare `bind()` call after construction — binding here is a
    /// constructor rather than a post-construction method, the same shape
    /// `UdpSocket::bind` itself uses.
    pub fn bind(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        Self::bind_with_config(addr, YaruConfig::default())
    }

    /// As [`YaruSocket::bind`], with an explicit window size and timeout.
    pub fn bind_with_config(addr: impl ToSocketAddrs, config: YaruConfig) -> std::io::Result<Self> {
        Self::construct(UdpSocket::bind(addr)?, config)
    }

    fn construct(socket: UdpSocket, config: YaruConfig) -> std::io::Result<Self> {
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let socket = Arc::new(socket);
        let endpoint = Arc::new(Mutex::new(Endpoint::new(config)));
        let closing = Arc::new(AtomicBool::new(false));

        let receive_thread = {
            let endpoint = endpoint.clone();
            let socket = socket.clone();
            let closing = closing.clone();
            std::thread::spawn(move || run_receive_loop(endpoint, socket, closing))
        };

        info!("yaru socket bound to {:?}", socket.local_addr());

        Ok(Self {
            endpoint,
            socket,
            config,
            closing,
            receive_thread: Some(receive_thread),
        })
    }

    /// Pins the default peer address used by [`YaruSocket::write`].
    pub fn connect(&self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        self.socket.connect(addr)
    }

    /// The address this socket's underlying UDP socket is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.socket.local_addr()
    }

    /// The connected peer address, if [`YaruSocket::connect`] has been called.
    pub fn peer_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.socket.peer_addr()
    }

    /// Enqueues `data` as a DATA packet to the connected peer. Non-blocking:
    /// fails immediately with [`YaruError::SendWindowFull`] if the send
    /// window is saturated, or [`YaruError::PayloadTooLarge`] if `data`
    /// exceeds [`packet::MAX_DATA_SIZE`]. Returns the assigned sequence
    /// number on success.
    pub fn write(&self, data: &[u8]) -> Result<u64, YaruError> {
        self.socket.peer_addr().map_err(|_| YaruError::NotConnected)?;

        let mut guard = self.endpoint.lock().unwrap();
        let (seq, bytes) = guard.enqueue(data)?;
        // Held across the send: sends at or below the MTU are effectively
        // non-blocking, so widening the critical section this far is the
        // cost of guaranteeing packets hit the wire in seq order.
        self.socket.send(&bytes)?;
        let timer = RetransmitTimer::spawn(seq, self.config.timeout, self.endpoint.clone(), self.socket.clone());
        guard.arm_timer(seq, timer);
        Ok(seq)
    }

    /// Returns the next contiguous, in-order run of delivered payloads.
    /// Non-blocking: returns an empty vector if nothing is deliverable yet.
    pub fn read(&self) -> Vec<u8> {
        self.endpoint.lock().unwrap().read()
    }

    /// Number of sequence numbers currently in flight (sent, unacked).
    pub fn in_flight(&self) -> u64 {
        self.endpoint.lock().unwrap().in_flight()
    }

    /// Cancels every live retransmission timer, stops the receive loop, and
    /// joins its thread. Outstanding unacked data is discarded; there is no
    /// linger.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.closing.store(true, Ordering::Release);
        self.endpoint.lock().unwrap().cancel_all_timers();
        if let Some(handle) = self.receive_thread.take() {
            if handle.join().is_err() {
                warn!("receive loop thread panicked during shutdown");
            }
        }
    }
}

impl Drop for YaruSocket {
    fn drop(&mut self) {
        self.shutdown();
    }
}
