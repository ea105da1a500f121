//! The protected, shared per-socket state: send window, receive window, and
//! the live retransmission timers. Exactly one `Mutex<Endpoint>` per
//! `YaruSocket` serializes every access from the receive-loop thread, every
//! timer thread, and the caller's own `read`/`write` calls — mirroring the
//! single `Arc<Mutex<Manager>>` this crate's earlier TCP-over-TUN stack
//! (`NetStack`) threaded through its receive loop and every
//! `TcpStream`/`TcpListener` method.

mod receive_loop;
mod recv_window;
mod send_window;
mod timer;

pub(crate) use receive_loop::{run_receive_loop, POLL_INTERVAL};
pub(crate) use recv_window::{AckAction, ReceiveWindow};
pub(crate) use send_window::SendWindow;
pub(crate) use timer::RetransmitTimer;

use std::collections::HashMap;

use crate::config::YaruConfig;
use crate::error::YaruError;

#[derive(Debug)]
pub(crate) struct Endpoint {
    send_window: SendWindow,
    recv_window: ReceiveWindow,
    timers: HashMap<u64, RetransmitTimer>,
}

impl Endpoint {
    pub(crate) fn new(config: YaruConfig) -> Self {
        Self {
            send_window: SendWindow::new(config.window_size),
            recv_window: ReceiveWindow::new(config.window_size),
            timers: HashMap::new(),
        }
    }

    /// Enqueues `data` for transmission. Returns the assigned sequence
    /// number and the framed packet bytes; the caller is responsible for
    /// transmitting them and arming the initial retransmission timer
    /// (`arm_timer`), keeping this type free of socket/thread concerns.
    pub(crate) fn enqueue(&mut self, data: &[u8]) -> Result<(u64, Vec<u8>), YaruError> {
        self.send_window.enqueue(data)
    }

    /// Records that `timer` is now the live retransmission timer for
    /// `seq_num`, dropping (and thereby cancelling) whatever timer
    /// previously occupied that slot, if any.
    pub(crate) fn arm_timer(&mut self, seq_num: u64, timer: RetransmitTimer) {
        self.timers.insert(seq_num, timer);
    }

    /// Applies an ACK: marks `seq_num` acknowledged and retires as much of
    /// the send window as possible, cancelling and dropping the timer for
    /// every retired sequence number.
    pub(crate) fn on_ack(&mut self, seq_num: u64) {
        for retired in self.send_window.on_ack(seq_num) {
            if let Some(timer) = self.timers.remove(&retired) {
                timer.cancel();
            }
        }
    }

    /// Applies validated inbound DATA, returning the ack action the caller
    /// must perform.
    pub(crate) fn on_data(&mut self, seq: u64, payload: &[u8]) -> AckAction {
        self.recv_window.on_data(seq, payload)
    }

    /// Returns the next contiguous, in-order run of delivered payloads;
    /// empty (without blocking) if `recv_base` has not arrived yet.
    pub(crate) fn read(&mut self) -> Vec<u8> {
        self.recv_window.read()
    }

    pub(crate) fn in_flight(&self) -> u64 {
        self.send_window.in_flight()
    }

    pub(crate) fn packet_for_retransmit(&self, seq_num: u64) -> Option<&[u8]> {
        self.send_window.packet_for_retransmit(seq_num)
    }

    /// Cancels and drops every live retransmission timer, called once on
    /// `close()`. Outstanding unacked data is simply abandoned.
    pub(crate) fn cancel_all_timers(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.cancel();
        }
    }

    #[cfg(test)]
    pub(crate) fn send_base(&self) -> u64 {
        self.send_window.send_base()
    }

    #[cfg(test)]
    pub(crate) fn recv_base(&self) -> u64 {
        self.recv_window.recv_base()
    }
}
