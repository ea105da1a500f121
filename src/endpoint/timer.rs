//! One retransmission timer per unacked outbound packet, firing on its own
//! detached thread — the direct analogue of the Python reference's
//! `threading.Timer(self.TIMEOUT, self.on_send_timeout, (seq_num,))`.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{trace, warn};

use super::Endpoint;

/// A live retransmission timer for one sequence number. Cancellation is
/// advisory: setting `cancelled` races against the timer thread waking up,
/// so the fire callback re-checks `send_buf` membership under the lock
/// before acting — two independent guards against the same ACK/timeout
/// race described in the design notes.
#[derive(Debug)]
pub struct RetransmitTimer {
    cancelled: Arc<AtomicBool>,
}

impl RetransmitTimer {
    /// Spawns the timer thread for `seq_num`. On expiry it re-checks that
    /// the packet is still outstanding, resends it verbatim over `socket`
    /// (the connected peer), and re-arms itself — unbounded, no backoff.
    pub fn spawn(
        seq_num: u64,
        timeout: Duration,
        endpoint: Arc<Mutex<Endpoint>>,
        socket: Arc<UdpSocket>,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let thread_cancelled = cancelled.clone();

        thread::spawn(move || fire(seq_num, timeout, endpoint, socket, thread_cancelled));

        Self { cancelled }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

impl Drop for RetransmitTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn fire(
    seq_num: u64,
    timeout: Duration,
    endpoint: Arc<Mutex<Endpoint>>,
    socket: Arc<UdpSocket>,
    cancelled: Arc<AtomicBool>,
) {
    thread::sleep(timeout);
    if cancelled.load(Ordering::Acquire) {
        trace!("timer for seq {seq_num} cancelled before firing");
        return;
    }

    let bytes = {
        let guard = endpoint.lock().unwrap();
        match guard.packet_for_retransmit(seq_num) {
            Some(bytes) => bytes.to_vec(),
            // Already acked and retired: the ACK won the race. No-op.
            None => return,
        }
    };

    if let Err(err) = socket.send(&bytes) {
        warn!("retransmit of seq {seq_num} failed: {err}");
    }

    let mut guard = endpoint.lock().unwrap();
    if guard.packet_for_retransmit(seq_num).is_some() {
        trace!("re-arming timer for seq {seq_num} after retransmit");
        let rearmed = RetransmitTimer::spawn(seq_num, timeout, endpoint.clone(), socket.clone());
        guard.arm_timer(seq_num, rearmed);
    }
}
