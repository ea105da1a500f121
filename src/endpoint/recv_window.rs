//! Inbound sliding window: buffers out-of-order DATA payloads keyed by
//! sequence number and hands back contiguous, in-order runs on `read()`.

use std::collections::HashMap;

/// What the caller (`Endpoint::on_data`, under the lock) must do in
/// response to a just-processed datagram. `ReceiveWindow` has no socket
/// handle of its own, so it reports the decision instead of acting on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckAction {
    /// Send an ACK for this sequence number.
    Ack(u64),
    /// The sequence number is outside both the in-window and below-window
    /// ranges; drop silently.
    Drop,
}

#[derive(Debug)]
pub struct ReceiveWindow {
    window_size: u64,
    /// seq -> payload, for data received inside the window but not yet
    /// delivered to the user.
    recv_buf: HashMap<u64, Vec<u8>>,
    /// Next in-order sequence number expected by the user.
    recv_base: u64,
}

impl ReceiveWindow {
    pub fn new(window_size: u64) -> Self {
        Self {
            window_size,
            recv_buf: HashMap::new(),
            recv_base: 0,
        }
    }

    pub fn recv_base(&self) -> u64 {
        self.recv_base
    }

    /// Classifies and (if appropriate) stores a validated inbound payload.
    /// Duplicate stores for the same sequence overwrite the prior payload
    /// (retransmits of the same packet are required to carry identical
    /// data, so the overwrite is harmless).
    pub fn on_data(&mut self, seq: u64, payload: &[u8]) -> AckAction {
        let window_start = self.recv_base;
        let window_end = self.recv_base + self.window_size;

        if seq >= window_start && seq < window_end {
            self.recv_buf.insert(seq, payload.to_vec());
            return AckAction::Ack(seq);
        }

        // Below-window: the peer's prior ack was presumably lost. Re-ack
        // without storing (it was already delivered).
        if seq < window_start && seq + self.window_size >= window_start {
            return AckAction::Ack(seq);
        }

        AckAction::Drop
    }

    /// Concatenates and returns the contiguous run of payloads starting at
    /// `recv_base`, advancing `recv_base` past every consumed entry. Returns
    /// an empty vector (without blocking) if `recv_base` has not arrived yet.
    pub fn read(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(payload) = self.recv_buf.remove(&self.recv_base) {
            out.extend_from_slice(&payload);
            self.recv_base += 1;
        }
        out
    }

    #[cfg(test)]
    pub fn contains(&self, seq: u64) -> bool {
        self.recv_buf.contains_key(&seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_arrival_is_immediately_readable() {
        let mut r = ReceiveWindow::new(4);
        assert_eq!(r.on_data(0, b"hello"), AckAction::Ack(0));
        assert_eq!(r.read(), b"hello");
        assert_eq!(r.recv_base(), 1);
    }

    #[test]
    fn out_of_order_then_gap_fill_delivers_in_order() {
        let mut r = ReceiveWindow::new(4);
        assert_eq!(r.on_data(1, b"world"), AckAction::Ack(1));
        assert!(r.read().is_empty());

        assert_eq!(r.on_data(0, b"hello-"), AckAction::Ack(0));
        assert_eq!(r.read(), b"hello-world");
        assert_eq!(r.recv_base(), 2);
    }

    #[test]
    fn below_window_duplicate_is_reacked_without_storing() {
        let mut r = ReceiveWindow::new(4);
        r.on_data(0, b"a");
        r.read();
        assert_eq!(r.recv_base(), 1);

        assert_eq!(r.on_data(0, b"a"), AckAction::Ack(0));
        assert!(!r.contains(0));
    }

    #[test]
    fn far_outside_window_is_dropped_silently() {
        let mut r = ReceiveWindow::new(4);
        assert_eq!(r.on_data(100, b"late"), AckAction::Drop);
        assert!(!r.contains(100));
    }

    #[test]
    fn duplicate_in_window_store_overwrites_harmlessly() {
        let mut r = ReceiveWindow::new(4);
        r.on_data(0, b"first");
        r.on_data(0, b"first");
        assert_eq!(r.read(), b"first");
    }

    #[test]
    fn recv_buf_keys_stay_within_window_bounds() {
        let mut r = ReceiveWindow::new(4);
        r.on_data(0, b"a");
        r.on_data(1, b"b");
        r.on_data(2, b"c");
        r.on_data(3, b"d");
        // seq 4 is outside [recv_base, recv_base+window_size) == [0, 4)
        assert_eq!(r.on_data(4, b"e"), AckAction::Drop);
        assert!(!r.contains(4));
    }
}
