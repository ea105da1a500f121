//! Outbound sliding window: tracks unacknowledged DATA packets keyed by
//! sequence number. A plain data structure — synchronization is the
//! responsibility of the caller (`Endpoint`'s single mutex).

use std::collections::{HashMap, HashSet};

use crate::error::YaruError;
use crate::packet;

/// An outbound packet waiting on acknowledgement.
#[derive(Debug)]
struct SendSlot {
    /// The fully framed, already-checksummed wire bytes, kept around
    /// verbatim so a retransmit resends byte-for-byte identical data.
    packet: Vec<u8>,
}

#[derive(Debug)]
pub struct SendWindow {
    window_size: u64,
    /// seq -> in-flight packet bytes, for every key in `[send_base, send_next)`.
    send_buf: HashMap<u64, SendSlot>,
    /// Sequence numbers >= send_base that have been acked but not yet
    /// retired because a lower sequence is still outstanding.
    acked_set: HashSet<u64>,
    /// Smallest sequence number still unacknowledged.
    send_base: u64,
    /// Next sequence number to assign on write.
    send_next: u64,
}

impl SendWindow {
    pub fn new(window_size: u64) -> Self {
        Self {
            window_size,
            send_buf: HashMap::new(),
            acked_set: HashSet::new(),
            send_base: 0,
            send_next: 0,
        }
    }

    pub fn send_base(&self) -> u64 {
        self.send_base
    }

    pub fn send_next(&self) -> u64 {
        self.send_next
    }

    pub fn in_flight(&self) -> u64 {
        self.send_next - self.send_base
    }

    pub fn is_full(&self) -> bool {
        self.send_next >= self.send_base + self.window_size
    }

    /// Builds and stores a packet for `data`, assigning it the next
    /// sequence number. Returns the assigned sequence number and the
    /// serialized packet bytes for the caller to transmit and arm a timer
    /// for. Fails with `SendWindowFull` if the window is saturated.
    pub fn enqueue(&mut self, data: &[u8]) -> Result<(u64, Vec<u8>), YaruError> {
        if self.is_full() {
            return Err(YaruError::SendWindowFull {
                in_flight: self.in_flight(),
            });
        }

        let seq = self.send_next;
        let packet = packet::make_packet(seq, data)?;
        self.send_buf.insert(seq, SendSlot { packet: packet.clone() });
        self.send_next += 1;
        Ok((seq, packet))
    }

    /// Records an ACK for `seq_num` and retires as much of the window as
    /// possible. Returns the sequence numbers whose timers the caller must
    /// cancel (their `send_buf`/timer entries have just been dropped).
    pub fn on_ack(&mut self, seq_num: u64) -> Vec<u64> {
        if seq_num < self.send_base || seq_num >= self.send_next {
            // Stale ack for an already-retired sequence, or an impossible
            // ack naming a sequence number we never assigned.
            return Vec::new();
        }

        self.acked_set.insert(seq_num);

        let mut retired = Vec::new();
        while self.acked_set.remove(&self.send_base) {
            self.send_buf.remove(&self.send_base);
            retired.push(self.send_base);
            self.send_base += 1;
        }
        retired
    }

    /// Returns the stored packet bytes for `seq_num` if it is still
    /// in-flight (i.e. has not been acked and retired), for retransmission.
    /// `None` means the timer lost the race against an ACK and must do
    /// nothing.
    pub fn packet_for_retransmit(&self, seq_num: u64) -> Option<&[u8]> {
        self.send_buf.get(&seq_num).map(|slot| slot.packet.as_slice())
    }

    #[cfg(test)]
    pub fn contains(&self, seq_num: u64) -> bool {
        self.send_buf.contains_key(&seq_num)
    }
}
