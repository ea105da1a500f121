use std::time::Duration;

/// Per-socket tunables. The upstream reference mutates class-level
/// attributes (`YARUSocket.WINDOW_SIZE = 4`) before constructing a socket;
/// here the same knobs are plain constructor arguments instead of process-wide
/// mutable state.
#[derive(Debug, Clone, Copy)]
pub struct YaruConfig {
    /// Maximum number of sequence numbers that may be in flight (unacked)
    /// in either direction at once.
    pub window_size: u64,
    /// Fixed retransmission timeout for unacked outbound packets.
    pub timeout: Duration,
}

impl Default for YaruConfig {
    fn default() -> Self {
        Self {
            window_size: 1024,
            timeout: Duration::from_secs(30),
        }
    }
}
