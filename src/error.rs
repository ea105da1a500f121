use crate::packet::MAX_DATA_SIZE;

#[derive(Debug, thiserror::Error)]
pub enum YaruError {
    #[error("payload of {0} bytes exceeds MAX_DATA_SIZE ({MAX_DATA_SIZE})")]
    PayloadTooLarge(usize),

    #[error("send window is full ({in_flight} packets in flight)")]
    SendWindowFull { in_flight: u64 },

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("malformed packet: {0}")]
    MalformedPacket(&'static str),

    #[error("socket has no connected peer; call connect() or supply a destination")]
    NotConnected,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
