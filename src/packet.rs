//! Wire framing and integrity for YARU packets.
//!
//! ```text
//!  offset  size   field
//!    0      8    seq_num       (u64 BE)
//!    8      2    length        (u16 BE, payload size N)
//!   10     16    checksum      (MD5 of header+payload with this field zeroed)
//!   26      N    payload
//! ```

use md5::{Digest, Md5};

use crate::error::YaruError;

pub const SEQNUM_SIZE: usize = 8;
pub const LENGTH_SIZE: usize = 2;
pub const CHECKSUM_SIZE: usize = 16;
pub const HEADER_SIZE: usize = SEQNUM_SIZE + LENGTH_SIZE + CHECKSUM_SIZE;

/// 65535 (max IPv4 datagram) - 20 (IP) - 8 (UDP) - 26 (YARU header).
pub const MAX_DATA_SIZE: usize = 65481;

const CHECKSUM_START: usize = SEQNUM_SIZE + LENGTH_SIZE;
const CHECKSUM_END: usize = CHECKSUM_START + CHECKSUM_SIZE;

/// Builds a framed packet. `length == 0` means an ACK packet whose `seq_num`
/// names the data sequence number being acknowledged; `length > 0` is a DATA
/// packet.
pub fn make_packet(seq_num: u64, data: &[u8]) -> Result<Vec<u8>, YaruError> {
    if data.len() > MAX_DATA_SIZE {
        return Err(YaruError::PayloadTooLarge(data.len()));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + data.len());
    buf.extend_from_slice(&seq_num.to_be_bytes());
    buf.extend_from_slice(&(data.len() as u16).to_be_bytes());
    buf.extend_from_slice(&[0u8; CHECKSUM_SIZE]);
    buf.extend_from_slice(data);

    let digest = Md5::digest(&buf);
    buf[CHECKSUM_START..CHECKSUM_END].copy_from_slice(&digest);

    Ok(buf)
}

/// Reverses [`make_packet`]. Extra trailing bytes beyond the declared
/// `length` are ignored (a `recv_from` buffer is typically oversized).
pub fn parse_packet(packet: &[u8]) -> Result<(u64, &[u8]), YaruError> {
    if packet.len() < HEADER_SIZE {
        return Err(YaruError::MalformedPacket("shorter than header"));
    }

    let mut working = packet[..HEADER_SIZE].to_vec();
    let checksum = working[CHECKSUM_START..CHECKSUM_END].to_vec();
    working[CHECKSUM_START..CHECKSUM_END].fill(0);
    // The digest runs over header + payload, so splice the real payload back
    // in before recomputing rather than hashing the header alone.
    working.extend_from_slice(&packet[HEADER_SIZE..]);

    let length = u16::from_be_bytes([packet[SEQNUM_SIZE], packet[SEQNUM_SIZE + 1]]) as usize;
    if HEADER_SIZE + length > packet.len() {
        return Err(YaruError::MalformedPacket("length exceeds remaining bytes"));
    }

    // Only hash header + declared payload, ignoring any trailing garbage.
    working.truncate(HEADER_SIZE + length);
    let digest = Md5::digest(&working);
    if digest.as_slice() != checksum.as_slice() {
        return Err(YaruError::ChecksumMismatch);
    }

    let seq_num = u64::from_be_bytes(packet[..SEQNUM_SIZE].try_into().unwrap());
    let data = &packet[HEADER_SIZE..HEADER_SIZE + length];
    Ok((seq_num, data))
}

/// `true` for a `length == 0` ACK packet.
pub fn is_ack(length: usize) -> bool {
    length == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_small_payload() {
        let packet = make_packet(3, b"supp").unwrap();
        let (seq, data) = parse_packet(&packet).unwrap();
        assert_eq!(seq, 3);
        assert_eq!(data, b"supp");
    }

    #[test]
    fn round_trip_empty_payload_is_ack() {
        let packet = make_packet(42, b"").unwrap();
        let (seq, data) = parse_packet(&packet).unwrap();
        assert_eq!(seq, 42);
        assert!(data.is_empty());
        assert!(is_ack(data.len()));
    }

    #[test]
    fn round_trip_maximum_payload() {
        let data = vec![b'S'; MAX_DATA_SIZE];
        let packet = make_packet(4, &data).unwrap();
        assert_eq!(packet.len(), HEADER_SIZE + MAX_DATA_SIZE);
        let (seq, parsed) = parse_packet(&packet).unwrap();
        assert_eq!(seq, 4);
        assert_eq!(parsed, data.as_slice());
    }

    #[test]
    fn oversize_payload_is_rejected() {
        let data = vec![b'S'; MAX_DATA_SIZE + 1];
        let err = make_packet(0, &data).unwrap_err();
        assert!(matches!(err, YaruError::PayloadTooLarge(n) if n == MAX_DATA_SIZE + 1));
    }

    #[test]
    fn truncated_header_is_malformed() {
        let err = parse_packet(&[0u8; HEADER_SIZE - 1]).unwrap_err();
        assert!(matches!(err, YaruError::MalformedPacket(_)));
    }

    #[test]
    fn declared_length_beyond_buffer_is_malformed() {
        let mut packet = make_packet(1, b"hi").unwrap();
        packet.truncate(packet.len() - 1);
        let err = parse_packet(&packet).unwrap_err();
        assert!(matches!(err, YaruError::MalformedPacket(_)));
    }

    #[test]
    fn trailing_bytes_beyond_length_are_ignored() {
        let mut packet = make_packet(1, b"hi").unwrap();
        packet.extend_from_slice(&[0xAA; 32]);
        let (seq, data) = parse_packet(&packet).unwrap();
        assert_eq!(seq, 1);
        assert_eq!(data, b"hi");
    }

    #[test]
    fn bit_flip_anywhere_is_detected() {
        // Any single-bit corruption must be rejected. A flip inside the
        // length field can additionally push the declared length past the
        // buffer (MalformedPacket) rather than merely desyncing the digest
        // (ChecksumMismatch); either is an acceptable rejection.
        let packet = make_packet(7, b"corruption-check").unwrap();
        for byte_idx in 0..packet.len() {
            for bit in 0..8u8 {
                let mut corrupted = packet.clone();
                corrupted[byte_idx] ^= 1 << bit;
                assert!(
                    parse_packet(&corrupted).is_err(),
                    "flipping bit {bit} of byte {byte_idx} went undetected"
                );
            }
        }
    }

    #[test]
    fn bit_flip_outside_length_field_is_checksum_mismatch() {
        let packet = make_packet(7, b"corruption-check").unwrap();
        for byte_idx in (0..packet.len()).filter(|&i| i < SEQNUM_SIZE || i >= SEQNUM_SIZE + LENGTH_SIZE) {
            let mut corrupted = packet.clone();
            corrupted[byte_idx] ^= 0x01;
            assert!(
                matches!(parse_packet(&corrupted), Err(YaruError::ChecksumMismatch)),
                "byte {byte_idx} did not yield ChecksumMismatch"
            );
        }
    }
}
