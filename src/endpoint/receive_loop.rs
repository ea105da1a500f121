//! The background thread that drains the underlying UDP socket, validates
//! incoming packets, and routes them into the shared `Endpoint` — the
//! analogue of this crate's prior `NetStack::new`-spawned `segment_loop`
//! thread.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, trace, warn};

use crate::error::YaruError;
use crate::packet::{self, is_ack};

use super::{AckAction, Endpoint};

/// Poll interval for the blocking `recv_from` call, so the loop can observe
/// a `close()` shutdown signal within one tick rather than blocking forever
/// on a socket about to be dropped.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Runs until `closing` is set, draining one datagram at a time from
/// `socket`, validating it, and routing DATA to the receive window (which
/// may produce an ACK to send back) or ACKs to the send window.
pub(crate) fn run_receive_loop(endpoint: Arc<Mutex<Endpoint>>, socket: Arc<UdpSocket>, closing: Arc<AtomicBool>) {
    let mut buf = vec![0u8; 65535];

    while !closing.load(Ordering::Acquire) {
        let (n, source) = match socket.recv_from(&mut buf) {
            Ok(result) => result,
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                continue;
            }
            Err(err) => {
                if closing.load(Ordering::Acquire) {
                    break;
                }
                warn!("receive loop socket error: {err}");
                continue;
            }
        };

        let (seq, payload) = match packet::parse_packet(&buf[..n]) {
            Ok(parsed) => parsed,
            Err(YaruError::ChecksumMismatch) => {
                info!("dropping packet from {source}: checksum mismatch");
                continue;
            }
            Err(YaruError::MalformedPacket(reason)) => {
                info!("dropping packet from {source}: malformed ({reason})");
                continue;
            }
            Err(other) => {
                warn!("dropping packet from {source}: {other}");
                continue;
            }
        };

        if is_ack(payload.len()) {
            trace!("received ack for seq {seq} from {source}");
            endpoint.lock().unwrap().on_ack(seq);
            continue;
        }

        let action = endpoint.lock().unwrap().on_data(seq, payload);
        match action {
            AckAction::Ack(acked_seq) => {
                debug!("acking seq {acked_seq} to {source}");
                match packet::make_packet(acked_seq, &[]) {
                    Ok(ack_packet) => {
                        if let Err(err) = socket.send_to(&ack_packet, source) {
                            warn!("failed to send ack for seq {acked_seq} to {source}: {err}");
                        }
                    }
                    Err(err) => warn!("failed to build ack packet for seq {acked_seq}: {err}"),
                }
            }
            AckAction::Drop => {
                debug!("dropping out-of-window data seq {seq} from {source}");
            }
        }
    }

    trace!("receive loop exiting");
}
