//! End-to-end tests driving two real `YaruSocket`s over loopback UDP,
//! exercising the public interface rather than the internal window types.

use std::thread;
use std::time::{Duration, Instant};

use yaru::{YaruConfig, YaruError, YaruSocket};

/// Polls `sock.read()` until it has produced at least `want` bytes (or
/// `timeout` elapses), accumulating across calls since a single `read()`
/// only returns the contiguous run currently deliverable.
fn read_until(sock: &YaruSocket, want: usize, timeout: Duration) -> Vec<u8> {
    let deadline = Instant::now() + timeout;
    let mut out = Vec::new();
    while out.len() < want && Instant::now() < deadline {
        let chunk = sock.read();
        if chunk.is_empty() {
            thread::sleep(Duration::from_millis(5));
        } else {
            out.extend_from_slice(&chunk);
        }
    }
    out
}

#[test]
fn single_payload_is_reliably_delivered() {
    let server = YaruSocket::new().unwrap();
    let server_addr = server.local_addr().unwrap();

    let client = YaruSocket::new().unwrap();
    client.connect(server_addr).unwrap();

    client.write(b"supp").unwrap();

    assert_eq!(read_until(&server, 4, Duration::from_secs(2)), b"supp");
}

#[test]
fn multiple_payloads_are_delivered_in_order_concatenated() {
    let server = YaruSocket::new().unwrap();
    let server_addr = server.local_addr().unwrap();

    let client = YaruSocket::new().unwrap();
    client.connect(server_addr).unwrap();

    for chunk in [b"ab".as_slice(), b"cd".as_slice(), b"ef".as_slice()] {
        client.write(chunk).unwrap();
    }

    assert_eq!(read_until(&server, 6, Duration::from_secs(2)), b"abcdef");
}

#[test]
fn window_saturation_rejects_until_acks_drain_it() {
    let config = YaruConfig {
        window_size: 2,
        timeout: Duration::from_secs(5),
    };

    let server = YaruSocket::new().unwrap();
    let server_addr = server.local_addr().unwrap();

    let client = YaruSocket::with_config(config).unwrap();
    client.connect(server_addr).unwrap();

    client.write(b"a").unwrap();
    client.write(b"b").unwrap();
    assert!(matches!(client.write(b"c"), Err(YaruError::SendWindowFull { in_flight: 2 })));

    // Let the server's acks arrive and drain the window.
    let deadline = Instant::now() + Duration::from_secs(2);
    while client.in_flight() >= 2 && Instant::now() < deadline {
        let _ = server.read();
        thread::sleep(Duration::from_millis(5));
    }

    assert!(client.write(b"c").is_ok());
}

#[test]
fn write_without_connect_fails_not_connected() {
    let sock = YaruSocket::new().unwrap();
    assert!(matches!(sock.write(b"x"), Err(YaruError::NotConnected)));
}

#[test]
fn close_stops_the_receive_loop_without_hanging() {
    let sock = YaruSocket::new().unwrap();
    sock.close();
}
