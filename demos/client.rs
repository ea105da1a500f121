//! Sends one file over YARU, mirroring the Python reference's
//! `file_transfer.py` sender role.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::info;

use yaru::packet::MAX_DATA_SIZE;
use yaru::{YaruError, YaruSocket};

const NAME_MARKER: &[u8] = b":name:";
const END_MARKER: &[u8] = b":end:";

#[derive(Parser)]
#[command(about = "Send a file over YARU")]
struct Args {
    /// Address to connect to.
    #[arg(short, long, default_value = "127.0.0.1")]
    address: Ipv4Addr,

    /// Receiver port.
    #[arg(short, long, default_value_t = 1060)]
    port: u16,

    /// File to send.
    file: PathBuf,
}

fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let sock = YaruSocket::new()?;
    sock.connect((IpAddr::V4(args.address), args.port))?;

    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_owned();
    info!("sending {file_name}");

    write_retrying(&sock, &[NAME_MARKER, file_name.as_bytes()].concat());

    let data = fs::read(&args.file)?;
    let total_size = data.len();
    for chunk in data.chunks(MAX_DATA_SIZE) {
        write_retrying(&sock, chunk);
    }
    write_retrying(&sock, END_MARKER);

    info!("completed sending {file_name}, {total_size} bytes");
    Ok(())
}

/// Retries on `SendWindowFull` until the window drains, matching the
/// `except Exception: time.sleep(1)` loop in the reference sender.
fn write_retrying(sock: &YaruSocket, data: &[u8]) {
    loop {
        match sock.write(data) {
            Ok(_) => return,
            Err(YaruError::SendWindowFull { .. }) => thread::sleep(Duration::from_secs(1)),
            Err(err) => panic!("write failed: {err}"),
        }
    }
}
