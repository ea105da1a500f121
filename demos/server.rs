//! Receives one file over YARU and writes it to `--directory`, mirroring the
//! Python reference's `file_transfer.py` receiver role.

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::info;

use yaru::YaruSocket;

const NAME_MARKER: &[u8] = b":name:";
const END_MARKER: &[u8] = b":end:";

#[derive(Parser)]
#[command(about = "Receive a file sent over YARU")]
struct Args {
    /// Address to bind to.
    #[arg(short, long, default_value = "127.0.0.1")]
    address: Ipv4Addr,

    /// Port to bind to.
    #[arg(short, long, default_value_t = 1060)]
    port: u16,

    /// Directory received files are written into.
    #[arg(short, long, default_value = "received")]
    directory: PathBuf,
}

fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    create_dir_all(&args.directory)?;
    let sock = YaruSocket::bind((IpAddr::V4(args.address), args.port))?;
    info!("receiver bound to {}:{}", args.address, args.port);

    let mut file: Option<File> = None;
    let mut file_name = String::new();
    let mut size = 0u64;
    let mut started = Instant::now();

    loop {
        let data = sock.read();
        if data.is_empty() {
            thread::sleep(if file.is_none() {
                Duration::from_secs(1)
            } else {
                Duration::from_millis(100)
            });
            continue;
        }

        if let Some(name) = data.strip_prefix(NAME_MARKER) {
            file_name = String::from_utf8_lossy(name).into_owned();
            info!("receiving {file_name}");
            file = Some(File::create(args.directory.join(&file_name))?);
            size = 0;
            started = Instant::now();
        } else if data == END_MARKER {
            file = None;
            let elapsed = started.elapsed().as_secs_f64();
            info!(
                "completed receiving {file_name}, {size} bytes, {elapsed:.3}s, speed={:.3} B/s",
                size as f64 / elapsed.max(f64::EPSILON)
            );
        } else if let Some(f) = file.as_mut() {
            size += data.len() as u64;
            f.write_all(&data)?;
        }
    }
}
