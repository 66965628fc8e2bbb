//! Bench receiver for forwarded scans
//!
//! Binds the port the microcontroller would listen on and logs every
//! datagram it receives, so the ground station can be exercised without the
//! ESP32 on the bench.
//!
//! Port 8889 is also the ground station's own command port, so run this on a
//! separate machine (or change `LISTEN_ADDR` and the scan peer together).

use scout_shared::codec;
use tokio::net::UdpSocket;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LISTEN_ADDR: &str = "0.0.0.0:8889";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let socket = UdpSocket::bind(LISTEN_ADDR).await?;
    info!("Scan sink listening on {}", LISTEN_ADDR);

    let mut buf = vec![0u8; codec::MAX_DATAGRAM_SIZE];

    loop {
        let (n, from) = socket.recv_from(&mut buf).await?;

        match codec::decode(&buf[..n]) {
            Ok(scan) => {
                let fields = format_fields(&scan.fields);
                info!("[{}] mode={} fields={}", from, scan.mode, fields);
            }
            Err(e) => {
                warn!("[{}] Dropped {} byte datagram: {}", from, n, e);
            }
        }
    }
}

fn format_fields(fields: &codec::FieldMap) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}
