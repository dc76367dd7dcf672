//! Sends a counter frame every 100ms through a UDP tunnel and prints whatever comes back.
//!
//! Run two copies with swapped addresses to have them talk to each other:
//!
//! ```text
//! cargo run --example simple -- 127.0.0.1:20000 127.0.0.1:20001
//! cargo run --example simple -- 127.0.0.1:20001 127.0.0.1:20000
//! ```
use canlink::transport::udp::{TunnelConfig, UdpTunnel};
use canlink::{FrameTransport, NodeId, TransportConfig};

#[path = "_logging.rs"]
mod logging;

const NODE: NodeId = NodeId(0);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("simple", 2);

    let mut args = std::env::args().skip(1);
    let local: std::net::SocketAddr = args.next().unwrap_or_else(|| "127.0.0.1:20000".into()).parse()?;
    let remote: std::net::SocketAddr = args.next().unwrap_or_else(|| "127.0.0.1:20001".into()).parse()?;

    let config = TransportConfig::default()
        .with_physical(false)
        .with_tunnel(true)
        .with_trace(true);
    let mut bus =
        FrameTransport::new(config).tunnel(UdpTunnel::new(TunnelConfig::new(local, remote)));
    bus.initialize(1)?;

    let mut counter = 0u32;
    loop {
        // keep-alives hold the gateway link open and never reach the peer application
        if counter % 10 == 0 {
            bus.send(NODE, canlink::SENTINEL_ID, &[], 0)?;
        }
        let data = counter.to_be_bytes();
        if let Err(e) = bus.send(NODE, 0x18FF_0080, &data, 4) {
            log::warn!("send failed ({}): {e}", e.code());
        }
        while let Some(frame) = bus.receive(NODE) {
            log::info!("received {frame}");
        }
        log::debug!("free send slots: {}", bus.free_send_capacity(NODE));
        std::thread::sleep(std::time::Duration::from_millis(100));
        counter = counter.wrapping_add(1);
    }
}
