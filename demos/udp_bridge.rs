//! Bridges two CAN segments. With the `socketcan` feature the physical side is a SocketCAN
//! interface; without it, both sides are UDP tunnels, which is enough to watch the bridge
//! work on one machine.
//!
//! ```text
//! cargo run --example udp_bridge --features socketcan -- can0 0.0.0.0:20000 192.168.4.1:20000
//! cargo run --example udp_bridge -- 127.0.0.1:21000 127.0.0.1:21001 127.0.0.1:20000 127.0.0.1:20001
//! ```
use canlink::transport::udp::{TunnelConfig, UdpTunnel};
use canlink::{FrameTransport, NodeId, TransportConfig};

#[path = "_logging.rs"]
mod logging;

const NODE: NodeId = NodeId(0);

fn parse(arg: Option<String>, default: &str) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
    arg.unwrap_or_else(|| default.into()).parse()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("udp_bridge", 1);
    let mut args = std::env::args().skip(1);

    let config = TransportConfig::default()
        .with_physical(true)
        .with_tunnel(true)
        .with_bridge(true);
    let bus = FrameTransport::new(config);

    #[cfg(all(target_os = "linux", feature = "socketcan"))]
    let bus = bus.physical(canlink::transport::socketcan::SocketCan::new(
        args.next().unwrap_or_else(|| "can0".into()),
    ));
    #[cfg(not(all(target_os = "linux", feature = "socketcan")))]
    let bus = bus.physical(UdpTunnel::new(TunnelConfig::new(
        parse(args.next(), "127.0.0.1:21000")?,
        parse(args.next(), "127.0.0.1:21001")?,
    )));

    let local = parse(args.next(), "0.0.0.0:20000")?;
    let remote = parse(args.next(), "127.0.0.1:20001")?;
    let mut bus = bus.tunnel(UdpTunnel::new(TunnelConfig::new(local, remote)));
    bus.initialize(1)?;

    let mut forwarded = 0u64;
    loop {
        match bus.receive(NODE) {
            Some(frame) => {
                forwarded += 1;
                log::debug!("#{forwarded} {frame}");
            }
            None => std::thread::sleep(std::time::Duration::from_millis(1)),
        }
    }
}
