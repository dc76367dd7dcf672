//! Two nodes joined by UDP tunnels, with a bridge in the middle.
#![cfg(feature = "udp")]
#![allow(clippy::unwrap_used)]

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use canlink::transport::udp::{TunnelConfig, UdpTunnel};
use canlink::{Frame, FrameTransport, NodeId, TransportConfig};

const NODE: NodeId = NodeId(0);

fn free_addr() -> SocketAddr {
    UdpSocket::bind("127.0.0.1:0").unwrap().local_addr().unwrap()
}

fn tunnel_only(local: SocketAddr, remote: SocketAddr) -> FrameTransport {
    let config = TransportConfig::default()
        .with_physical(false)
        .with_tunnel(true);
    let mut bus = FrameTransport::new(config).tunnel(UdpTunnel::new(TunnelConfig::new(local, remote)));
    bus.initialize(1).unwrap();
    bus
}

fn poll(bus: &mut FrameTransport) -> Option<Frame> {
    for _ in 0..200 {
        if let Some(frame) = bus.receive(NODE) {
            return Some(frame);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    None
}

#[test]
fn frames_cross_a_bridge_but_keep_alives_do_not() {
    // left <-> [bridge: physical side | tunnel side] <-> right
    let (left, bridge_phys, bridge_tun, right) = (free_addr(), free_addr(), free_addr(), free_addr());

    let mut left_node = tunnel_only(left, bridge_phys);
    let mut right_node = tunnel_only(right, bridge_tun);

    let config = TransportConfig::default()
        .with_physical(true)
        .with_tunnel(true)
        .with_bridge(true);
    let mut bridge = FrameTransport::new(config)
        .physical(UdpTunnel::new(TunnelConfig::new(bridge_phys, left)))
        .tunnel(UdpTunnel::new(TunnelConfig::new(bridge_tun, right)));
    bridge.initialize(1).unwrap();
    assert_eq!(bridge.free_send_capacity(NODE), 300);

    left_node.send(NODE, 0x18E7_2680, &[1, 2, 3, 4, 5, 6, 7, 8, 9], 9).unwrap();
    let seen = poll(&mut bridge).unwrap();
    assert_eq!(seen.id(), 0x18E7_2680);
    assert_eq!(seen.len(), 9);

    let delivered = poll(&mut right_node).unwrap();
    assert_eq!(delivered, seen);
    assert_eq!(delivered.payload(), &[1, 2, 3, 4, 5, 6, 7, 8]);

    left_node.send(NODE, canlink::SENTINEL_ID, &[], 0).unwrap();
    assert_eq!(poll(&mut bridge), None);
    assert_eq!(right_node.receive(NODE), None);

    bridge.shutdown();
    bridge.shutdown();
    assert_eq!(bridge.free_send_capacity(NODE), 0);
}
