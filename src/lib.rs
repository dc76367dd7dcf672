//! A dual-backend CAN frame transport. One logical CAN node is served by up to two
//! backends (a physical bus and an IP tunnel), with optional bridging between them,
//! send-queue accounting and keep-alive suppression.
//!
//! ```rust,no_run
//! # #[cfg(feature = "udp")]
//! # fn main() -> Result<(), canlink::Error> {
//! use canlink::transport::udp::{TunnelConfig, UdpTunnel};
//! use canlink::{FrameTransport, NodeId, TransportConfig};
//!
//! let config = TransportConfig::default()
//!     .with_physical(false)
//!     .with_tunnel(true);
//! let tunnel = UdpTunnel::new(TunnelConfig::new(
//!     "0.0.0.0:20000".parse().expect("address"),
//!     "192.168.4.1:20000".parse().expect("address"),
//! ));
//! let mut bus = FrameTransport::new(config).tunnel(tunnel);
//! bus.initialize(1)?;
//! bus.send(NodeId(0), 0x18EF_2600, &[0x01, 0x02, 0x03], 3)?;
//! if let Some(frame) = bus.receive(NodeId(0)) {
//!     println!("{frame}");
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "udp"))]
//! # fn main() {}
//! ```

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true
)]
#![deny(
// missing_debug_implementations,
missing_docs,
trivial_casts,
trivial_numeric_casts,
unused_extern_crates,
unused_import_braces,
unused_qualifications,
// unused_results
)]
#![warn(clippy::unwrap_used)]

mod bus;
pub mod config;
mod error;
pub mod frame;
pub mod trace;
pub mod transport;

pub use bus::FrameTransport;
pub use config::{BackendConfig, ReceivePriority, TransportConfig};
pub use error::*;
pub use frame::{Direction, Frame, NodeId, MAX_DATA_LEN, SENTINEL_ID};
pub use trace::{FrameTracer, LogTracer};
pub use transport::{Backend, BackendKind, BackendStatus};
