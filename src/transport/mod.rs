//! A trait for driving a CAN controller (or something pretending to be one) without blocking.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub mod socketcan;
#[cfg(feature = "udp")]
pub mod udp;

use std::fmt;

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::frame::Frame;

/// The two backend slots of a [`crate::FrameTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// A CAN controller on a physical bus.
    Physical,
    /// A bus segment reached through an IP tunnel.
    Tunneled,
}

impl BackendKind {
    /// The opposite slot, the bridging target.
    pub fn other(self) -> Self {
        match self {
            BackendKind::Physical => BackendKind::Tunneled,
            BackendKind::Tunneled => BackendKind::Physical,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Physical => f.write_str("CANBUS"),
            BackendKind::Tunneled => f.write_str("CAN2IP"),
        }
    }
}

/// Queue occupancy reported by a backend.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackendStatus {
    /// Frames accepted by [`Backend::transmit`] that have not left yet.
    pub pending_tx: usize,
    /// Frames waiting to be picked up by [`Backend::receive`].
    pub pending_rx: usize,
}

/// A CAN driver. Every call returns immediately; none of them wait for the bus.
///
/// The lifecycle is `install` → `start` → (`transmit` | `receive` | `status`)* → `stop` →
/// `uninstall`.
pub trait Backend: Send {
    /// Allocates the driver with the given parameters.
    fn install(&mut self, config: &BackendConfig) -> Result<(), BackendError>;

    /// Starts taking part in bus traffic.
    fn start(&mut self) -> Result<(), BackendError>;

    /// Stops taking part in bus traffic.
    fn stop(&mut self) -> Result<(), BackendError>;

    /// Releases the driver.
    fn uninstall(&mut self) -> Result<(), BackendError>;

    /// Queues `frame` for transmission.
    fn transmit(&mut self, frame: &Frame) -> Result<(), BackendError>;

    /// Takes the next received frame, `Ok(None)` when there is none.
    fn receive(&mut self) -> Result<Option<Frame>, BackendError>;

    /// Current queue occupancy.
    fn status(&self) -> Result<BackendStatus, BackendError>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn install(&mut self, config: &BackendConfig) -> Result<(), BackendError> {
        (**self).install(config)
    }

    fn start(&mut self) -> Result<(), BackendError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        (**self).stop()
    }

    fn uninstall(&mut self) -> Result<(), BackendError> {
        (**self).uninstall()
    }

    fn transmit(&mut self, frame: &Frame) -> Result<(), BackendError> {
        (**self).transmit(frame)
    }

    fn receive(&mut self) -> Result<Option<Frame>, BackendError> {
        (**self).receive()
    }

    fn status(&self) -> Result<BackendStatus, BackendError> {
        (**self).status()
    }
}
