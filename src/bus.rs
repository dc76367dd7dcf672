use std::fmt;

use crate::config::{ReceivePriority, TransportConfig};
use crate::error::Error;
use crate::frame::{Direction, Frame, NodeId};
use crate::trace::{FrameTracer, LogTracer};
use crate::transport::{Backend, BackendKind};

/// A backend plus the lifecycle state the transport tracks for it.
struct Slot {
    kind: BackendKind,
    backend: Box<dyn Backend>,
    installed: bool,
    started: bool,
}

impl Slot {
    fn new(kind: BackendKind, backend: Box<dyn Backend>) -> Self {
        Self {
            kind,
            backend,
            installed: false,
            started: false,
        }
    }

    /// Stops and uninstalls, logging failures.
    fn shutdown(&mut self) {
        if self.started {
            match self.backend.stop() {
                Ok(()) => log::info!("{}: driver stopped", self.kind),
                Err(e) => log::error!("{}: stop failed: {e}", self.kind),
            }
            self.started = false;
        }
        if self.installed {
            match self.backend.uninstall() {
                Ok(()) => log::info!("{}: driver uninstalled", self.kind),
                Err(e) => log::error!("{}: uninstall failed: {e}", self.kind),
            }
            self.installed = false;
        }
    }
}

/// One logical CAN node served by up to two backends.
///
/// Every operation is a single non-blocking attempt; nothing is retried.
///
/// ```rust
/// use canlink::{FrameTransport, TransportConfig};
///
/// // Nothing attached and nothing enabled: a node that never sees traffic.
/// let mut bus = FrameTransport::new(TransportConfig::default().with_physical(false));
/// bus.initialize(1).expect("no backend to fail");
/// bus.shutdown();
/// ```
pub struct FrameTransport {
    config: TransportConfig,
    physical: Option<Slot>,
    tunnel: Option<Slot>,
    tracer: Box<dyn FrameTracer>,
    initialized: bool,
    max_nodes: u8,
}

impl fmt::Debug for FrameTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTransport")
            .field("config", &self.config)
            .field("physical", &self.physical.as_ref().map(|s| s.started))
            .field("tunnel", &self.tunnel.as_ref().map(|s| s.started))
            .field("initialized", &self.initialized)
            .field("max_nodes", &self.max_nodes)
            .finish()
    }
}

impl FrameTransport {
    /// Creates a transport with no backend attached yet.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            physical: None,
            tunnel: None,
            tracer: Box::new(LogTracer),
            initialized: false,
            max_nodes: 0,
        }
    }

    /// Attaches the physical bus backend. Ignored unless `enable_physical` is set.
    pub fn physical<B: Backend + 'static>(mut self, backend: B) -> Self {
        self.physical = Some(Slot::new(BackendKind::Physical, Box::new(backend)));
        self
    }

    /// Attaches the tunneled backend. Ignored unless `enable_tunnel` is set.
    pub fn tunnel<B: Backend + 'static>(mut self, backend: B) -> Self {
        self.tunnel = Some(Slot::new(BackendKind::Tunneled, Box::new(backend)));
        self
    }

    /// Replaces the [`LogTracer`] used when tracing is enabled.
    pub fn with_tracer<T: FrameTracer + 'static>(mut self, tracer: T) -> Self {
        self.tracer = Box::new(tracer);
        self
    }

    /// The configuration this transport was built with.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Node count recorded by the last [`FrameTransport::initialize`].
    pub fn max_nodes(&self) -> u8 {
        self.max_nodes
    }

    /// True between a successful [`FrameTransport::initialize`] and [`FrameTransport::shutdown`].
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Installs, then starts, every enabled backend.
    ///
    /// A failure is returned instead of aborting the process. Backends touched by the failed
    /// call are stopped and uninstalled again before returning, so the call can be retried.
    pub fn initialize(&mut self, max_nodes: u8) -> Result<(), Error> {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        if self.config.enable_physical && self.physical.is_none() {
            return Err(Error::MissingBackend(BackendKind::Physical));
        }
        if self.config.enable_tunnel && self.tunnel.is_none() {
            return Err(Error::MissingBackend(BackendKind::Tunneled));
        }

        if let Err(e) = self.bring_up() {
            self.release();
            return Err(e);
        }
        self.max_nodes = max_nodes;
        self.initialized = true;
        Ok(())
    }

    fn bring_up(&mut self) -> Result<(), Error> {
        let config = self.config.backend.clone();
        for slot in self.enabled_slots() {
            slot.backend
                .install(&config)
                .map_err(|source| Error::Install {
                    kind: slot.kind,
                    source,
                })?;
            slot.installed = true;
            log::info!("{}: driver installed", slot.kind);
        }
        for slot in self.enabled_slots() {
            slot.backend.start().map_err(|source| Error::Start {
                kind: slot.kind,
                source,
            })?;
            slot.started = true;
            log::info!("{}: driver started", slot.kind);
        }
        Ok(())
    }

    fn release(&mut self) {
        for slot in [self.physical.as_mut(), self.tunnel.as_mut()].into_iter().flatten() {
            slot.shutdown();
        }
    }

    /// Stops and uninstalls every running backend. Failures are logged, never returned.
    ///
    /// Calling it again, or before [`FrameTransport::initialize`], does nothing.
    pub fn shutdown(&mut self) {
        self.release();
        self.initialized = false;
    }

    /// Sends an extended-identifier frame on every active backend.
    ///
    /// At most eight bytes of `data` are copied; `len` is passed on untouched. Returns
    /// [`Error::Overflow`] only when every active backend rejected the frame.
    pub fn send(&mut self, node: NodeId, id: u32, data: &[u8], len: u8) -> Result<(), Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        let frame = Frame::extended(id, data, len);
        if self.config.trace {
            self.tracer.trace(node, Direction::Tx, &frame);
        }

        let mut attempted = 0;
        let mut failed = 0;
        for slot in self.active_slots() {
            attempted += 1;
            if let Err(e) = slot.backend.transmit(&frame) {
                failed += 1;
                log::error!(
                    "{}: Tx error: {:x} {:x} Error: {e}",
                    slot.kind,
                    frame.id(),
                    frame.raw_data()[0]
                );
            }
        }

        if attempted > 0 && failed == attempted {
            log::debug!("Tx error: {:x} {:x}", frame.id(), frame.raw_data()[0]);
            return Err(Error::Overflow);
        }
        Ok(())
    }

    /// Polls the active backends in priority order and returns the first frame found.
    ///
    /// Keep-alive frames are dropped and the poll moves on to the next backend. With bridging
    /// enabled, a delivered frame is first forwarded to the other backend.
    pub fn receive(&mut self, node: NodeId) -> Option<Frame> {
        let order = match self.config.priority {
            ReceivePriority::PhysicalFirst => [BackendKind::Physical, BackendKind::Tunneled],
            ReceivePriority::TunnelFirst => [BackendKind::Tunneled, BackendKind::Physical],
        };

        let mut received = None;
        for kind in order {
            let Some(slot) = self.active_slot(kind) else {
                continue;
            };
            match slot.backend.receive() {
                Ok(Some(frame)) if frame.is_sentinel() => {
                    log::debug!("{kind}: dropping keep-alive frame");
                }
                Ok(Some(frame)) => {
                    received = Some((kind, frame));
                    break;
                }
                Ok(None) => {}
                Err(e) => log::warn!("{kind}: Rx error: {e}"),
            }
        }

        let (source, frame) = received?;
        if self.config.enable_bridge {
            if let Some(target) = self.active_slot(source.other()) {
                if let Err(e) = target.backend.transmit(&frame) {
                    log::warn!("{}: bridge Tx error: {:x} {e}", target.kind, frame.id());
                }
            }
        }
        if self.config.trace {
            self.tracer.trace(node, Direction::Rx, &frame);
        }
        Some(frame)
    }

    /// Free transmit slots summed across the active backends.
    ///
    /// Advisory only: the backends may drain or fill their queues right after the call.
    pub fn free_send_capacity(&self, _node: NodeId) -> usize {
        let depth = self.config.backend.general.tx_queue_len;
        [self.physical.as_ref(), self.tunnel.as_ref()]
            .into_iter()
            .flatten()
            .filter(|slot| slot.started)
            .map(|slot| match slot.backend.status() {
                Ok(status) => depth.saturating_sub(status.pending_tx),
                Err(e) => {
                    log::warn!("{}: status error: {e}", slot.kind);
                    0
                }
            })
            .sum()
    }

    fn enabled_slots(&mut self) -> impl Iterator<Item = &mut Slot> {
        let (physical, tunnel) = (self.config.enable_physical, self.config.enable_tunnel);
        [
            self.physical.as_mut().filter(|_| physical),
            self.tunnel.as_mut().filter(|_| tunnel),
        ]
        .into_iter()
        .flatten()
    }

    fn active_slot(&mut self, kind: BackendKind) -> Option<&mut Slot> {
        let slot = match kind {
            BackendKind::Physical => self.physical.as_mut(),
            BackendKind::Tunneled => self.tunnel.as_mut(),
        };
        slot.filter(|s| s.started)
    }

    fn active_slots(&mut self) -> impl Iterator<Item = &mut Slot> {
        [self.physical.as_mut(), self.tunnel.as_mut()]
            .into_iter()
            .flatten()
            .filter(|slot| slot.started)
    }
}

impl Drop for FrameTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}
