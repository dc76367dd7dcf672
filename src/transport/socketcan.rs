//! Physical bus backend on Linux SocketCAN.
//!
//! Bit timing belongs to the network interface (`ip link set can0 type can bitrate 250000`)
//! and is only checked against the configuration in the logs. The kernel transmit queue is
//! not observable, so [`Backend::status`] always reports zero pending frames.

use socketcan::{
    CanFilter, CanFrame, CanSocket, EmbeddedFrame, ExtendedId, Id, Socket, SocketOptions,
    StandardId,
};

use crate::config::{BackendConfig, FilterConfig, Mode};
use crate::error::BackendError;
use crate::frame::Frame;
use crate::transport::{Backend, BackendStatus};

const EFF_FLAG: u32 = 0x8000_0000;

/// A SocketCAN interface such as `can0` or `vcan0`.
///
/// Keep-alive frames only mean something on a tunnel link. They are accepted by
/// [`Backend::transmit`] and dropped without touching the bus.
#[derive(Debug)]
pub struct SocketCan {
    interface: String,
    socket: Option<CanSocket>,
    started: bool,
    mode: Mode,
}

impl SocketCan {
    /// Creates an uninstalled backend for `interface`.
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            socket: None,
            started: false,
            mode: Mode::Normal,
        }
    }

    fn running_socket(&self) -> Result<&CanSocket, BackendError> {
        let socket = self.socket.as_ref().ok_or(BackendError::NotInstalled)?;
        if !self.started {
            return Err(BackendError::NotStarted);
        }
        Ok(socket)
    }

    fn to_socketcan(frame: &Frame) -> Result<CanFrame, BackendError> {
        let id: Id = if frame.is_extended() {
            ExtendedId::new(frame.id()).ok_or(BackendError::InvalidFrame)?.into()
        } else {
            let raw = u16::try_from(frame.id()).map_err(|_| BackendError::InvalidFrame)?;
            StandardId::new(raw).ok_or(BackendError::InvalidFrame)?.into()
        };
        CanFrame::new(id, frame.payload()).ok_or(BackendError::InvalidFrame)
    }

    fn from_socketcan(frame: &CanFrame) -> Frame {
        let data = frame.data();
        let len = u8::try_from(data.len()).unwrap_or(u8::MAX);
        match frame.id() {
            Id::Standard(id) => Frame::new(u32::from(id.as_raw()), false, data, len),
            Id::Extended(id) => Frame::new(id.as_raw(), true, data, len),
        }
    }

    /// Kernel `(can_id, can_mask)` pair for an acceptance filter. Only extended frames pass.
    fn kernel_filter(filter: &FilterConfig) -> (u32, u32) {
        // SocketCAN masks mark the bits that must match, and received ids carry EFF_FLAG
        (
            filter.acceptance_code | EFF_FLAG,
            !filter.acceptance_mask | EFF_FLAG,
        )
    }
}

impl Backend for SocketCan {
    fn install(&mut self, config: &BackendConfig) -> Result<(), BackendError> {
        if self.socket.is_some() {
            return Err(BackendError::AlreadyInstalled);
        }
        let socket = CanSocket::open(&self.interface)?;
        socket.set_nonblocking(true)?;
        if config.filter != FilterConfig::accept_all() {
            let (id, mask) = Self::kernel_filter(&config.filter);
            socket.set_filters(&[CanFilter::new(id, mask)])?;
        }
        log::debug!(
            "{}: opened, expecting {} bit/s",
            self.interface,
            config.timing.bitrate
        );
        self.socket = Some(socket);
        self.mode = config.general.mode;
        Ok(())
    }

    fn start(&mut self) -> Result<(), BackendError> {
        if self.socket.is_none() {
            return Err(BackendError::NotInstalled);
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        if self.socket.is_none() {
            return Err(BackendError::NotInstalled);
        }
        self.started = false;
        Ok(())
    }

    fn uninstall(&mut self) -> Result<(), BackendError> {
        if self.socket.take().is_none() {
            return Err(BackendError::NotInstalled);
        }
        self.started = false;
        Ok(())
    }

    fn transmit(&mut self, frame: &Frame) -> Result<(), BackendError> {
        if frame.is_sentinel() {
            log::debug!("{}: dropping keep-alive frame", self.interface);
            return Ok(());
        }
        if self.mode == Mode::ListenOnly {
            return Err(BackendError::ListenOnly);
        }
        let socket = self.running_socket()?;
        socket.write_frame(&Self::to_socketcan(frame)?)?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Frame>, BackendError> {
        let socket = self.running_socket()?;
        match socket.read_frame() {
            Ok(frame @ CanFrame::Data(_)) => Ok(Some(Self::from_socketcan(&frame))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn status(&self) -> Result<BackendStatus, BackendError> {
        if self.socket.is_none() {
            return Err(BackendError::NotInstalled);
        }
        Ok(BackendStatus::default())
    }
}
