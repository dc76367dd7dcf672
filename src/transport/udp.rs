//! CAN over UDP. Each frame travels as one datagram to a fixed peer, typically a CAN-to-IP
//! gateway or another node running this backend.
//!
//! Datagram layout (big-endian):
//!
//! | offset | size | field                              |
//! |--------|------|------------------------------------|
//! | 0      | 1    | kind, `0x01` frame / `0x02` keep-alive |
//! | 1      | 1    | flags, bit 0 = extended identifier |
//! | 2      | 4    | identifier                         |
//! | 6      | 1    | length field                       |
//! | 7      | 8    | payload                            |
//!
//! A keep-alive datagram is the kind byte alone and stands for a frame carrying
//! [`crate::SENTINEL_ID`].

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use byteorder::{BigEndian, ByteOrder};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::config::{BackendConfig, FilterConfig, Mode};
use crate::error::{BackendError, CodecError};
use crate::frame::{Frame, MAX_DATA_LEN};
use crate::transport::{Backend, BackendStatus};

/// Size of an encoded frame datagram.
pub const FRAME_DATAGRAM_LEN: usize = 7 + MAX_DATA_LEN;

const FLAG_EXTENDED: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
enum DatagramKind {
    Frame = 0x01,
    KeepAlive = 0x02,
}

/// Encodes a frame into a datagram.
pub fn encode(frame: &Frame) -> Vec<u8> {
    if frame.is_sentinel() {
        return vec![DatagramKind::KeepAlive as u8];
    }
    let mut buf = vec![0u8; FRAME_DATAGRAM_LEN];
    buf[0] = DatagramKind::Frame as u8;
    buf[1] = if frame.is_extended() { FLAG_EXTENDED } else { 0 };
    BigEndian::write_u32(&mut buf[2..6], frame.id());
    buf[6] = frame.len();
    buf[7..].copy_from_slice(frame.raw_data());
    buf
}

/// Decodes a datagram produced by [`encode`].
pub fn decode(buf: &[u8]) -> Result<Frame, CodecError> {
    let kind = *buf.first().ok_or(CodecError::Truncated { len: 0 })?;
    match DatagramKind::from_u8(kind).ok_or(CodecError::UnknownKind(kind))? {
        DatagramKind::KeepAlive => Ok(Frame::keep_alive()),
        DatagramKind::Frame => {
            if buf.len() < FRAME_DATAGRAM_LEN {
                return Err(CodecError::Truncated { len: buf.len() });
            }
            Ok(Frame::new(
                BigEndian::read_u32(&buf[2..6]),
                buf[1] & FLAG_EXTENDED != 0,
                &buf[7..FRAME_DATAGRAM_LEN],
                buf[6],
            ))
        }
    }
}

/// Addresses of a tunnel endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunnelConfig {
    /// Address the local socket binds to.
    pub local: SocketAddr,
    /// Address every frame is sent to.
    pub remote: SocketAddr,
}

impl TunnelConfig {
    /// Creates a new [`TunnelConfig`].
    pub fn new(local: SocketAddr, remote: SocketAddr) -> Self {
        Self { local, remote }
    }
}

/// Tunneled backend over a non-blocking UDP socket.
///
/// Datagrams the socket cannot take immediately wait in an outbound queue bounded by
/// `tx_queue_len`; that queue is what [`Backend::status`] reports as pending.
#[derive(Debug)]
pub struct UdpTunnel {
    config: TunnelConfig,
    socket: Option<UdpSocket>,
    started: bool,
    outbound: VecDeque<Vec<u8>>,
    tx_queue_len: usize,
    filter: FilterConfig,
    mode: Mode,
}

impl UdpTunnel {
    /// Creates an uninstalled tunnel.
    pub fn new(config: TunnelConfig) -> Self {
        Self {
            config,
            socket: None,
            started: false,
            outbound: VecDeque::new(),
            tx_queue_len: 0,
            filter: FilterConfig::accept_all(),
            mode: Mode::Normal,
        }
    }

    /// The bound address, once installed.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn running_socket(&self) -> Result<&UdpSocket, BackendError> {
        let socket = self.socket.as_ref().ok_or(BackendError::NotInstalled)?;
        if !self.started {
            return Err(BackendError::NotStarted);
        }
        Ok(socket)
    }

    /// Sends queued datagrams until the socket pushes back.
    fn flush(&mut self) -> Result<(), BackendError> {
        let socket = self.socket.as_ref().ok_or(BackendError::NotInstalled)?;
        if !self.started {
            return Err(BackendError::NotStarted);
        }
        while let Some(datagram) = self.outbound.front() {
            match socket.send_to(datagram, self.config.remote) {
                Ok(_) => {
                    self.outbound.pop_front();
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl Backend for UdpTunnel {
    fn install(&mut self, config: &BackendConfig) -> Result<(), BackendError> {
        if self.socket.is_some() {
            return Err(BackendError::AlreadyInstalled);
        }
        let socket = UdpSocket::bind(self.config.local)?;
        socket.set_nonblocking(true)?;
        log::debug!(
            "tunnel bound to {:?}, peer {}",
            socket.local_addr().ok(),
            self.config.remote
        );
        self.socket = Some(socket);
        self.tx_queue_len = config.general.tx_queue_len;
        self.filter = config.filter;
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
        self.outbound.clear();
        Ok(())
    }

    fn uninstall(&mut self) -> Result<(), BackendError> {
        if self.socket.take().is_none() {
            return Err(BackendError::NotInstalled);
        }
        self.started = false;
        self.outbound.clear();
        Ok(())
    }

    fn transmit(&mut self, frame: &Frame) -> Result<(), BackendError> {
        if self.mode == Mode::ListenOnly {
            return Err(BackendError::ListenOnly);
        }
        self.flush()?;
        let datagram = encode(frame);
        if self.outbound.is_empty() {
            let socket = self.running_socket()?;
            match socket.send_to(&datagram, self.config.remote) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => return Err(e.into()),
            }
        }
        if self.outbound.len() >= self.tx_queue_len {
            return Err(BackendError::QueueFull {
                capacity: self.tx_queue_len,
            });
        }
        self.outbound.push_back(datagram);
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Frame>, BackendError> {
        if let Err(e) = self.flush() {
            log::debug!("tunnel flush failed: {e}");
        }
        let socket = self.running_socket()?;
        let mut buf = [0u8; 64];
        loop {
            let (n, from) = match socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let frame = decode(&buf[..n]).inspect_err(|e| {
                log::debug!("malformed datagram from {from}: {e} [{}]", hex::encode(&buf[..n]));
            })?;
            if frame.is_sentinel() || self.filter.accepts(frame.id()) {
                return Ok(Some(frame));
            }
        }
    }

    fn status(&self) -> Result<BackendStatus, BackendError> {
        if self.socket.is_none() {
            return Err(BackendError::NotInstalled);
        }
        Ok(BackendStatus {
            pending_tx: self.outbound.len(),
            pending_rx: 0,
        })
    }
}
