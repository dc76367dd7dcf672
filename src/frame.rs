//! Classic CAN frames as handed between the application, the transport and its backends.

use std::fmt;

use itertools::Itertools;

/// Maximum number of payload bytes in a classic CAN frame.
pub const MAX_DATA_LEN: usize = 8;

/// Reserved keep-alive identifier. Frames carrying it are never delivered to callers.
pub const SENTINEL_ID: u32 = 0xCCCC_CCCC;

/// Logical identifier of a CAN interface instance.
///
/// Only carried into diagnostics for now; a transport serves a single interface.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u8);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:2}", self.0)
    }
}

/// Which way a frame travelled, used by [`crate::FrameTracer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received from a backend.
    Rx,
    /// Handed to the backends for transmission.
    Tx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Rx => f.write_str("Rx"),
            Direction::Tx => f.write_str("Tx"),
        }
    }
}

/// A single CAN frame.
///
/// The payload is stored in a fixed 8 byte buffer. The length field is kept exactly as
/// supplied, so it may exceed [`MAX_DATA_LEN`] even though at most eight bytes are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    id: u32,
    extended: bool,
    data: [u8; MAX_DATA_LEN],
    len: u8,
}

impl Frame {
    /// Builds a frame, copying at most [`MAX_DATA_LEN`] bytes of `data`.
    pub fn new(id: u32, extended: bool, data: &[u8], len: u8) -> Self {
        let mut buf = [0u8; MAX_DATA_LEN];
        let n = data.len().min(MAX_DATA_LEN);
        buf[..n].copy_from_slice(&data[..n]);
        Self {
            id,
            extended,
            data: buf,
            len,
        }
    }

    /// Builds a frame with the 29-bit (extended) identifier flag set.
    pub fn extended(id: u32, data: &[u8], len: u8) -> Self {
        Self::new(id, true, data, len)
    }

    /// The keep-alive frame used to hold a link open.
    pub fn keep_alive() -> Self {
        Self::extended(SENTINEL_ID, &[], 0)
    }

    /// The raw identifier.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Whether the identifier is in extended (29-bit) format.
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// The length field as supplied by the sender.
    pub fn len(&self) -> u8 {
        self.len
    }

    /// True when the length field is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The payload bytes covered by the length field, at most eight.
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.len).min(MAX_DATA_LEN)]
    }

    /// The full 8 byte payload buffer, including bytes past the length field.
    pub fn raw_data(&self) -> &[u8; MAX_DATA_LEN] {
        &self.data
    }

    /// True for the reserved keep-alive identifier.
    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:8x} {} {:02x}",
            self.id,
            self.len,
            self.payload().iter().format(" ")
        )
    }
}
