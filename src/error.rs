use thiserror::Error;

use crate::transport::BackendKind;

/// Legacy status code reported when every active backend rejected a frame.
pub const E_OVERFLOW: i16 = -6;

/// Errors surfaced across the [`crate::FrameTransport`] boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// A backend driver refused to install. Fatal for the node: nothing was started.
    #[error("{kind} backend failed to install: {source}")]
    Install {
        /// The backend that failed.
        kind: BackendKind,
        /// The driver status.
        #[source]
        source: BackendError,
    },
    /// A backend driver installed but refused to start.
    #[error("{kind} backend failed to start: {source}")]
    Start {
        /// The backend that failed.
        kind: BackendKind,
        /// The driver status.
        #[source]
        source: BackendError,
    },
    /// The configuration enables a backend that was never attached.
    #[error("{0} backend is enabled but none was attached")]
    MissingBackend(BackendKind),
    /// [`crate::FrameTransport::initialize`] was called on a running transport.
    #[error("transport already initialized")]
    AlreadyInitialized,
    /// No backend is running.
    #[error("transport not initialized")]
    NotInitialized,
    /// Every active backend rejected the frame.
    #[error("transmit overflow: every active backend rejected the frame")]
    Overflow,
}

impl Error {
    /// The numeric status code this error maps to in the legacy C driver API.
    ///
    /// [`Error::Overflow`] maps to [`E_OVERFLOW`]; initialization failures map to `-1`
    /// and state errors to `-2`.
    pub fn code(&self) -> i16 {
        match self {
            Error::Overflow => E_OVERFLOW,
            Error::Install { .. } | Error::Start { .. } | Error::MissingBackend(_) => -1,
            Error::AlreadyInitialized | Error::NotInitialized => -2,
        }
    }
}

/// Status reported by a backend driver. Any `Err` counts as a backend failure.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Socket or device errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The driver was used before [`crate::Backend::install`].
    #[error("driver not installed")]
    NotInstalled,
    /// The driver is installed but stopped.
    #[error("driver not started")]
    NotStarted,
    /// [`crate::Backend::install`] was called twice.
    #[error("driver already installed")]
    AlreadyInstalled,
    /// The driver runs in listen-only mode and cannot transmit.
    #[error("driver is listen-only")]
    ListenOnly,
    /// The outbound queue holds `capacity` frames already.
    #[error("transmit queue full ({capacity} frames)")]
    QueueFull {
        /// Configured outbound queue depth.
        capacity: usize,
    },
    /// The driver could not represent the frame (e.g. identifier out of range).
    #[error("invalid frame")]
    InvalidFrame,
    /// A tunnel datagram could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Errors decoding a tunnel datagram.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// The datagram is shorter than its kind requires.
    #[error("datagram truncated: {len} bytes")]
    Truncated {
        /// Bytes actually received.
        len: usize,
    },
    /// The leading kind byte is unknown.
    #[error("unknown datagram kind: {0:#04x}")]
    UnknownKind(u8),
}
