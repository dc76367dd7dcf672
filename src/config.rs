//! Transport and backend configuration.
//!
//! The defaults reproduce the reference node: 250 kbit/s, accept-all filter, normal mode,
//! 150 frame outbound and 1000 frame inbound queues, physical bus only.

/// Which backend is polled first by [`crate::FrameTransport::receive`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReceivePriority {
    /// Physical bus before the tunnel.
    #[default]
    PhysicalFirst,
    /// Tunnel before the physical bus.
    TunnelFirst,
}

/// Configuration of a [`crate::FrameTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Use the physical bus backend.
    pub enable_physical: bool,
    /// Use the tunneled backend.
    pub enable_tunnel: bool,
    /// Forward every delivered frame onto the other backend.
    pub enable_bridge: bool,
    /// Receive poll order.
    pub priority: ReceivePriority,
    /// Trace every sent and delivered frame through the configured [`crate::FrameTracer`].
    pub trace: bool,
    /// Driver parameters handed to each backend on install.
    pub backend: BackendConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            enable_physical: true,
            enable_tunnel: false,
            enable_bridge: false,
            priority: ReceivePriority::default(),
            trace: false,
            backend: BackendConfig::default(),
        }
    }
}

impl TransportConfig {
    /// Enables or disables the physical bus backend.
    pub fn with_physical(mut self, enable: bool) -> Self {
        self.enable_physical = enable;
        self
    }

    /// Enables or disables the tunneled backend.
    pub fn with_tunnel(mut self, enable: bool) -> Self {
        self.enable_tunnel = enable;
        self
    }

    /// Enables or disables bridging between the two backends.
    pub fn with_bridge(mut self, enable: bool) -> Self {
        self.enable_bridge = enable;
        self
    }

    /// Sets the receive poll order.
    pub fn with_priority(mut self, priority: ReceivePriority) -> Self {
        self.priority = priority;
        self
    }

    /// Enables or disables frame tracing.
    pub fn with_trace(mut self, enable: bool) -> Self {
        self.trace = enable;
        self
    }

    /// Replaces the driver parameters.
    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }
}

/// Driver parameters, the equivalent of the general/timing/filter tables of a CAN controller.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Mode, pins and queue depths.
    pub general: GeneralConfig,
    /// Bit timing.
    pub timing: TimingConfig,
    /// Acceptance filter.
    pub filter: FilterConfig,
}

/// Controller operating mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Transmit, receive and acknowledge.
    #[default]
    Normal,
    /// Transmit without requiring an acknowledge (self test).
    NoAck,
    /// Receive only, never drive the bus.
    ListenOnly,
}

/// Mode, pins and queue depths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralConfig {
    /// Operating mode.
    pub mode: Mode,
    /// Transmit pin, for drivers that own their pins.
    pub tx_io: Option<u8>,
    /// Receive pin, for drivers that own their pins.
    pub rx_io: Option<u8>,
    /// Outbound queue depth in frames.
    pub tx_queue_len: usize,
    /// Inbound queue depth in frames.
    pub rx_queue_len: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            tx_io: Some(21),
            rx_io: Some(22),
            tx_queue_len: 150,
            rx_queue_len: 1000,
        }
    }
}

/// Bit timing as prescaler and segment lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Bus bitrate in bit/s.
    pub bitrate: u32,
    /// Baud rate prescaler.
    pub brp: u32,
    /// Time segment 1 in time quanta.
    pub tseg_1: u8,
    /// Time segment 2 in time quanta.
    pub tseg_2: u8,
    /// Synchronisation jump width.
    pub sjw: u8,
    /// Sample three times instead of once.
    pub triple_sampling: bool,
}

impl TimingConfig {
    const fn preset(bitrate: u32, brp: u32, tseg_1: u8, tseg_2: u8, sjw: u8) -> Self {
        Self {
            bitrate,
            brp,
            tseg_1,
            tseg_2,
            sjw,
            triple_sampling: false,
        }
    }

    /// 25 kbit/s.
    pub const fn kbits_25() -> Self {
        Self::preset(25_000, 128, 16, 8, 3)
    }

    /// 50 kbit/s.
    pub const fn kbits_50() -> Self {
        Self::preset(50_000, 80, 15, 4, 3)
    }

    /// 100 kbit/s.
    pub const fn kbits_100() -> Self {
        Self::preset(100_000, 40, 15, 4, 3)
    }

    /// 125 kbit/s.
    pub const fn kbits_125() -> Self {
        Self::preset(125_000, 32, 15, 4, 3)
    }

    /// 250 kbit/s, the ISO 11783 bus rate.
    pub const fn kbits_250() -> Self {
        Self::preset(250_000, 16, 15, 4, 3)
    }

    /// 500 kbit/s.
    pub const fn kbits_500() -> Self {
        Self::preset(500_000, 8, 15, 4, 3)
    }

    /// 800 kbit/s.
    pub const fn kbits_800() -> Self {
        Self::preset(800_000, 4, 16, 8, 3)
    }

    /// 1 Mbit/s.
    pub const fn mbits_1() -> Self {
        Self::preset(1_000_000, 4, 15, 4, 3)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::kbits_250()
    }
}

/// Acceptance filter in code/mask form. A mask bit set to 1 means "don't care".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Bits that must match.
    pub acceptance_code: u32,
    /// Bits that are ignored.
    pub acceptance_mask: u32,
    /// Use one 32-bit filter instead of two 16-bit filters.
    pub single_filter: bool,
}

impl FilterConfig {
    /// Lets every frame through.
    pub const fn accept_all() -> Self {
        Self {
            acceptance_code: 0,
            acceptance_mask: 0xFFFF_FFFF,
            single_filter: true,
        }
    }

    /// True when `id` passes the filter.
    pub fn accepts(&self, id: u32) -> bool {
        (id ^ self.acceptance_code) & !self.acceptance_mask == 0
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::accept_all()
    }
}
