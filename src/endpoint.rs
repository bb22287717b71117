use super::{fifo::Fifo, packet::Packet};

/// A packet paired with the simulated time at which it becomes
/// eligible for delivery to the neighboring fabric.
#[derive(Debug, Clone)]
pub struct DeferredPacket {
    pub ready: u64,
    pub packet: Packet,
}

impl std::fmt::Display for DeferredPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.packet, self.ready)
    }
}

/// Host-facing side of the bridge.
///
/// Owns the host-bound transmit queue (responses traveling back into
/// the host fabric) and the response accounting that bounds buffering:
/// every accepted request that owes a response reserves one slot until
/// that response is delivered.
#[derive(Debug)]
pub struct HostEndpoint {
    /// Deferred responses awaiting delivery to the host peer.
    pub xmit: Fifo<DeferredPacket>,
    /// Host requests absorbed while the forward path was blocked.
    pub backlog: Fifo<Packet>,
    pub outstanding_responses: usize,
    pub resp_limit: usize,
    /// Head of `xmit` was rejected by the host peer; delivery resumes
    /// on its retry signal.
    pub retry_pending: bool,
    /// Host producer is stalled and must be notified when the forward
    /// path unblocks.
    pub waiting: bool,
}

impl HostEndpoint {
    #[must_use]
    pub fn new(queue_capacity: usize, resp_limit: usize) -> Self {
        Self {
            xmit: Fifo::new(Some(queue_capacity)),
            backlog: Fifo::new(None),
            outstanding_responses: 0,
            resp_limit,
            retry_pending: false,
            waiting: false,
        }
    }

    #[must_use]
    pub fn response_space_available(&self) -> bool {
        self.outstanding_responses < self.resp_limit
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        !self.xmit.is_empty() || !self.backlog.is_empty() || self.outstanding_responses > 0
    }
}

/// Device-facing side of the bridge.
///
/// Mirror of [`HostEndpoint`] for the device-bound transmit queue
/// (requests traveling into the device fabric); the device side does
/// no response accounting.
#[derive(Debug)]
pub struct DeviceEndpoint {
    /// Deferred requests awaiting delivery to the device peer.
    pub xmit: Fifo<DeferredPacket>,
    /// Device responses absorbed while the forward path was blocked.
    pub backlog: Fifo<Packet>,
    pub retry_pending: bool,
    pub waiting: bool,
}

impl DeviceEndpoint {
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            xmit: Fifo::new(Some(queue_capacity)),
            backlog: Fifo::new(None),
            retry_pending: false,
            waiting: false,
        }
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        !self.xmit.is_empty() || !self.backlog.is_empty()
    }
}
