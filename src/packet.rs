use super::{address, cmd::Cmd};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic;

/// Role a packet plays on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Request,
    Response,
    /// A probe that queries or invalidates a remote line without
    /// transferring ownership; exempt from response accounting.
    Snoop,
}

/// Which component currently holds a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    INITIALIZED,
    IN_REQUEST_QUEUE,
    IN_RESPONSE_QUEUE,
    IN_HOST_BACKLOG,
    IN_DEVICE_BACKLOG,
    DELIVERED,
    DROPPED,
}

/// An addressed unit of communication crossing the bridge.
///
/// Exactly one component owns a packet at any time; packets move by
/// value along the forwarding path and are never cloned across queues.
#[derive(Debug, Clone)]
pub struct Packet {
    pub uid: u64,
    pub addr: address,
    pub cmd: Cmd,
    pub size: u32,
    pub data: Option<Vec<u8>>,
    pub kind: Kind,

    pub status: Status,
    pub last_status_change: Option<u64>,
    /// Cycle this packet was admitted to a transmit queue.
    pub inject_cycle: Option<u64>,
}

impl Eq for Packet {}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl std::hash::Hash for Packet {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({}@{:#x})", self.kind, self.cmd, self.addr)
    }
}

static PACKET_UID: Lazy<atomic::AtomicU64> = Lazy::new(|| atomic::AtomicU64::new(0));

/// Generate a unique ID identifying one packet across its lifetime.
pub fn generate_uid() -> u64 {
    PACKET_UID.fetch_add(1, atomic::Ordering::SeqCst)
}

#[derive(Debug, Clone)]
pub struct Builder {
    pub addr: address,
    pub cmd: Cmd,
    pub size: u32,
    pub data: Option<Vec<u8>>,
}

impl Builder {
    #[must_use]
    pub fn build(self) -> Packet {
        let kind = if self.cmd.is_response() {
            Kind::Response
        } else {
            Kind::Request
        };
        Packet {
            uid: generate_uid(),
            addr: self.addr,
            cmd: self.cmd,
            size: self.size,
            data: self.data,
            kind,
            status: Status::INITIALIZED,
            last_status_change: None,
            inject_cycle: None,
        }
    }
}

impl From<Builder> for Packet {
    fn from(builder: Builder) -> Self {
        builder.build()
    }
}

impl Packet {
    pub fn set_status(&mut self, status: Status, time: u64) {
        self.status = status;
        self.last_status_change = Some(time);
    }

    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self.kind, Kind::Request | Kind::Snoop)
    }

    #[must_use]
    pub fn is_response(&self) -> bool {
        self.kind == Kind::Response
    }

    #[must_use]
    pub fn is_snoop(&self) -> bool {
        self.kind == Kind::Snoop
    }

    /// Whether forwarding this packet reserves response space.
    #[must_use]
    pub fn needs_response(&self) -> bool {
        !self.is_snoop() && self.cmd.needs_response()
    }
}
