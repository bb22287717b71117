use super::{fifo::Fifo, packet::Packet};

/// Send interface of an external neighbor on either side of the link.
///
/// `try_send` is synchronous and non-blocking: a rejecting peer hands
/// the packet back and promises to signal readiness later (the bridge
/// then re-attempts the same packet, preserving order). `retry_ready`
/// flows the other way: the bridge invokes it on a peer whose earlier
/// push was refused, once it can accept again.
pub trait Peer {
    fn try_send(&mut self, packet: Packet) -> Result<(), Packet>;

    fn retry_ready(&mut self) {}
}

/// Reference peer backed by a bounded queue.
///
/// Accepts packets until full, then rejects; a driver drains it and
/// decides when to signal the bridge to retry. Useful as a stand-in
/// fabric in the demo binary and in tests.
#[derive(Debug)]
pub struct QueuePeer {
    pub queue: Fifo<Packet>,
    /// Set when the bridge signals that a stalled producer may resume.
    pub resume_pending: bool,
}

impl QueuePeer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Fifo::new(Some(capacity)),
            resume_pending: false,
        }
    }

    pub fn pop(&mut self) -> Option<Packet> {
        self.queue.dequeue()
    }

    /// Consume the resume signal, if one arrived.
    pub fn take_resume(&mut self) -> bool {
        std::mem::take(&mut self.resume_pending)
    }
}

impl Peer for QueuePeer {
    fn try_send(&mut self, packet: Packet) -> Result<(), Packet> {
        if self.queue.full() {
            log::debug!("peer busy, rejecting {packet}");
            return Err(packet);
        }
        self.queue.enqueue(packet);
        Ok(())
    }

    fn retry_ready(&mut self) {
        self.resume_pending = true;
    }
}
