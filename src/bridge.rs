use super::{
    config::{AddressRange, Config},
    endpoint::{DeferredPacket, DeviceEndpoint, HostEndpoint},
    engine::{Event, EventQueue},
    fifo::Fifo,
    packet::{Kind, Packet, Status},
    port::Peer,
    translate::{translate, Direction},
};
use crate::config;
use console::style;

/// Timing-accurate bridge between a host memory-coherence fabric and a
/// device cache-coherence fabric.
///
/// Owns one endpoint per side, rewrites command verbs as packets cross,
/// and holds every packet in a bounded transmit queue for the link plus
/// protocol-conversion delay before handing it to the opposite peer.
/// Rejected sends stay at the head of their queue and are re-attempted
/// on the peer's retry signal, so per-direction order is never
/// disturbed.
pub struct Bridge<H, D> {
    pub config: Config,
    pub host: HostEndpoint,
    pub device: DeviceEndpoint,
    pub host_peer: H,
    pub device_peer: D,
    events: EventQueue,
    stats: stats::Bridge,
}

impl<H, D> std::fmt::Debug for Bridge<H, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("request_queue", &self.device.xmit.len())
            .field("response_queue", &self.host.xmit.len())
            .field("outstanding", &self.host.outstanding_responses)
            .finish()
    }
}

impl<H, D> Bridge<H, D>
where
    H: Peer,
    D: Peer,
{
    pub fn new(config: Config, host_peer: H, device_peer: D) -> Result<Self, config::Error> {
        config.validate()?;
        for range in &config.ranges {
            log::debug!("bridge claims {range}");
        }
        Ok(Self {
            host: HostEndpoint::new(config.resp_queue_capacity, config.resp_limit),
            device: DeviceEndpoint::new(config.req_queue_capacity),
            host_peer,
            device_peer,
            events: EventQueue::new(),
            stats: stats::Bridge::default(),
            config,
        })
    }

    #[must_use]
    pub fn stats(&self) -> &stats::Bridge {
        &self.stats
    }

    /// Address intervals claimed on the host-facing side.
    #[must_use]
    pub fn address_ranges(&self) -> &[AddressRange] {
        &self.config.ranges
    }

    /// Earliest tick at which the bridge wants to run again.
    #[must_use]
    pub fn next_event_tick(&self) -> Option<u64> {
        self.events.next_tick()
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.host.busy() || self.device.busy()
    }

    /// The host fabric pushes a request into the bridge.
    ///
    /// Returns false when the forward path is blocked; the packet is
    /// absorbed into the host backlog and the producer must hold off
    /// until its `retry_ready` fires.
    pub fn recv_host_request(&mut self, packet: Packet, now: u64) -> bool {
        log::debug!("{}: {packet} at cycle {now}", style("HOST REQ").bold());
        if self.host.waiting {
            // a stall is already in progress; later packets queue up
            // behind it so admission order survives the stall
            return self.stash_host(packet, now);
        }
        if packet.needs_response() && !self.host.response_space_available() {
            self.stats.resp_limit_reached += 1;
            return self.stash_host(packet, now);
        }
        if self.device.xmit.full() {
            self.stats.req_queue_full += 1;
            return self.stash_host(packet, now);
        }
        self.forward_host_to_device(packet, now);
        true
    }

    /// The host fabric pushes a snoop probe into the bridge.
    ///
    /// Probes take the same translate-and-forward path as requests but
    /// reserve no response space.
    pub fn recv_host_snoop(&mut self, mut packet: Packet, now: u64) -> bool {
        packet.kind = Kind::Snoop;
        self.recv_host_request(packet, now)
    }

    /// The device fabric pushes a response back toward the host.
    pub fn recv_device_response(&mut self, packet: Packet, now: u64) -> bool {
        log::debug!("{}: {packet} at cycle {now}", style("DEVICE RESP").bold());
        if self.device.waiting {
            return self.stash_device(packet, now);
        }
        if self.host.xmit.full() {
            self.stats.resp_queue_full += 1;
            return self.stash_device(packet, now);
        }
        self.forward_device_to_host(packet, now);
        true
    }

    /// The device peer rejected an earlier send and is ready again.
    pub fn on_device_retry_ready(&mut self, now: u64) {
        if !self.device.retry_pending {
            return;
        }
        self.device.retry_pending = false;
        self.stats.req_retries += 1;
        log::debug!("{}: retrying request head", style("DEVICE RETRY").bold());
        self.try_send_request(now);
    }

    /// The host peer rejected an earlier send and is ready again.
    pub fn on_host_retry_ready(&mut self, now: u64) {
        if !self.host.retry_pending {
            return;
        }
        self.host.retry_pending = false;
        self.stats.resp_retries += 1;
        log::debug!("{}: retrying response head", style("HOST RETRY").bold());
        self.try_send_response(now);
    }

    /// Run every scheduled delivery whose tick has been reached.
    pub fn process_events(&mut self, now: u64) {
        while let Some(event) = self.events.pop_due(now) {
            match event {
                Event::SendRequest => self.try_send_request(now),
                Event::SendResponse => self.try_send_response(now),
            }
        }
    }

    /// Tear the bridge down, discarding everything still in flight.
    ///
    /// A shutdown condition, not an error: the discarded packets are
    /// returned so the caller can account for them.
    pub fn drain(&mut self, now: u64) -> Vec<Packet> {
        let mut dropped: Vec<Packet> = Vec::new();
        dropped.extend(self.device.xmit.drain().map(|deferred| deferred.packet));
        dropped.extend(self.host.xmit.drain().map(|deferred| deferred.packet));
        dropped.extend(self.host.backlog.drain());
        dropped.extend(self.device.backlog.drain());
        for packet in &mut dropped {
            packet.set_status(Status::DROPPED, now);
        }
        self.events.clear();
        self.host.retry_pending = false;
        self.host.waiting = false;
        self.host.outstanding_responses = 0;
        self.device.retry_pending = false;
        self.device.waiting = false;
        self.stats.dropped_at_teardown += dropped.len() as u64;
        if !dropped.is_empty() {
            log::warn!("teardown discarded {} in-flight packets", dropped.len());
        }
        dropped
    }

    fn stash_host(&mut self, mut packet: Packet, now: u64) -> bool {
        log::debug!("host producer stalled, backlogging {packet}");
        packet.set_status(Status::IN_HOST_BACKLOG, now);
        self.host.backlog.enqueue(packet);
        self.host.waiting = true;
        false
    }

    fn stash_device(&mut self, mut packet: Packet, now: u64) -> bool {
        log::debug!("device producer stalled, backlogging {packet}");
        packet.set_status(Status::IN_DEVICE_BACKLOG, now);
        self.device.backlog.enqueue(packet);
        self.device.waiting = true;
        false
    }

    fn forward_host_to_device(&mut self, mut packet: Packet, now: u64) {
        let translation = translate(packet.cmd, Direction::HostToDevice);
        if !translation.mapped {
            self.stats.untranslated_command(packet.cmd.name());
            log::warn!(
                "no {} translation for {}, forwarding unchanged",
                Direction::HostToDevice,
                packet.cmd
            );
        }
        packet.cmd = translation.cmd;

        if packet.is_snoop() {
            self.stats.snoops_forwarded += 1;
        }
        if packet.needs_response() {
            self.host.outstanding_responses += 1;
            self.stats
                .outstanding_responses
                .sample(self.host.outstanding_responses as u64);
        }

        packet.inject_cycle = Some(now);
        packet.set_status(Status::IN_REQUEST_QUEUE, now);
        let ready = now + self.config.total_latency();
        Self::admit(&mut self.device.xmit, DeferredPacket { ready, packet });
        self.stats
            .req_queue_occupancy
            .sample(self.device.xmit.len() as u64);
        if self.device.xmit.len() == 1 {
            self.events.schedule_at(ready, Event::SendRequest);
        }
    }

    fn forward_device_to_host(&mut self, mut packet: Packet, now: u64) {
        let translation = translate(packet.cmd, Direction::DeviceToHost);
        if !translation.mapped {
            self.stats.untranslated_command(packet.cmd.name());
            log::warn!(
                "no {} translation for {}, forwarding unchanged",
                Direction::DeviceToHost,
                packet.cmd
            );
        }
        packet.cmd = translation.cmd;
        // a writeback leaving the device arrives at the host as a
        // response; the role crosses the link with the verb
        if packet.cmd.is_response() {
            packet.kind = Kind::Response;
        }

        packet.inject_cycle = Some(now);
        packet.set_status(Status::IN_RESPONSE_QUEUE, now);
        let ready = now + self.config.total_latency();
        Self::admit(&mut self.host.xmit, DeferredPacket { ready, packet });
        self.stats
            .resp_queue_occupancy
            .sample(self.host.xmit.len() as u64);
        if self.host.xmit.len() == 1 {
            self.events.schedule_at(ready, Event::SendResponse);
        }
    }

    fn admit(xmit: &mut Fifo<DeferredPacket>, deferred: DeferredPacket) {
        // constant per-direction latency keeps ready ticks monotonic in
        // admission order, so head-readiness implies nothing behind the
        // head is ready earlier
        debug_assert!(xmit
            .iter()
            .last()
            .map_or(true, |last| last.ready <= deferred.ready));
        debug_assert!(!xmit.full());
        xmit.enqueue(deferred);
    }

    fn try_send_request(&mut self, now: u64) {
        let Some(head) = self.device.xmit.first() else {
            return;
        };
        if head.ready > now {
            // woken ahead of the head's ready tick; re-arm and wait
            let ready = head.ready;
            self.events.schedule_at(ready, Event::SendRequest);
            return;
        }
        let DeferredPacket { ready, mut packet } = self.device.xmit.dequeue().unwrap();
        let inject = packet.inject_cycle.unwrap_or(now);
        packet.set_status(Status::DELIVERED, now);
        log::debug!("{}: {packet} at cycle {now}", style("SEND REQ").bold());
        match self.device_peer.try_send(packet) {
            Ok(()) => {
                self.device.retry_pending = false;
                self.stats.req_sent += 1;
                self.stats.req_queue_latency.sample(now.saturating_sub(inject));
                if let Some(next) = self.device.xmit.first() {
                    self.events
                        .schedule_at(next.ready.max(now), Event::SendRequest);
                }
                // queue space freed; replay any stalled host producer
                self.retry_stalled_host(now);
            }
            Err(mut packet) => {
                debug_assert!(!self.device.retry_pending);
                self.stats.req_send_failed += 1;
                log::debug!("device rejected {packet}, holding at head");
                packet.set_status(Status::IN_REQUEST_QUEUE, now);
                self.device.xmit.requeue_front(DeferredPacket { ready, packet });
                self.device.retry_pending = true;
            }
        }
    }

    fn try_send_response(&mut self, now: u64) {
        let Some(head) = self.host.xmit.first() else {
            return;
        };
        if head.ready > now {
            let ready = head.ready;
            self.events.schedule_at(ready, Event::SendResponse);
            return;
        }
        let DeferredPacket { ready, mut packet } = self.host.xmit.dequeue().unwrap();
        let inject = packet.inject_cycle.unwrap_or(now);
        let releases_outstanding = packet.is_response();
        packet.set_status(Status::DELIVERED, now);
        log::debug!("{}: {packet} at cycle {now}", style("SEND RESP").bold());
        match self.host_peer.try_send(packet) {
            Ok(()) => {
                self.host.retry_pending = false;
                self.stats.resp_sent += 1;
                self.stats
                    .resp_queue_latency
                    .sample(now.saturating_sub(inject));
                // unsolicited device markers carry no reservation
                if releases_outstanding && self.host.outstanding_responses > 0 {
                    self.host.outstanding_responses -= 1;
                }
                if let Some(next) = self.host.xmit.first() {
                    self.events
                        .schedule_at(next.ready.max(now), Event::SendResponse);
                }
                // both response-queue space and response accounting may
                // have freed up
                self.retry_stalled_device(now);
                self.retry_stalled_host(now);
            }
            Err(mut packet) => {
                debug_assert!(!self.host.retry_pending);
                self.stats.resp_send_failed += 1;
                log::debug!("host rejected {packet}, holding at head");
                packet.set_status(Status::IN_RESPONSE_QUEUE, now);
                self.host.xmit.requeue_front(DeferredPacket { ready, packet });
                self.host.retry_pending = true;
            }
        }
    }

    /// Replay stalled host requests now that the forward path may have
    /// unblocked; notify the producer once the backlog is clear.
    fn retry_stalled_host(&mut self, now: u64) {
        if !self.host.waiting {
            return;
        }
        while let Some(head) = self.host.backlog.first() {
            if head.needs_response() && !self.host.response_space_available() {
                return;
            }
            if self.device.xmit.full() {
                return;
            }
            let packet = self.host.backlog.dequeue().unwrap();
            log::debug!("replaying backlogged {packet}");
            self.forward_host_to_device(packet, now);
        }
        self.host.waiting = false;
        self.host_peer.retry_ready();
    }

    fn retry_stalled_device(&mut self, now: u64) {
        if !self.device.waiting {
            return;
        }
        while self.device.backlog.first().is_some() {
            if self.host.xmit.full() {
                return;
            }
            let packet = self.device.backlog.dequeue().unwrap();
            log::debug!("replaying backlogged {packet}");
            self.forward_device_to_host(packet, now);
        }
        self.device.waiting = false;
        self.device_peer.retry_ready();
    }
}
