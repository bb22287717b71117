use super::dist::Distribution;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counters and distributions for one protocol bridge.
///
/// The bridge increments these; interpretation and reporting are left
/// to whoever drains them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bridge {
    /// Requests rejected because the device-bound queue was at capacity.
    pub req_queue_full: u64,
    /// Responses rejected because the host-bound queue was at capacity.
    pub resp_queue_full: u64,
    /// Requests rejected because the outstanding-response limit was reached.
    pub resp_limit_reached: u64,
    /// Head-of-queue request sends re-attempted after a peer retry signal.
    pub req_retries: u64,
    /// Head-of-queue response sends re-attempted after a peer retry signal.
    pub resp_retries: u64,
    pub req_send_failed: u64,
    pub resp_send_failed: u64,
    pub req_sent: u64,
    pub resp_sent: u64,
    pub snoops_forwarded: u64,
    /// Packets discarded when the bridge was torn down mid-flight.
    pub dropped_at_teardown: u64,
    /// Commands forwarded unchanged because no translation rule covers
    /// them, keyed by command name.
    pub untranslated: HashMap<String, u64>,

    pub req_queue_occupancy: Distribution,
    pub resp_queue_occupancy: Distribution,
    pub outstanding_responses: Distribution,
    pub req_queue_latency: Distribution,
    pub resp_queue_latency: Distribution,
}

impl Default for Bridge {
    fn default() -> Self {
        Self {
            req_queue_full: 0,
            resp_queue_full: 0,
            resp_limit_reached: 0,
            req_retries: 0,
            resp_retries: 0,
            req_send_failed: 0,
            resp_send_failed: 0,
            req_sent: 0,
            resp_sent: 0,
            snoops_forwarded: 0,
            dropped_at_teardown: 0,
            untranslated: HashMap::new(),
            req_queue_occupancy: Distribution::new(256, 1),
            resp_queue_occupancy: Distribution::new(256, 1),
            outstanding_responses: Distribution::new(256, 1),
            req_queue_latency: Distribution::new(128, 8),
            resp_queue_latency: Distribution::new(128, 8),
        }
    }
}

impl Bridge {
    pub fn untranslated_command(&mut self, name: &str) {
        *self.untranslated.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Total untranslated-command events across all command names.
    #[must_use]
    pub fn num_untranslated(&self) -> u64 {
        self.untranslated.values().sum()
    }
}

impl std::ops::AddAssign for Bridge {
    fn add_assign(&mut self, other: Self) {
        self.req_queue_full += other.req_queue_full;
        self.resp_queue_full += other.resp_queue_full;
        self.resp_limit_reached += other.resp_limit_reached;
        self.req_retries += other.req_retries;
        self.resp_retries += other.resp_retries;
        self.req_send_failed += other.req_send_failed;
        self.resp_send_failed += other.resp_send_failed;
        self.req_sent += other.req_sent;
        self.resp_sent += other.resp_sent;
        self.snoops_forwarded += other.snoops_forwarded;
        self.dropped_at_teardown += other.dropped_at_teardown;
        for (name, count) in other.untranslated {
            *self.untranslated.entry(name).or_insert(0) += count;
        }
        self.req_queue_occupancy += other.req_queue_occupancy;
        self.resp_queue_occupancy += other.resp_queue_occupancy;
        self.outstanding_responses += other.outstanding_responses;
        self.req_queue_latency += other.req_queue_latency;
        self.resp_queue_latency += other.resp_queue_latency;
    }
}

#[cfg(test)]
mod tests {
    use super::Bridge;

    #[test]
    fn test_untranslated_counts() {
        let mut stats = Bridge::default();
        stats.untranslated_command("ReadResp");
        stats.untranslated_command("ReadResp");
        stats.untranslated_command("WriteResp");
        assert_eq!(stats.untranslated["ReadResp"], 2);
        assert_eq!(stats.num_untranslated(), 3);
    }

    #[test]
    fn test_merge() {
        let mut a = Bridge::default();
        let mut b = Bridge::default();
        a.req_sent = 2;
        b.req_sent = 3;
        b.untranslated_command("Go");
        a += b;
        assert_eq!(a.req_sent, 5);
        assert_eq!(a.untranslated["Go"], 1);
    }
}
