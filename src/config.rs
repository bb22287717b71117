use super::address;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Construction-time misconfiguration. Fatal: the bridge refuses to
/// operate rather than silently drop traffic.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{queue} queue capacity must be nonzero")]
    ZeroCapacity { queue: &'static str },

    #[error("outstanding-response limit must be nonzero")]
    ZeroResponseLimit,

    #[error("invalid address range {range}")]
    InvalidRange { range: AddressRange },
}

/// A half-open interval `[start, end)` of the physical address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    pub start: address,
    pub end: address,
}

impl AddressRange {
    #[must_use]
    pub fn new(start: address, end: address) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, addr: address) -> bool {
        self.start <= addr && addr < self.end
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start, self.end)
    }
}

/// Bridge configuration, supplied externally and validated once at
/// construction. Latencies are in cycles; capacities never change at
/// runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Link traversal delay per packet.
    pub link_latency: u64,
    /// Protocol-conversion processing delay per packet.
    pub proto_latency: u64,
    /// Device-bound transmit queue depth.
    pub req_queue_capacity: usize,
    /// Host-bound transmit queue depth.
    pub resp_queue_capacity: usize,
    /// Bound on responses accepted but not yet delivered to the host.
    pub resp_limit: usize,
    /// Address intervals the bridge claims on its host-facing side.
    pub ranges: SmallVec<[AddressRange; 4]>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            link_latency: 50,
            proto_latency: 12,
            req_queue_capacity: 128,
            resp_queue_capacity: 128,
            resp_limit: 128,
            ranges: smallvec::smallvec![AddressRange::new(0xC000_0000, 0x1_0000_0000)],
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.req_queue_capacity == 0 {
            return Err(Error::ZeroCapacity { queue: "request" });
        }
        if self.resp_queue_capacity == 0 {
            return Err(Error::ZeroCapacity { queue: "response" });
        }
        if self.resp_limit == 0 {
            return Err(Error::ZeroResponseLimit);
        }
        for range in &self.ranges {
            if range.is_empty() {
                return Err(Error::InvalidRange { range: *range });
            }
        }
        Ok(())
    }

    /// End-to-end forwarding delay applied to every admitted packet.
    #[must_use]
    pub fn total_latency(&self) -> u64 {
        self.link_latency + self.proto_latency
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressRange, Config, Error};

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_capacity_is_fatal() {
        let config = Config { req_queue_capacity: 0, ..Config::default() };
        assert_eq!(
            config.validate(),
            Err(Error::ZeroCapacity { queue: "request" })
        );

        let config = Config { resp_queue_capacity: 0, ..Config::default() };
        assert_eq!(
            config.validate(),
            Err(Error::ZeroCapacity { queue: "response" })
        );

        let config = Config { resp_limit: 0, ..Config::default() };
        assert_eq!(config.validate(), Err(Error::ZeroResponseLimit));
    }

    #[test]
    fn test_inverted_range_is_fatal() {
        let range = AddressRange::new(0x2000, 0x1000);
        let config = Config { ranges: smallvec::smallvec![range], ..Config::default() };
        assert_eq!(config.validate(), Err(Error::InvalidRange { range }));
    }

    #[test]
    fn test_range_containment() {
        let range = AddressRange::new(0xC000_0000, 0x1_0000_0000);
        assert!(range.contains(0xC000_0000));
        assert!(range.contains(0xFFFF_FFFF));
        assert!(!range.contains(0x1_0000_0000));
        assert!(!range.contains(0x8000_0000));
        assert_eq!(range.len(), 0x4000_0000);
    }
}
