//! Fallback IP-range scanning phase.
//!
//! Entered only when the multicast phase finds zero devices. Enumerates
//! the local host's own /24 plus a small fixed list of well-known private
//! ranges, deduplicates addresses across the whole phase, and probes each
//! unique address at most once with a short-timeout device-info request.
//!
//! Probes fan out with a bounded concurrency limit; `buffered` preserves
//! input order, so the result set is independent of probe completion
//! order and reads in address order in the logs.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::device::Device;
use crate::protocol_constants::{FALLBACK_RANGES, SCAN_CONCURRENCY};

/// A single reachability/identity check against one candidate address.
///
/// Implemented by the control-protocol client (a device-info query); the
/// trait seam keeps the scanner testable without a network.
#[async_trait]
pub trait DeviceProber: Send + Sync {
    /// Returns the device at `address` if one answers, `None` otherwise.
    /// Per-probe failures are contained in the implementation; the scan
    /// only ever sees "device or not".
    async fn probe(&self, address: &str, port: u16) -> Option<Device>;
}

/// Enumerates the candidate addresses for one fallback phase.
///
/// The local host's own /24 comes first when known, followed by the fixed
/// private ranges. Each unique address appears exactly once even when it
/// falls in multiple ranges.
pub fn candidate_addresses(local: Option<Ipv4Addr>) -> Vec<Ipv4Addr> {
    let mut seen = HashSet::new();
    let mut addresses = Vec::new();

    let mut push_range = |prefix: [u8; 3]| {
        for host in 1..=254u8 {
            let ip = Ipv4Addr::new(prefix[0], prefix[1], prefix[2], host);
            if seen.insert(ip) {
                addresses.push(ip);
            }
        }
    };

    if let Some(local) = local {
        let octets = local.octets();
        push_range([octets[0], octets[1], octets[2]]);
    }
    for range in FALLBACK_RANGES {
        push_range(*range);
    }

    addresses
}

/// Probes every candidate address and collects the positive results.
pub async fn scan_addresses(
    prober: &dyn DeviceProber,
    addresses: Vec<Ipv4Addr>,
    port: u16,
) -> Vec<Device> {
    let total = addresses.len();
    let devices: Vec<Device> = stream::iter(addresses)
        .map(|ip| async move { prober.probe(&ip.to_string(), port).await })
        .buffered(SCAN_CONCURRENCY)
        .filter_map(|found| async move { found })
        .collect()
        .await;

    log::debug!(
        "[Scan] Probed {} address(es), {} answered",
        total,
        devices.len()
    );
    devices
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    struct CountingProber {
        hits: Mutex<HashMap<String, usize>>,
        answer_at: Vec<&'static str>,
    }

    impl CountingProber {
        fn new(answer_at: Vec<&'static str>) -> Self {
            Self {
                hits: Mutex::new(HashMap::new()),
                answer_at,
            }
        }
    }

    #[async_trait]
    impl DeviceProber for CountingProber {
        async fn probe(&self, address: &str, port: u16) -> Option<Device> {
            *self.hits.lock().entry(address.to_string()).or_insert(0) += 1;
            if self.answer_at.contains(&address) {
                Some(Device::with_port("Test Device", address, port))
            } else {
                None
            }
        }
    }

    #[test]
    fn candidates_dedupe_local_range_against_fixed_ranges() {
        let local: Ipv4Addr = "192.168.1.50".parse().unwrap();
        let addresses = candidate_addresses(Some(local));

        // Local /24 collapses into the identical fixed range
        assert_eq!(addresses.len(), 254 * 3);
        let unique: HashSet<_> = addresses.iter().collect();
        assert_eq!(unique.len(), addresses.len());
        // Local range is scanned first
        assert_eq!(addresses[0], "192.168.1.1".parse::<Ipv4Addr>().unwrap());
    }

    #[test]
    fn candidates_include_local_range_ahead_of_fixed_ones() {
        let local: Ipv4Addr = "172.16.5.9".parse().unwrap();
        let addresses = candidate_addresses(Some(local));

        assert_eq!(addresses.len(), 254 * 4);
        assert_eq!(addresses[0], "172.16.5.1".parse::<Ipv4Addr>().unwrap());
        assert!(addresses.contains(&"10.0.0.42".parse::<Ipv4Addr>().unwrap()));
    }

    #[test]
    fn candidates_without_local_address_cover_fixed_ranges() {
        let addresses = candidate_addresses(None);
        assert_eq!(addresses.len(), 254 * 3);
        assert_eq!(addresses[0], "192.168.1.1".parse::<Ipv4Addr>().unwrap());
    }

    #[tokio::test]
    async fn scan_probes_each_address_exactly_once() {
        let prober = CountingProber::new(vec!["192.168.1.61", "10.0.0.3"]);
        let local: Ipv4Addr = "192.168.1.50".parse().unwrap();
        let addresses = candidate_addresses(Some(local));

        let devices = scan_addresses(&prober, addresses.clone(), 8060).await;

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].address, "192.168.1.61");
        assert_eq!(devices[1].address, "10.0.0.3");

        let hits = prober.hits.lock();
        assert_eq!(hits.len(), addresses.len());
        assert!(hits.values().all(|&count| count == 1));
    }

    #[tokio::test]
    async fn scan_results_preserve_address_order() {
        let prober = CountingProber::new(vec!["192.168.0.9", "192.168.1.200"]);
        let addresses = candidate_addresses(None);

        let devices = scan_addresses(&prober, addresses, 8060).await;

        // 192.168.1.0/24 is enumerated before 192.168.0.0/24
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].address, "192.168.1.200");
        assert_eq!(devices[1].address, "192.168.0.9");
    }
}
