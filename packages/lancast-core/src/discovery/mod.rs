//! Device discovery engine.
//!
//! Produces the current set of controllable devices on the local network:
//! a multicast (SSDP) phase first, then an IP-range scan fallback when
//! multicast yields nothing. One pass runs at a time per engine; starting
//! a new pass cancels the in-flight one and discards its partial results.
//!
//! # Module Structure
//!
//! - `ssdp` - multicast phase (M-SEARCH + bounded listen window)
//! - `scan` - fallback phase (deduplicated IP-range probing)
//!
//! # Failure Semantics
//!
//! Socket and interface errors in either phase are caught, logged and
//! treated as "phase yielded zero results" - they never abort the pass
//! and never propagate to the caller. An empty device list is the only
//! signal of complete failure.

pub mod scan;
pub mod ssdp;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::device::Device;
use crate::ecp::EcpClient;
use crate::net::lan_ipv4;
use crate::protocol_constants::{CONTROL_PORT, SSDP_LISTEN_WINDOW};

pub use scan::DeviceProber;

/// Errors internal to a discovery phase.
///
/// These never reach the engine's caller; the pass logs them and carries
/// on with zero results for the failing phase.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Failed to bind the UDP socket for the pass.
    #[error("failed to bind UDP socket: {0}")]
    SocketBind(#[source] std::io::Error),

    /// Failed to send the multicast search request.
    #[error("failed to send discovery search: {0}")]
    SendSearch(#[source] std::io::Error),
}

/// Convenient Result alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Configuration for one discovery engine.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Bounded receive window for the multicast listen phase.
    pub listen_window: Duration,
    /// Control port probed during the fallback scan.
    pub control_port: u16,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            listen_window: SSDP_LISTEN_WINDOW,
            control_port: CONTROL_PORT,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-Pass Result Set
// ─────────────────────────────────────────────────────────────────────────────

/// Transient address-keyed result set for one pass.
///
/// Deduplicates by address with last-seen-wins values while preserving
/// first-seen order, so multicast results stay ahead of fallback results.
/// Never persisted beyond the pass.
#[derive(Debug, Default)]
struct DiscoveryResults {
    order: Vec<String>,
    by_address: HashMap<String, Device>,
}

impl DiscoveryResults {
    fn insert(&mut self, device: Device) {
        let address = device.address.clone();
        if self.by_address.insert(address.clone(), device).is_none() {
            self.order.push(address);
        }
    }

    fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    fn into_devices(mut self) -> Vec<Device> {
        self.order
            .iter()
            .filter_map(|address| self.by_address.remove(address))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Discovery engine owning at most one in-flight pass.
///
/// The in-flight pass is held as an explicitly-scoped cancellation token
/// rather than ambient state, so multiple engine instances coexist
/// without interference.
pub struct DiscoveryEngine {
    prober: Arc<dyn DeviceProber>,
    config: DiscoveryConfig,
    current_pass: Mutex<Option<CancellationToken>>,
}

impl std::fmt::Debug for DiscoveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryEngine")
            .field("config", &self.config)
            .field("discovering", &self.is_discovering())
            .finish()
    }
}

impl DiscoveryEngine {
    /// Creates an engine probing with the given control-protocol client.
    #[must_use]
    pub fn new(client: EcpClient) -> Self {
        Self::with_config(Arc::new(client), DiscoveryConfig::default())
    }

    /// Creates an engine with a custom prober and configuration.
    #[must_use]
    pub fn with_config(prober: Arc<dyn DeviceProber>, config: DiscoveryConfig) -> Self {
        Self {
            prober,
            config,
            current_pass: Mutex::new(None),
        }
    }

    /// True while a pass is in flight.
    #[must_use]
    pub fn is_discovering(&self) -> bool {
        self.current_pass.lock().is_some()
    }

    /// Runs one discovery pass and returns the deduplicated device list.
    ///
    /// Cancels any pass already in flight first; the cancelled pass
    /// resolves to an empty list, its partial results discarded. This
    /// method itself never fails - an empty list is the failure signal.
    pub async fn discover(&self) -> Vec<Device> {
        let token = CancellationToken::new();
        if let Some(prior) = self.current_pass.lock().replace(token.clone()) {
            log::info!("[Discovery] Cancelling in-flight pass");
            prior.cancel();
        }

        let devices = tokio::select! {
            _ = token.cancelled() => {
                log::info!("[Discovery] Pass cancelled; partial results discarded");
                Vec::new()
            }
            devices = self.run_pass() => devices,
        };

        // Back to idle, unless a newer pass already owns the slot (in
        // which case our token is the cancelled one).
        let mut slot = self.current_pass.lock();
        if !token.is_cancelled() {
            *slot = None;
        }

        devices
    }

    async fn run_pass(&self) -> Vec<Device> {
        let mut results = DiscoveryResults::default();

        log::info!("[Discovery] Starting multicast phase");
        match ssdp::discover_multicast(self.config.listen_window).await {
            Ok(found) => {
                for device in found {
                    results.insert(device);
                }
            }
            // Treated as "phase yielded zero results"
            Err(e) => log::warn!("[Discovery] Multicast phase failed: {}", e),
        }

        if results.is_empty() {
            log::info!("[Discovery] Multicast found nothing; falling back to IP-range scan");
            let addresses = scan::candidate_addresses(lan_ipv4());
            let found =
                scan::scan_addresses(self.prober.as_ref(), addresses, self.config.control_port)
                    .await;
            for device in found {
                results.insert(device);
            }
        }

        let devices = results.into_devices();
        log::info!("[Discovery] Pass complete: {} device(s)", devices.len());
        devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn results_dedupe_by_address_last_seen_wins() {
        let mut results = DiscoveryResults::default();
        results.insert(Device::new("From Multicast", "192.168.1.61"));
        results.insert(Device::new("Other", "192.168.1.62"));
        results.insert(Device::new("From Fallback", "192.168.1.61"));

        let devices = results.into_devices();
        assert_eq!(devices.len(), 2);
        // First-seen order, last-seen value
        assert_eq!(devices[0].address, "192.168.1.61");
        assert_eq!(devices[0].name, "From Fallback");
        assert_eq!(devices[1].address, "192.168.1.62");
    }

    struct FixedProber {
        answer_at: &'static str,
    }

    #[async_trait]
    impl DeviceProber for FixedProber {
        async fn probe(&self, address: &str, port: u16) -> Option<Device> {
            (address == self.answer_at).then(|| Device::with_port("Found", address, port))
        }
    }

    struct HangingProber;

    #[async_trait]
    impl DeviceProber for HangingProber {
        async fn probe(&self, _address: &str, _port: u16) -> Option<Device> {
            std::future::pending::<()>().await;
            None
        }
    }

    fn zero_window_config() -> DiscoveryConfig {
        DiscoveryConfig {
            listen_window: Duration::ZERO,
            control_port: 8060,
        }
    }

    #[tokio::test]
    async fn fallback_phase_finds_devices_when_multicast_is_silent() {
        let engine = DiscoveryEngine::with_config(
            Arc::new(FixedProber {
                answer_at: "192.168.1.77",
            }),
            zero_window_config(),
        );

        let devices = engine.discover().await;

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].address, "192.168.1.77");
        assert_eq!(devices[0].name, "Found");
        assert!(!engine.is_discovering());
    }

    #[tokio::test]
    async fn starting_a_new_pass_cancels_the_prior_one() {
        let engine = Arc::new(DiscoveryEngine::with_config(
            Arc::new(HangingProber),
            zero_window_config(),
        ));

        let first = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.discover().await }
        });

        // Let the first pass reach its (hanging) fallback scan
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(engine.is_discovering());

        let second = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.discover().await }
        });

        let devices = first.await.expect("first pass should resolve");
        assert!(devices.is_empty());

        second.abort();
    }
}
