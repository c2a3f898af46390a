//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by external specifications (SSDP/UPnP, the
//! device's external-control protocol) and changing them would break
//! protocol compliance.

use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// SSDP (Simple Service Discovery Protocol)
// ─────────────────────────────────────────────────────────────────────────────

/// Standard SSDP multicast address and port (protocol specification).
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// SSDP search target naming the device class we control.
pub const SSDP_SEARCH_TARGET: &str = "roku:ecp";

/// Bounded receive window for the multicast listen phase.
///
/// Timeouts here are the normal means of ending the phase, not an error.
pub const SSDP_LISTEN_WINDOW: Duration = Duration::from_secs(3);

/// MX value (max response delay in seconds) advertised in M-SEARCH.
pub const SSDP_MX_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// External Control Protocol (HTTP)
// ─────────────────────────────────────────────────────────────────────────────

/// Well-known TCP port the device listens on for HTTP control requests.
pub const CONTROL_PORT: u16 = 8060;

/// Device-info query path, also used as the fallback-scan probe target.
pub const DEVICE_INFO_PATH: &str = "/query/device-info";

/// Active-application query path.
pub const ACTIVE_APP_PATH: &str = "/query/active-app";

/// Installed-applications listing path.
pub const APPS_PATH: &str = "/query/apps";

/// Application identifier of the device's built-in media player.
///
/// Fallback target when the custom receiver application is absent.
pub const BUILTIN_PLAYER_APP_ID: &str = "2213";

/// Settle delay after launching the custom receiver application.
///
/// Launches are asynchronous on the device side with no ready signal; a
/// fixed delay approximates readiness before playback parameters are sent.
pub const APP_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Settle delay after launching the built-in player (slower to start).
pub const BUILTIN_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Timeout for control requests (launch, app queries) on the LAN.
pub const CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a single fallback-scan probe.
///
/// The scan visits hundreds of addresses and most of them are not
/// devices, so individual probes must give up quickly.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(800);

// ─────────────────────────────────────────────────────────────────────────────
// Fallback Scanning
// ─────────────────────────────────────────────────────────────────────────────

/// Well-known private /24 ranges probed when multicast finds nothing.
///
/// The local host's own /24 is always scanned first, in addition to these.
pub const FALLBACK_RANGES: &[[u8; 3]] = &[[192, 168, 1], [192, 168, 0], [10, 0, 0]];

/// Maximum simultaneous probes during the fallback scan.
pub const SCAN_CONCURRENCY: usize = 32;

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used in synthesized content identifiers and logs.
pub const APP_NAME: &str = "Lancast";

/// Generic device name assigned when a discovery response carries no USN.
pub const GENERIC_DEVICE_NAME: &str = "Streaming Device";
