//! Local network interface enumeration.
//!
//! Shared by the stream-URL normalizer (loopback rewriting) and the
//! discovery engine (selecting the /24 to scan). Enumeration is read-only;
//! no sockets are opened here.

use std::net::IpAddr;
use std::net::Ipv4Addr;

use local_ip_address::list_afinet_netifas;

/// Virtual interface prefixes to skip when looking for a LAN address.
pub const VIRTUAL_INTERFACE_PREFIXES: &[&str] = &[
    "lo", "docker", "veth", "br-", "virbr", "vmnet", "vbox", "tun", "tap",
];

/// Checks if an interface name belongs to a virtual/container interface.
pub fn is_virtual_interface(name: &str) -> bool {
    let name_lower = name.to_lowercase();
    VIRTUAL_INTERFACE_PREFIXES
        .iter()
        .any(|prefix| name_lower.starts_with(prefix))
}

/// Returns the first non-loopback IPv4 address bound to a non-virtual
/// interface, or `None` when the host has no usable LAN address.
///
/// Callers treat `None` as the `NetworkUnreachable` condition: discovery
/// degrades to an empty result and URL rewriting returns the URL unchanged.
pub fn lan_ipv4() -> Option<Ipv4Addr> {
    let interfaces = list_afinet_netifas()
        .map_err(|e| {
            log::warn!("[Net] Failed to list network interfaces: {}", e);
            e
        })
        .unwrap_or_default();

    interfaces.into_iter().find_map(|(name, addr)| {
        if is_virtual_interface(&name) {
            log::debug!("[Net] Skipping virtual interface: {}", name);
            return None;
        }
        match addr {
            IpAddr::V4(ipv4) if !ipv4.is_loopback() => {
                log::debug!("[Net] Using interface {} ({})", name, ipv4);
                Some(ipv4)
            }
            _ => None,
        }
    })
}
