//! SSDP multicast discovery phase.
//!
//! Sends an `M-SEARCH` request to the standard multicast address with a
//! service-type filter for the target device class, then collects every
//! response that arrives inside a bounded listen window. The window
//! elapsing is the normal end of the phase, not a failure.
//!
//! The same socket is used for send AND receive since devices reply
//! unicast back to the sending socket/port.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::timeout;

use super::{DiscoveryError, DiscoveryResult};
use crate::device::Device;
use crate::protocol_constants::{
    GENERIC_DEVICE_NAME, SSDP_MULTICAST_ADDR, SSDP_MX_SECS, SSDP_SEARCH_TARGET,
};

// ─────────────────────────────────────────────────────────────────────────────
// ASCII Case-Insensitive Helpers
// ─────────────────────────────────────────────────────────────────────────────
//
// HTTP headers are ASCII, so byte-level comparison is safe, and it avoids
// allocations from to_lowercase() during the response burst.

/// Checks if `haystack` contains `needle` (ASCII case-insensitive).
#[inline]
fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Checks if `s` starts with `prefix` (ASCII case-insensitive).
#[inline]
fn starts_with_ignore_ascii_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Finds the byte index of `needle` in `haystack` (ASCII case-insensitive).
#[inline]
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

// ─────────────────────────────────────────────────────────────────────────────

/// Builds the M-SEARCH message.
///
/// The HOST header always names the multicast address per SSDP spec.
fn build_msearch_message() -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\r\n",
        SSDP_MULTICAST_ADDR, SSDP_MX_SECS, SSDP_SEARCH_TARGET
    )
}

/// Creates the UDP socket for one discovery pass.
///
/// SO_REUSEADDR for rapid restarts, broadcast mode per the discovery
/// contract, multicast TTL of 4 per UPnP convention. The socket is owned
/// by the pass and closed on drop, whatever ends the pass.
fn create_socket() -> DiscoveryResult<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(DiscoveryError::SocketBind)?;

    if let Err(e) = socket.set_reuse_address(true) {
        log::warn!("[SSDP] Failed to set SO_REUSEADDR: {}", e);
    }

    #[cfg(unix)]
    if let Err(e) = socket.set_reuse_port(true) {
        log::warn!("[SSDP] Failed to set SO_REUSEPORT: {}", e);
    }

    if let Err(e) = socket.set_multicast_ttl_v4(4) {
        log::warn!("[SSDP] Failed to set multicast TTL: {}", e);
    }

    if let Err(e) = socket.set_broadcast(true) {
        log::warn!("[SSDP] Failed to set SO_BROADCAST: {}", e);
    }

    socket
        .set_nonblocking(true)
        .map_err(DiscoveryError::SocketBind)?;

    let bind_addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, 0).into();
    socket
        .bind(&bind_addr.into())
        .map_err(DiscoveryError::SocketBind)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::SocketBind)
}

/// Parses one SSDP response into a device.
///
/// Responses whose `ST:` header does not name our service type are other
/// UPnP chatter and yield `None`. The device name comes from the `USN:`
/// header (`uuid:<name>::<rest>`); a response without one still counts,
/// with a generic name.
fn parse_ssdp_response(response: &str, src_ip: &str) -> Option<Device> {
    let st_matches = response.lines().any(|l| {
        starts_with_ignore_ascii_case(l, "st:") && contains_ignore_ascii_case(l, SSDP_SEARCH_TARGET)
    });
    if !st_matches {
        return None;
    }

    let name = response
        .lines()
        .find(|l| starts_with_ignore_ascii_case(l, "usn:"))
        .and_then(|l| find_ignore_ascii_case(l, "uuid:").map(|idx| &l[idx + 5..]))
        .and_then(|s| s.split("::").next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(GENERIC_DEVICE_NAME);

    Some(Device::new(name, src_ip))
}

/// Runs the multicast phase: one M-SEARCH, then a bounded listen window
/// collecting all responses (not just the first).
///
/// Per-receive errors are logged and skipped; only failing to set up or
/// use the socket at all surfaces as an error, and the caller treats that
/// as "phase yielded zero results".
pub async fn discover_multicast(window: Duration) -> DiscoveryResult<Vec<Device>> {
    let socket = create_socket()?;
    let msearch = build_msearch_message();

    socket
        .send_to(msearch.as_bytes(), SSDP_MULTICAST_ADDR)
        .await
        .map_err(DiscoveryError::SendSearch)?;
    log::debug!(
        "[SSDP] Sent M-SEARCH for {} ({}s listen window)",
        SSDP_SEARCH_TARGET,
        window.as_secs()
    );

    let mut devices = Vec::new();
    let mut buf = [0u8; 2048];
    let start = Instant::now();

    while start.elapsed() < window {
        let remaining = window.saturating_sub(start.elapsed());
        match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((amt, src))) => {
                let response = String::from_utf8_lossy(&buf[..amt]);
                if let Some(device) = parse_ssdp_response(&response, &src.ip().to_string()) {
                    log::debug!(
                        "[SSDP] Discovered {} at {}",
                        device.display_name(),
                        device.address
                    );
                    devices.push(device);
                }
            }
            Ok(Err(e)) => {
                log::warn!("[SSDP] Socket recv error: {}", e);
            }
            Err(_) => break, // Window elapsed - the normal end of the phase
        }
    }

    log::debug!(
        "[SSDP] Listen window closed after {}ms, {} response(s) matched",
        start.elapsed().as_millis(),
        devices.len()
    );
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msearch_names_the_service_type() {
        let msg = build_msearch_message();
        assert!(msg.starts_with("M-SEARCH * HTTP/1.1"));
        assert!(msg.contains("HOST: 239.255.255.250:1900"));
        assert!(msg.contains("MAN: \"ssdp:discover\""));
        assert!(msg.contains("ST: roku:ecp"));
        assert!(msg.ends_with("\r\n\r\n"));
    }

    #[test]
    fn parse_extracts_name_from_usn() {
        let response = "HTTP/1.1 200 OK\r\n\
                        Cache-Control: max-age=3600\r\n\
                        ST: roku:ecp\r\n\
                        Location: http://192.168.1.61:8060/\r\n\
                        USN: uuid:X00400DE7XD4::roku:ecp\r\n\r\n";
        let device = parse_ssdp_response(response, "192.168.1.61").expect("should parse");
        assert_eq!(device.name, "X00400DE7XD4");
        assert_eq!(device.address, "192.168.1.61");
        assert!(device.online);
    }

    #[test]
    fn parse_defaults_name_when_usn_missing() {
        let response = "HTTP/1.1 200 OK\r\n\
                        ST: roku:ecp\r\n\
                        Location: http://192.168.1.61:8060/\r\n\r\n";
        let device = parse_ssdp_response(response, "192.168.1.61").expect("should parse");
        assert_eq!(device.name, GENERIC_DEVICE_NAME);
    }

    #[test]
    fn parse_ignores_other_service_types() {
        let response = "HTTP/1.1 200 OK\r\n\
                        ST: urn:schemas-upnp-org:device:MediaRenderer:1\r\n\
                        USN: uuid:abc::urn:schemas-upnp-org:device:MediaRenderer:1\r\n\r\n";
        assert!(parse_ssdp_response(response, "192.168.1.20").is_none());
    }

    #[test]
    fn parse_handles_lowercase_headers() {
        let response = "HTTP/1.1 200 OK\r\n\
                        st: ROKU:ECP\r\n\
                        usn: UUID:X00400DE7XD4::roku:ecp\r\n\r\n";
        let device = parse_ssdp_response(response, "192.168.1.61").expect("should parse");
        assert_eq!(device.name, "X00400DE7XD4");
    }
}
