//! Device model for discovered controllable devices.
//!
//! A [`Device`] is an immutable record created by the discovery engine on a
//! positive probe or response, or constructed manually from a user-supplied
//! address. Re-discovery supersedes a device rather than mutating it; the
//! display name and control base URL are computed so they can never diverge
//! from the canonical fields.

use serde::Serialize;

use crate::protocol_constants::CONTROL_PORT;

/// One discovered (or manually configured) controllable device.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Device {
    /// Vendor-reported or synthesized device name. May be empty; use
    /// [`Device::display_name`] for anything user-facing.
    pub name: String,
    /// IPv4 address as a dotted-quad string.
    pub address: String,
    /// TCP port for HTTP control requests.
    #[serde(rename = "controlPort")]
    pub control_port: u16,
    /// Whether the device answered its most recent probe.
    pub online: bool,
}

impl Device {
    /// Creates a device discovered on the default control port.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            control_port: CONTROL_PORT,
            online: true,
        }
    }

    /// Creates a device from a user-supplied address with no known name.
    ///
    /// The name stays empty until a device-info query fills it in;
    /// [`Device::display_name`] covers the gap.
    #[must_use]
    pub fn from_address(address: impl Into<String>) -> Self {
        Self::new("", address)
    }

    /// Creates a device on a non-standard control port.
    #[must_use]
    pub fn with_port(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            control_port: port,
            online: true,
        }
    }

    /// Name suitable for display; never empty.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Device ({})", self.address)
        } else {
            self.name.clone()
        }
    }

    /// Base URL for control requests: `http://{address}:{control_port}`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.address, self.control_port)
    }
}
