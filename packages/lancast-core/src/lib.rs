//! Lancast Core - LAN device discovery and stream casting.
//!
//! This crate locates streaming-capable devices on the local network and
//! drives them over their vendor HTTP control protocol to begin playback
//! of a media stream. It is designed to sit under thin orchestration
//! layers (a CLI, a desktop shell) that own device selection and UI.
//!
//! # Architecture
//!
//! - [`device`]: immutable model of a discovered device
//! - [`media`]: stream descriptors, format detection, loopback rewriting
//! - [`net`]: local interface enumeration (read-only)
//! - [`discovery`]: multicast discovery with IP-scan fallback
//! - [`ecp`]: control-protocol client (queries, launch sequencing)
//! - [`protocol_constants`]: wire-level constants
//!
//! # Abstraction Traits
//!
//! [`DeviceProber`](discovery::DeviceProber) decouples the fallback
//! scanner from the control protocol; [`ecp::EcpClient`] provides the
//! production implementation.

#![warn(clippy::all)]

pub mod device;
pub mod discovery;
pub mod ecp;
pub mod media;
pub mod net;
pub mod protocol_constants;

// Re-export commonly used types at the crate root
pub use device::Device;
pub use discovery::{DeviceProber, DiscoveryConfig, DiscoveryEngine};
pub use ecp::{EcpClient, EcpConfig, EcpError, EcpResult};
pub use media::{AudioTrack, StreamDescriptor, StreamFormat, SubtitleTrack};
pub use net::lan_ipv4;
