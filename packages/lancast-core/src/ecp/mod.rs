//! External-control protocol client.
//!
//! Drives a device to begin playback over its vendor HTTP control protocol
//! on the well-known control port.
//!
//! # Module Structure
//!
//! - `client` - [`EcpClient`]: device queries, launch sequencing, stream send
//! - `device_info` - flat tag/value response parsing and app-listing checks
//!
//! # Failure Semantics
//!
//! Every network call resolves to a local success/failure outcome; no error
//! escapes a public operation as a panic. [`EcpClient::send_stream`] always
//! resolves to a `bool`, with failure reasons on the log side channel. There
//! are no automatic retries - a failed attempt is retried by the caller.

pub mod client;
pub mod device_info;

use thiserror::Error;

pub use client::{EcpClient, EcpConfig};

/// Errors that can occur during control-protocol operations.
#[derive(Debug, Error)]
pub enum EcpError {
    /// HTTP request to the device failed (unreachable, timed out).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Device rejected a control request with a non-success status.
    #[error("control request rejected with HTTP {0}")]
    Rejected(u16),

    /// Target application is not installed on the device.
    #[error("application {0} is not installed on the device")]
    AppNotInstalled(String),

    /// Response body did not contain the expected tag/value structure.
    #[error("failed to parse control response")]
    Parse,
}

/// Convenient Result alias for control-protocol operations.
pub type EcpResult<T> = Result<T, EcpError>;
