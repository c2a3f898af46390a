//! High-level control-protocol commands.
//!
//! [`EcpClient`] wraps one shared, stateless `reqwest::Client`; it is cheap
//! to clone and safe to reuse across concurrent calls. All operations
//! resolve errors locally per the module contract - see [`crate::ecp`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use crate::device::Device;
use crate::discovery::scan::DeviceProber;
use crate::ecp::device_info::{body_lists_app, device_name, parse_device_info};
use crate::ecp::{EcpError, EcpResult};
use crate::media::StreamDescriptor;
use crate::protocol_constants::{
    ACTIVE_APP_PATH, APPS_PATH, APP_NAME, APP_SETTLE_DELAY, BUILTIN_PLAYER_APP_ID,
    BUILTIN_SETTLE_DELAY, CONTROL_TIMEOUT, DEVICE_INFO_PATH, GENERIC_DEVICE_NAME, PROBE_TIMEOUT,
};

/// Tunable timeouts and settle delays for control operations.
///
/// Defaults come from `protocol_constants`; tests zero the settle delays
/// so launch sequencing can be exercised without real waits.
#[derive(Debug, Clone)]
pub struct EcpConfig {
    /// Timeout for control requests (queries, launches).
    pub control_timeout: Duration,
    /// Timeout for a single device-info probe.
    pub probe_timeout: Duration,
    /// Wait after launching the custom receiver application.
    pub app_settle_delay: Duration,
    /// Wait after launching the built-in player.
    pub builtin_settle_delay: Duration,
}

impl Default for EcpConfig {
    fn default() -> Self {
        Self {
            control_timeout: CONTROL_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
            app_settle_delay: APP_SETTLE_DELAY,
            builtin_settle_delay: BUILTIN_SETTLE_DELAY,
        }
    }
}

/// Control-protocol client for one or more devices.
#[derive(Debug, Clone)]
pub struct EcpClient {
    client: Client,
    config: EcpConfig,
}

impl Default for EcpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EcpClient {
    /// Creates a client with default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EcpConfig::default())
    }

    /// Creates a client with custom timeouts and settle delays.
    #[must_use]
    pub fn with_config(config: EcpConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// The shared HTTP client, for callers that make adjacent requests.
    #[must_use]
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    async fn get_body(&self, url: &str, timeout: Duration) -> EcpResult<String> {
        let res = self.client.get(url).timeout(timeout).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(EcpError::Rejected(status.as_u16()));
        }
        Ok(body)
    }

    /// Queries the device-info listing and parses it into a tag/value map.
    ///
    /// Bounded by the probe timeout; an address with no listening service
    /// errors out instead of hanging. An unparseable body is a negative
    /// result even when the HTTP status was a success.
    pub async fn query_device_info(&self, device: &Device) -> EcpResult<HashMap<String, String>> {
        let url = format!("{}{}", device.base_url(), DEVICE_INFO_PATH);
        let body = self.get_body(&url, self.config.probe_timeout).await?;
        let info = parse_device_info(&body);
        if info.is_empty() {
            return Err(EcpError::Parse);
        }
        Ok(info)
    }

    /// Checks whether `app_id` is the currently active application.
    pub async fn is_app_active(&self, device: &Device, app_id: &str) -> EcpResult<bool> {
        let url = format!("{}{}", device.base_url(), ACTIVE_APP_PATH);
        let body = self.get_body(&url, self.config.control_timeout).await?;
        Ok(body_lists_app(&body, app_id))
    }

    /// Checks whether `app_id` appears in the installed-application listing.
    pub async fn is_app_installed(&self, device: &Device, app_id: &str) -> EcpResult<bool> {
        let url = format!("{}{}", device.base_url(), APPS_PATH);
        let body = self.get_body(&url, self.config.control_timeout).await?;
        Ok(body_lists_app(&body, app_id))
    }

    /// Launches an application, optionally with URL-encoded query parameters.
    ///
    /// Acceptance is judged by the response status alone; the launch itself
    /// completes asynchronously on the device.
    pub async fn launch_app(
        &self,
        device: &Device,
        app_id: &str,
        params: &[(&str, &str)],
    ) -> EcpResult<()> {
        let url = format!("{}/launch/{}", device.base_url(), app_id);
        let mut request = self.client.post(&url).timeout(self.config.control_timeout);
        if !params.is_empty() {
            request = request.query(params);
        }

        log::info!("[ECP] POST /launch/{} -> {}", app_id, device.display_name());
        let res = request.send().await?;
        let status = res.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(EcpError::Rejected(status.as_u16()))
        }
    }

    /// Gets `app_id` into the foreground.
    ///
    /// Cheap path first: if the app is already active, succeeds without a
    /// launch POST. Otherwise verifies the app is installed (failing fast
    /// with [`EcpError::AppNotInstalled`]) and issues the launch.
    pub async fn ensure_app_running(&self, device: &Device, app_id: &str) -> EcpResult<()> {
        match self.is_app_active(device, app_id).await {
            Ok(true) => {
                log::debug!("[ECP] App {} already active, skipping launch", app_id);
                return Ok(());
            }
            Ok(false) => {}
            // A failed active-app query is not conclusive; the install
            // check below settles whether the device is reachable at all.
            Err(e) => log::debug!("[ECP] Active-app query failed: {}", e),
        }

        if !self.is_app_installed(device, app_id).await? {
            return Err(EcpError::AppNotInstalled(app_id.to_string()));
        }

        self.launch_app(device, app_id, &[]).await
    }

    /// Gets the device playing the described stream via the target app.
    ///
    /// Normalizes the stream URL, ensures the app is running (falling back
    /// to [`EcpClient::send_to_builtin_player`] when that fails), waits the
    /// settle delay, then POSTs the playback parameters to the app's launch
    /// endpoint. Never panics; the return value is the only outcome signal.
    pub async fn send_stream(
        &self,
        device: &Device,
        descriptor: &StreamDescriptor,
        app_id: &str,
    ) -> bool {
        let descriptor = descriptor.normalized();
        log::info!(
            "[ECP] Sending \"{}\" ({}) to {} via app {}",
            descriptor.title,
            descriptor.format,
            device.display_name(),
            app_id
        );

        match self.ensure_app_running(device, app_id).await {
            Ok(()) => {
                tokio::time::sleep(self.config.app_settle_delay).await;

                let content_id = format!("{}-{}", APP_NAME.to_lowercase(), Uuid::new_v4());
                let params = [
                    ("contentId", content_id.as_str()),
                    ("url", descriptor.url.as_str()),
                    ("title", descriptor.title.as_str()),
                    ("format", descriptor.format.as_str()),
                ];

                match self.launch_app(device, app_id, &params).await {
                    Ok(()) => {
                        log::info!("[ECP] Device accepted playback parameters");
                        true
                    }
                    Err(e) => {
                        log::warn!("[ECP] Playback parameter POST failed: {}", e);
                        false
                    }
                }
            }
            Err(e) => {
                log::warn!(
                    "[ECP] Could not start app {}: {}; falling back to built-in player",
                    app_id,
                    e
                );
                self.send_to_builtin_player(device, &descriptor).await
            }
        }
    }

    /// Best-effort fallback: launch the built-in player and inject the URL.
    ///
    /// A success here only proves the device accepted the request - the
    /// built-in player may still refuse the URL at playback time.
    pub async fn send_to_builtin_player(
        &self,
        device: &Device,
        descriptor: &StreamDescriptor,
    ) -> bool {
        if let Err(e) = self.launch_app(device, BUILTIN_PLAYER_APP_ID, &[]).await {
            log::warn!("[ECP] Built-in player launch failed: {}", e);
            return false;
        }

        tokio::time::sleep(self.config.builtin_settle_delay).await;

        // The input endpoint takes the raw stream URL as its query string.
        let raw = format!("{}/input?{}", device.base_url(), descriptor.url);
        let url = match reqwest::Url::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("[ECP] Could not build input URL: {}", e);
                return false;
            }
        };

        log::info!("[ECP] POST /input -> {}", device.display_name());
        match self
            .client
            .post(url)
            .timeout(self.config.control_timeout)
            .send()
            .await
        {
            Ok(res) if res.status().is_success() => true,
            Ok(res) => {
                log::warn!(
                    "[ECP] Built-in player rejected input with HTTP {}",
                    res.status().as_u16()
                );
                false
            }
            Err(e) => {
                log::warn!("[ECP] Built-in player input POST failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl DeviceProber for EcpClient {
    /// A positive probe is a parseable device-info body; the body also
    /// supplies the device name when the firmware reports one.
    async fn probe(&self, address: &str, port: u16) -> Option<Device> {
        let candidate = Device::with_port("", address, port);
        match self.query_device_info(&candidate).await {
            Ok(info) => {
                let name =
                    device_name(&info).unwrap_or_else(|| GENERIC_DEVICE_NAME.to_string());
                log::debug!("[Scan] Positive probe at {}: {}", address, name);
                Some(Device::with_port(name, address, port))
            }
            Err(e) => {
                log::trace!("[Scan] {} not a device: {}", address, e);
                None
            }
        }
    }
}
