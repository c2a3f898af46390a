//! Lancast CLI - cast a media stream to a device on the local network.
//!
//! Thin orchestration over `lancast-core`: discovers devices, picks one
//! (first found, or an explicit address) and hands the stream descriptor
//! to the control-protocol client. All protocol and failure-handling
//! logic lives in the core.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lancast_core::{
    Device, DiscoveryConfig, DiscoveryEngine, EcpClient, StreamDescriptor,
};

use crate::config::CliConfig;

/// Lancast - cast media streams to LAN devices.
#[derive(Parser, Debug)]
#[command(name = "lancast")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "LANCAST_LOG_LEVEL")]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover controllable devices on the local network.
    Discover {
        /// Print the device list as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Send a stream URL to a device.
    Send {
        /// Stream URL (loopback hosts are rewritten to the LAN address).
        url: String,

        /// Device address; discovered automatically when omitted.
        #[arg(short, long, env = "LANCAST_DEVICE")]
        device: Option<String>,

        /// Display title; derived from the URL when omitted.
        #[arg(short, long)]
        title: Option<String>,

        /// Receiver application id (overrides config file).
        #[arg(short, long)]
        app_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    let config =
        CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Command::Discover { json } => discover(&config, json).await,
        Command::Send {
            url,
            device,
            title,
            app_id,
        } => {
            let app_id = app_id.unwrap_or_else(|| config.app_id.clone());
            send(&config, &url, device, title, &app_id).await
        }
    }
}

fn engine(config: &CliConfig, client: &EcpClient) -> DiscoveryEngine {
    DiscoveryEngine::with_config(
        Arc::new(client.clone()),
        DiscoveryConfig {
            listen_window: Duration::from_secs(config.listen_window_secs),
            control_port: config.control_port,
        },
    )
}

async fn discover(config: &CliConfig, json: bool) -> Result<()> {
    let client = EcpClient::new();
    let devices = engine(config, &client).discover().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    for device in &devices {
        println!("{}  {}", device.address, device.display_name());
    }
    Ok(())
}

async fn send(
    config: &CliConfig,
    url: &str,
    address: Option<String>,
    title: Option<String>,
    app_id: &str,
) -> Result<()> {
    let client = EcpClient::new();

    let device = match address {
        Some(address) => Device::with_port("", address, config.control_port),
        None => {
            let devices = engine(config, &client).discover().await;
            match devices.into_iter().next() {
                Some(device) => device,
                None => bail!("No devices found on the local network"),
            }
        }
    };

    let title = title.unwrap_or_else(|| title_from_url(url));
    let descriptor = StreamDescriptor::new(url, title);

    log::info!(
        "Sending \"{}\" to {} (app {})",
        descriptor.title,
        device.display_name(),
        app_id
    );

    if !client.send_stream(&device, &descriptor, app_id).await {
        bail!("Device {} did not accept the stream", device.display_name());
    }

    println!("Playback started on {}", device.display_name());
    Ok(())
}

/// Derives a display title from the last path segment of the URL.
fn title_from_url(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.split('?').next())
        .filter(|segment| !segment.is_empty() && !segment.contains("://"))
        .unwrap_or("Stream")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_falls_back_for_bare_hosts() {
        assert_eq!(title_from_url("http://192.168.1.50:11470"), "Stream");
        assert_eq!(title_from_url("http://host/"), "Stream");
    }

    #[test]
    fn title_uses_last_path_segment() {
        assert_eq!(
            title_from_url("http://host:11470/movie.mkv?token=abc"),
            "movie.mkv"
        );
    }
}
