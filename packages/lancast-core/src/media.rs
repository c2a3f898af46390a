//! Stream descriptors and URL normalization.
//!
//! Media servers on the casting host frequently hand out loopback URLs
//! (`http://127.0.0.1:11470/...`). A third-party device on the same LAN
//! cannot resolve those, so the descriptor's URL is rewritten to the host's
//! LAN address before it ever reaches the control protocol. Container
//! format classification also lives here; it is pure and total.

use std::net::Ipv4Addr;

use serde::Serialize;

use crate::net::lan_ipv4;

// ─────────────────────────────────────────────────────────────────────────────
// Container Format
// ─────────────────────────────────────────────────────────────────────────────

/// Container format of a playable stream, classified from its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    Hls,
    Dash,
    Mp4,
    Mkv,
    Avi,
}

impl StreamFormat {
    /// Classifies a URL by file-extension substring.
    ///
    /// Priority order: `.m3u8`, `.mpd`, `.mp4`, `.mkv`, `.avi`; anything
    /// else defaults to [`StreamFormat::Mp4`]. Total: every input yields
    /// a format.
    #[must_use]
    pub fn detect(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.contains(".m3u8") {
            Self::Hls
        } else if lower.contains(".mpd") {
            Self::Dash
        } else if lower.contains(".mp4") {
            Self::Mp4
        } else if lower.contains(".mkv") {
            Self::Mkv
        } else if lower.contains(".avi") {
            Self::Avi
        } else {
            Self::Mp4
        }
    }

    /// Wire representation used in control-protocol query parameters.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hls => "hls",
            Self::Dash => "dash",
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::Avi => "avi",
        }
    }
}

impl std::fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stream Descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// One subtitle track attached to a stream.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub url: String,
    pub language: String,
    pub label: String,
    pub format: String,
}

/// One audio track attached to a stream.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AudioTrack {
    pub language: String,
    pub label: String,
    pub codec: String,
    #[serde(rename = "channelLayout")]
    pub channel_layout: String,
}

/// Normalized representation of a playable stream.
///
/// Constructed once per inbound request by the external collaborator,
/// handed to the control-protocol client, and discarded after the send
/// attempt is acknowledged.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub url: String,
    pub title: String,
    pub format: StreamFormat,
    #[serde(rename = "subtitleTracks")]
    pub subtitle_tracks: Vec<SubtitleTrack>,
    #[serde(rename = "audioTracks")]
    pub audio_tracks: Vec<AudioTrack>,
}

impl StreamDescriptor {
    /// Creates a descriptor, classifying the format from the URL.
    #[must_use]
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        let format = StreamFormat::detect(&url);
        Self {
            url,
            title: title.into(),
            format,
            subtitle_tracks: Vec::new(),
            audio_tracks: Vec::new(),
        }
    }

    /// Returns a copy with a LAN-reachable URL (see [`rewrite_loopback`]).
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.url = rewrite_loopback(&self.url);
        normalized
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loopback Rewriting
// ─────────────────────────────────────────────────────────────────────────────

/// True when the URL points at the local host by a name the device
/// cannot resolve.
#[must_use]
pub fn is_loopback_url(url: &str) -> bool {
    url.contains("127.0.0.1") || url.contains("localhost")
}

/// Rewrites loopback hosts (`127.0.0.1`, `localhost`) to the host's LAN
/// IPv4 address so a device on the same network can fetch the stream.
///
/// When no usable interface exists the URL is returned unchanged and the
/// condition is logged; the device will almost certainly fail to fetch
/// the stream, but the send attempt itself proceeds. Idempotent: a URL
/// without a loopback host passes through untouched, whatever its port.
#[must_use]
pub fn rewrite_loopback(url: &str) -> String {
    rewrite_loopback_with(url, lan_ipv4())
}

/// Rewrite against an explicit LAN address; `None` degrades to the
/// unchanged URL.
fn rewrite_loopback_with(url: &str, lan: Option<Ipv4Addr>) -> String {
    if !is_loopback_url(url) {
        return url.to_string();
    }

    match lan {
        Some(lan) => {
            let lan = lan.to_string();
            url.replace("127.0.0.1", &lan).replace("localhost", &lan)
        }
        None => {
            log::warn!(
                "[Media] No usable network interface; leaving loopback URL unchanged: {}",
                url
            );
            url.to_string()
        }
    }
}
