// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::NetworkConfig;
use crate::error::{InputError, Result, TransportError};
use crate::playlist::{Playlist, ensure_playlist_content, parse_m3u};

/// Reduce user input to `scheme://host[:port]`, assuming https when no scheme
/// is given. Returns None for anything without a usable http(s) host.
pub fn normalize_server_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// `{server}/get.php?username=..&password=..&type=m3u_plus&output=ts`
pub fn build_playlist_url(server: &str, username: &str, password: &str) -> String {
    let mut url = format!("{}/get.php?", server);
    url.push_str(
        &url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", password)
            .append_pair("type", "m3u_plus")
            .append_pair("output", "ts")
            .finish(),
    );
    url
}

/// Validated login input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub server: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(server: &str, username: &str, password: &str) -> Result<Self, InputError> {
        let server = normalize_server_url(server).ok_or(InputError::InvalidServerUrl)?;
        let username = username.trim();
        let password = password.trim();

        if username.is_empty() || password.is_empty() {
            return Err(InputError::MissingCredentials);
        }

        Ok(Self {
            server,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn playlist_url(&self) -> String {
        build_playlist_url(&self.server, &self.username, &self.password)
    }
}

#[derive(Debug, Clone)]
pub struct PlaylistClient {
    client: Client,
    relay_url: String,
    show_progress: bool,
}

impl PlaylistClient {
    pub fn new(network: &NetworkConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent(network.user_agent.as_str());
        if let Some(secs) = network.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            relay_url: network.relay_url.clone(),
            show_progress: false,
        })
    }

    pub fn enable_progress(&mut self) {
        self.show_progress = true;
    }

    /// Download, validate and parse the provider's playlist.
    pub async fn fetch_playlist(&self, credentials: &Credentials) -> Result<Playlist> {
        info!("Downloading playlist from {}", credentials.server);

        let content = self.download(&credentials.playlist_url()).await?;
        ensure_playlist_content(&content)?;

        let playlist = parse_m3u(&content);
        info!("Playlist loaded with {} items", playlist.total());
        Ok(playlist)
    }

    /// Direct request first; on any failure, one retry through the relay.
    pub async fn download(&self, url: &str) -> Result<String, TransportError> {
        let direct_err = match self.fetch_text(url).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        if self.relay_url.is_empty() {
            return Err(direct_err);
        }

        warn!("Direct download failed ({}), retrying through relay", direct_err);

        let relayed = format!("{}{}", self.relay_url, urlencoding::encode(url));
        self.fetch_text(&relayed).await.map_err(|e| match e {
            TransportError::Status(code) => TransportError::RelayStatus(code),
            other => other,
        })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        debug!("Requesting {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        let pb = if self.show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg} [{elapsed_precise}]")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            pb.set_message("Downloading playlist...");
            Some(pb)
        } else {
            None
        };

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = futures_util::StreamExt::next(&mut stream).await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    if let Some(pb) = &pb {
                        pb.finish_and_clear();
                    }
                    return Err(e.into());
                }
            };
            body.extend_from_slice(&chunk);

            if let Some(pb) = &pb {
                pb.set_message(format!("Downloading playlist... {}", format_bytes(body.len())));
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        debug!("Downloaded {}", format_bytes(body.len()));
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn format_bytes(len: usize) -> String {
    if len < 1024 {
        format!("{} B", len)
    } else if len < 1024 * 1024 {
        format!("{:.1} KB", len as f64 / 1024.0)
    } else {
        format!("{:.1} MB", len as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_server_url() {
        assert_eq!(normalize_server_url("myiptv.com").as_deref(), Some("https://myiptv.com"));
        assert_eq!(
            normalize_server_url("  http://myiptv.com:8080/player_api.php?x=1 ").as_deref(),
            Some("http://myiptv.com:8080")
        );
        assert_eq!(
            normalize_server_url("https://MyIPTV.com:443/").as_deref(),
            Some("https://myiptv.com")
        );
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(normalize_server_url("not a url"), None);
        assert_eq!(normalize_server_url(""), None);
        assert_eq!(normalize_server_url("   "), None);
        assert_eq!(normalize_server_url("https://"), None);
        assert_eq!(normalize_server_url("ftp://myiptv.com"), None);
    }

    #[test]
    fn test_build_playlist_url() {
        assert_eq!(
            build_playlist_url("https://myiptv.com", "john doe", "p&ss"),
            "https://myiptv.com/get.php?username=john+doe&password=p%26ss&type=m3u_plus&output=ts"
        );
    }

    #[test]
    fn test_credentials_validation() {
        assert_eq!(
            Credentials::new("not a url", "u", "p"),
            Err(InputError::InvalidServerUrl)
        );
        assert_eq!(
            Credentials::new("myiptv.com", "  ", "p"),
            Err(InputError::MissingCredentials)
        );
        assert_eq!(
            Credentials::new("myiptv.com", "u", ""),
            Err(InputError::MissingCredentials)
        );

        let credentials = Credentials::new("myiptv.com", " u ", " p ").unwrap();
        assert_eq!(credentials.server, "https://myiptv.com");
        assert_eq!(credentials.username, "u");
        assert_eq!(
            credentials.playlist_url(),
            "https://myiptv.com/get.php?username=u&password=p&type=m3u_plus&output=ts"
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
