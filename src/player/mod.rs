// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod ffplay;
pub mod mpv;

use anyhow::Result;
use regex::Regex;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::error::PlaybackError;
use ffplay::FfplayPlayer;
use mpv::MpvPlayer;

static MANIFEST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.m3u8($|\?)").expect("manifest pattern is valid"));

/// Does the URL point at an HLS manifest?
pub fn is_adaptive_manifest(url: &str) -> bool {
    MANIFEST_REGEX.is_match(url)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playback has started.
    Ready,
    Error(String),
    Ended,
}

/// Something that can be pointed at a stream URL and controlled afterwards.
#[allow(async_fn_in_trait)]
pub trait StreamPlayer {
    async fn load(&mut self, url: &str) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
    async fn toggle_pause(&mut self) -> Result<()>;
    /// Next pending event, if any. Never blocks for long.
    async fn poll_event(&mut self) -> Option<PlayerEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Adaptive,
    Native,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Adaptive => write!(f, "adaptive decoder"),
            Strategy::Native => write!(f, "native player"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub adaptive: bool,
    pub native: bool,
}

impl Capabilities {
    pub fn probe(config: &PlayerConfig) -> Self {
        let capabilities = Self {
            adaptive: command_responds(&config.adaptive_command, "--version"),
            native: command_responds(&config.native_command, "-version"),
        };
        debug!("Player capabilities: {:?}", capabilities);
        capabilities
    }
}

fn command_responds(command: &str, version_flag: &str) -> bool {
    Command::new(command)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Pick how to play `url`. The adaptive decoder is preferred; with
/// `manifests_only` it is kept for `.m3u8` URLs unless nothing else exists.
pub fn select_strategy(
    capabilities: Capabilities,
    url: &str,
    manifests_only: bool,
) -> Option<Strategy> {
    if capabilities.adaptive && (!manifests_only || is_adaptive_manifest(url)) {
        Some(Strategy::Adaptive)
    } else if capabilities.native {
        Some(Strategy::Native)
    } else if capabilities.adaptive {
        Some(Strategy::Adaptive)
    } else {
        None
    }
}

pub enum Decoder {
    Adaptive(MpvPlayer),
    Native(FfplayPlayer),
}

impl Decoder {
    fn build(strategy: Strategy, config: &PlayerConfig) -> Self {
        match strategy {
            Strategy::Adaptive => Decoder::Adaptive(MpvPlayer::new(
                &config.adaptive_command,
                config.extra_args.clone(),
            )),
            Strategy::Native => Decoder::Native(FfplayPlayer::new(
                &config.native_command,
                config.extra_args.clone(),
            )),
        }
    }

    pub fn process_id(&self) -> Option<u32> {
        match self {
            Decoder::Adaptive(p) => p.process_id(),
            Decoder::Native(p) => p.process_id(),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Decoder::Adaptive(_) => Strategy::Adaptive,
            Decoder::Native(_) => Strategy::Native,
        }
    }
}

impl StreamPlayer for Decoder {
    async fn load(&mut self, url: &str) -> Result<()> {
        match self {
            Decoder::Adaptive(p) => p.load(url).await,
            Decoder::Native(p) => p.load(url).await,
        }
    }

    async fn stop(&mut self) -> Result<()> {
        match self {
            Decoder::Adaptive(p) => p.stop().await,
            Decoder::Native(p) => p.stop().await,
        }
    }

    async fn toggle_pause(&mut self) -> Result<()> {
        match self {
            Decoder::Adaptive(p) => p.toggle_pause().await,
            Decoder::Native(p) => p.toggle_pause().await,
        }
    }

    async fn poll_event(&mut self) -> Option<PlayerEvent> {
        match self {
            Decoder::Adaptive(p) => p.poll_event().await,
            Decoder::Native(p) => p.poll_event().await,
        }
    }
}

/// Playback dispatcher. Holds at most one live decoder.
pub struct Player {
    config: PlayerConfig,
    capabilities: Capabilities,
    active: Option<Decoder>,
    loading: bool,
}

impl Player {
    pub fn new(config: PlayerConfig) -> Self {
        let capabilities = Capabilities::probe(&config);
        Self::with_capabilities(config, capabilities)
    }

    pub fn with_capabilities(config: PlayerConfig, capabilities: Capabilities) -> Self {
        Self {
            config,
            capabilities,
            active: None,
            loading: false,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// True from dispatch until first successful play or a terminal error.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Tear down the current decoder and start playing `url` with a new one.
    pub async fn dispatch(&mut self, url: &str) -> Result<Strategy, PlaybackError> {
        self.loading = true;
        self.release().await;

        let Some(strategy) =
            select_strategy(self.capabilities, url, self.config.adaptive_manifests_only)
        else {
            self.loading = false;
            warn!("No player available for {}", url);
            return Err(PlaybackError::NotSupported);
        };

        info!("Playing {} with {}", url, strategy);

        let mut decoder = Decoder::build(strategy, &self.config);
        if let Err(e) = decoder.load(url).await {
            self.loading = false;
            let _ = decoder.stop().await;
            return Err(PlaybackError::Decoder(format!("{:#}", e)));
        }

        debug!("{} running as pid {:?}", strategy, decoder.process_id());
        self.active = Some(decoder);
        Ok(strategy)
    }

    /// Drain one event from the live decoder, updating the loading flag.
    pub async fn poll(&mut self) -> Option<PlayerEvent> {
        let event = self.active.as_mut()?.poll_event().await?;

        match &event {
            PlayerEvent::Ready => self.loading = false,
            PlayerEvent::Error(msg) => {
                warn!("Playback error: {}", msg);
                self.loading = false;
                self.release().await;
            }
            PlayerEvent::Ended => {
                self.loading = false;
                self.release().await;
            }
        }

        Some(event)
    }

    /// Returns false when nothing is playing.
    pub async fn toggle_pause(&mut self) -> Result<bool> {
        match self.active.as_mut() {
            Some(decoder) => {
                decoder.toggle_pause().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn stop(&mut self) {
        self.loading = false;
        self.release().await;
    }

    /// Clean up all resources before exit.
    pub async fn shutdown(&mut self) {
        debug!("Shutting down player");
        self.stop().await;
    }

    /// Forget the live decoder without stopping it, leaving playback running
    /// after this process exits.
    pub fn detach(&mut self) {
        if let Some(decoder) = self.active.take() {
            match decoder {
                Decoder::Adaptive(mut p) => p.detach(),
                Decoder::Native(mut p) => p.detach(),
            }
        }
        self.loading = false;
    }

    async fn release(&mut self) {
        if let Some(mut old) = self.active.take() {
            debug!("Releasing previous {}", old.strategy());
            if let Err(e) = old.stop().await {
                warn!("Failed to stop previous player: {}", e);
            }
        }
    }
}

/// Write an executable shell script standing in for a player binary.
#[cfg(test)]
pub(crate) fn fake_player(dir: &std::path::Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: Capabilities = Capabilities {
        adaptive: true,
        native: true,
    };

    #[test]
    fn test_is_adaptive_manifest() {
        assert!(is_adaptive_manifest("http://server/live/1.m3u8"));
        assert!(is_adaptive_manifest("http://server/live/1.M3U8?token=abc"));
        assert!(!is_adaptive_manifest("http://server/live/1.ts"));
        assert!(!is_adaptive_manifest("http://server/live/1.m3u8.bak"));
    }

    #[test]
    fn test_adaptive_preferred() {
        assert_eq!(
            select_strategy(BOTH, "http://server/1.ts", false),
            Some(Strategy::Adaptive)
        );
        assert_eq!(
            select_strategy(BOTH, "http://server/1.m3u8", false),
            Some(Strategy::Adaptive)
        );
    }

    #[test]
    fn test_manifests_only_policy() {
        assert_eq!(
            select_strategy(BOTH, "http://server/1.ts", true),
            Some(Strategy::Native)
        );
        assert_eq!(
            select_strategy(BOTH, "http://server/1.m3u8", true),
            Some(Strategy::Adaptive)
        );

        let adaptive_only = Capabilities {
            adaptive: true,
            native: false,
        };
        assert_eq!(
            select_strategy(adaptive_only, "http://server/1.ts", true),
            Some(Strategy::Adaptive)
        );
    }

    #[test]
    fn test_native_fallback_and_unsupported() {
        let native_only = Capabilities {
            adaptive: false,
            native: true,
        };
        assert_eq!(
            select_strategy(native_only, "http://server/1.m3u8", false),
            Some(Strategy::Native)
        );
        assert_eq!(
            select_strategy(Capabilities::default(), "http://server/1.m3u8", false),
            None
        );
    }

    #[test]
    fn test_probe_missing_commands() {
        let config = PlayerConfig {
            adaptive_command: "m3u-iptv-no-such-player".to_string(),
            native_command: "m3u-iptv-no-such-player-either".to_string(),
            ..Default::default()
        };
        assert_eq!(Capabilities::probe(&config), Capabilities::default());
    }

    #[tokio::test]
    async fn test_dispatch_without_players() {
        let mut player = Player::with_capabilities(PlayerConfig::default(), Capabilities::default());

        let result = player.dispatch("http://server/1.m3u8").await;
        assert!(matches!(result, Err(PlaybackError::NotSupported)));
        assert!(!player.is_loading());
        assert!(!player.is_active());
        assert_eq!(player.poll().await, None);
        assert!(!player.toggle_pause().await.unwrap());
    }

    fn process_alive(pid: u32) -> bool {
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    /// Dispatch and return the pid of the decoder that took over.
    async fn dispatch_retrying(player: &mut Player, url: &str) -> u32 {
        // A script written moments ago can fail with ETXTBSY while another
        // test thread is between fork and exec.
        for _ in 0..10 {
            if player.dispatch(url).await.is_ok() {
                return player
                    .active
                    .as_ref()
                    .and_then(Decoder::process_id)
                    .unwrap();
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        panic!("fake player did not start");
    }

    #[tokio::test]
    async fn test_dispatch_replaces_live_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlayerConfig {
            native_command: fake_player(dir.path(), "ffplay", "exec sleep 30"),
            ..Default::default()
        };
        let native_only = Capabilities {
            adaptive: false,
            native: true,
        };
        let mut player = Player::with_capabilities(config, native_only);

        let first = dispatch_retrying(&mut player, "http://server/1.ts").await;
        assert!(process_alive(first));
        assert!(player.is_loading());

        let second = dispatch_retrying(&mut player, "http://server/2.ts").await;
        assert_ne!(first, second);
        assert!(!process_alive(first));
        assert!(process_alive(second));
        assert!(player.is_active());

        player.shutdown().await;
        assert!(!process_alive(second));
        assert!(!player.is_active());
        assert!(!player.is_loading());
    }
}
