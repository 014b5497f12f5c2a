// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_RELAY_URL: &str = "https://api.allorigins.win/raw?url=";
pub const DEFAULT_PAGE_SIZE: usize = 80;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: Vec<ProviderConfig>,
    pub player: PlayerConfig,
    pub network: NetworkConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub server: String,
    pub username: String,
    pub password: String,
}

impl ProviderConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.server)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Player driven over IPC, used for adaptive streams.
    pub adaptive_command: String,
    /// Player that is simply handed the URL.
    pub native_command: String,
    pub extra_args: Vec<String>,
    /// Only hand `.m3u8` URLs to the adaptive player.
    pub adaptive_manifests_only: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            adaptive_command: "mpv".to_string(),
            native_command: "ffplay".to_string(),
            extra_args: Vec::new(),
            adaptive_manifests_only: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub relay_url: String,
    pub user_agent: String,
    pub timeout_secs: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub page_size: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("m3u-iptv").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Load the file if it exists, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Case-insensitive lookup by name; the only provider when `name` is None.
    pub fn find_provider(&self, name: Option<&str>) -> Result<Option<&ProviderConfig>> {
        match name {
            Some(name) => self
                .providers
                .iter()
                .find(|p| {
                    p.name
                        .as_ref()
                        .is_some_and(|n| n.to_lowercase() == name.to_lowercase())
                })
                .map(Some)
                .ok_or_else(|| anyhow::anyhow!("Provider '{}' not found", name)),
            None if self.providers.len() == 1 => Ok(self.providers.first()),
            None => Ok(None),
        }
    }
}
