// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use inquire::Select;

use m3u_iptv::Config;
use m3u_iptv::config::ProviderConfig;
use m3u_iptv::provider::Credentials;

pub mod fetch;
pub mod play;

pub use fetch::FetchCommand;
pub use play::PlayCommand;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    M3u,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "m3u" => Ok(Self::M3u),
            _ => anyhow::bail!("Invalid format: {}. Use 'text', 'json', or 'm3u'", s),
        }
    }
}

/// Login details given directly on the command line.
#[derive(Debug, Clone, Default)]
pub struct DirectLogin {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl DirectLogin {
    fn is_empty(&self) -> bool {
        self.server.is_none() && self.username.is_none() && self.password.is_none()
    }
}

/// Context for command execution with provider management
pub struct CommandContext {
    pub config: Config,
    pub selected_provider: Option<String>,
    pub login: DirectLogin,
}

impl CommandContext {
    pub fn new(config: Config, selected_provider: Option<String>, login: DirectLogin) -> Self {
        Self {
            config,
            selected_provider,
            login,
        }
    }

    /// Resolve credentials from command-line flags, falling back to a
    /// configured provider.
    pub fn credentials(&self) -> Result<(Credentials, String)> {
        if !self.login.is_empty() {
            let credentials = Credentials::new(
                self.login.server.as_deref().unwrap_or_default(),
                self.login.username.as_deref().unwrap_or_default(),
                self.login.password.as_deref().unwrap_or_default(),
            )?;
            let name = format!("{}@{}", credentials.username, credentials.server);
            return Ok((credentials, name));
        }

        if self.config.providers.is_empty() {
            anyhow::bail!(
                "No providers configured. Run 'm3u-iptv setup' or pass --server, --username and --password."
            );
        }

        let provider = match self
            .config
            .find_provider(self.selected_provider.as_deref())?
        {
            Some(provider) => provider,
            None => self.prompt_provider_selection()?,
        };

        let credentials = Credentials::new(&provider.server, &provider.username, &provider.password)?;
        Ok((credentials, provider.display_name().to_string()))
    }

    /// Prompt user to select a provider
    fn prompt_provider_selection(&self) -> Result<&ProviderConfig> {
        let provider_names: Vec<String> = self
            .config
            .providers
            .iter()
            .map(|p| p.display_name().to_string())
            .collect();

        let selection = Select::new("Select provider:", provider_names).prompt()?;

        self.config
            .providers
            .iter()
            .find(|p| p.display_name() == selection)
            .ok_or_else(|| anyhow::anyhow!("Provider not found"))
    }
}
