// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use inquire::validator::Validation;
use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use std::path::Path;

use crate::config::{Config, ProviderConfig};
use crate::provider::{Credentials, PlaylistClient, normalize_server_url};

const SETUP_TIMEOUT_SECS: u64 = 30;

/// Interactive first-run setup: prompt for a provider, check that its
/// playlist downloads, and save it to `config_path`.
pub async fn interactive_provider_setup(config_path: &Path, mut config: Config) -> Result<Config> {
    println!("\n🚀 Welcome to M3U IPTV! Let's set up your provider.\n");

    println!("You'll need:");
    println!("  • The provider's server URL");
    println!("  • Your username");
    println!("  • Your password\n");

    let add_provider = Confirm::new("Would you like to add a provider now?")
        .with_default(true)
        .prompt()?;

    if !add_provider {
        println!("\nYou can add a provider later by editing the config file at:");
        println!("  {}", config_path.display());
        println!("or by entering it on the login screen.");
        return Ok(config);
    }

    loop {
        let provider = prompt_for_provider(&config).await?;
        config.providers.push(provider);

        let continue_adding = Confirm::new("Add another provider?")
            .with_default(false)
            .prompt()?;

        if !continue_adding {
            break;
        }
    }

    save_config(config_path, &config)?;

    println!("\n✅ Configuration saved successfully!");
    println!("You can now:");
    println!("  • Run 'm3u-iptv' to launch the interactive TUI");
    println!("  • Run 'm3u-iptv fetch' to list the playlist from the command line");

    Ok(config)
}

async fn prompt_for_provider(config: &Config) -> Result<ProviderConfig> {
    println!("\n📝 Provider Configuration");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━");

    let name = Text::new("Provider name (optional):")
        .with_help_message("A friendly name for this provider")
        .prompt_skippable()?
        .filter(|n| !n.trim().is_empty());

    let server = Text::new("Server URL:")
        .with_help_message("e.g., https://myiptv.com or http://myiptv.com:8080")
        .with_validator(|input: &str| {
            if normalize_server_url(input).is_some() {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    "Enter a valid server URL (e.g. https://myiptv.com)".into(),
                ))
            }
        })
        .prompt()?;

    let username = Text::new("Username:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("Username is required".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    let password = Password::new("Password:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("Password is required".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()?;

    let credentials = Credentials::new(&server, &username, &password)?;

    println!("\nTesting connection...");

    match test_provider_connection(config, &credentials).await {
        Ok(total) => println!("✅ Connection successful! {} items found.", total),
        Err(e) => {
            println!("⚠️  Warning: Could not verify connection: {}", e);
            println!(
                "    The provider will be saved anyway, but you may need to check your credentials."
            );
        }
    }

    Ok(ProviderConfig {
        name,
        server: credentials.server,
        username: credentials.username,
        password: credentials.password,
    })
}

async fn test_provider_connection(config: &Config, credentials: &Credentials) -> Result<usize> {
    let mut client = PlaylistClient::new(&config.network)?;
    client.enable_progress();

    match tokio::time::timeout(
        std::time::Duration::from_secs(SETUP_TIMEOUT_SECS),
        client.fetch_playlist(credentials),
    )
    .await
    {
        Ok(Ok(playlist)) => Ok(playlist.total()),
        Ok(Err(e)) => Err(anyhow::anyhow!("Failed to connect: {}", e)),
        Err(_) => Err(anyhow::anyhow!("Connection timeout")),
    }
}

fn save_config(config_path: &Path, config: &Config) -> Result<()> {
    if config_path.exists() {
        let backup_path = config_path.with_extension("toml.backup");
        std::fs::copy(config_path, &backup_path)?;
        println!(
            "ℹ️  Existing config backed up to: {}",
            backup_path.display()
        );
    }

    config.save(config_path)?;
    println!("💾 Configuration saved to: {}", config_path.display());

    Ok(())
}

pub fn should_run_setup(config_path: &Path, config: &Config) -> bool {
    !config_path.exists() || config.providers.is_empty()
}
