// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::fs::File;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use m3u_iptv::playlist::Category;
use m3u_iptv::{Config, Player};

mod cli;
use cli::{CommandContext, DirectLogin, FetchCommand, OutputFormat, PlayCommand};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser)]
#[command(name = "m3u-iptv")]
#[command(about = "A terminal IPTV client for M3U playlists")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging to file (m3u_iptv_debug.log)
    #[arg(long, global = true)]
    debug_log: bool,

    /// Provider name to use (case-insensitive)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive TUI (default if no command given)
    Tui,

    /// Download a playlist and print it
    Fetch {
        /// Server URL (overrides the configured provider)
        #[arg(long)]
        server: Option<String>,
        /// Account username
        #[arg(short, long)]
        username: Option<String>,
        /// Account password
        #[arg(long)]
        password: Option<String>,
        /// Only list this category (channels, movies, series)
        #[arg(short, long)]
        category: Option<String>,
        /// Output format (text, json, m3u)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Maximum number of entries to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Play a stream URL
    Play {
        /// Stream URL
        url: String,
        /// Leave the player running after this command exits
        #[arg(short, long)]
        detached: bool,
    },

    /// Add providers interactively
    Setup,
}

fn init_logging(cli: &Cli) -> Result<()> {
    if cli.debug_log {
        let file = File::create("m3u_iptv_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("m3u_iptv=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config_path = Config::default_path();
    let mut config = Config::load_or_default(&config_path)?;

    match cli.command {
        Some(Commands::Tui) | None => {
            // Only offer setup for TUI mode; the login screen still works without it.
            if m3u_iptv::setup::should_run_setup(&config_path, &config) {
                config = m3u_iptv::setup::interactive_provider_setup(&config_path, config).await?;
            }
            m3u_iptv::run_tui(config, cli.provider.as_deref()).await?;
        }

        Some(Commands::Fetch {
            server,
            username,
            password,
            category,
            format,
            limit,
        }) => {
            let category = category.map(|c| c.parse::<Category>()).transpose()?;
            let format = OutputFormat::from_str(&format)?;
            let context = CommandContext::new(
                config,
                cli.provider,
                DirectLogin {
                    server,
                    username,
                    password,
                },
            );

            let cmd = FetchCommand {
                category,
                format,
                limit,
            };
            cmd.execute(context).await?;
        }

        Some(Commands::Play { url, detached }) => {
            let player = Player::new(config.player.clone());
            let cmd = PlayCommand { url, detached };
            cmd.execute(player).await?;
        }

        Some(Commands::Setup) => {
            m3u_iptv::setup::interactive_provider_setup(&config_path, config).await?;
        }
    }

    Ok(())
}
