// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use std::time::Duration;

use m3u_iptv::Player;
use m3u_iptv::player::PlayerEvent;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Play a single stream URL outside the TUI.
pub struct PlayCommand {
    pub url: String,
    pub detached: bool,
}

impl PlayCommand {
    pub async fn execute(self, mut player: Player) -> Result<()> {
        let strategy = player.dispatch(&self.url).await?;
        eprintln!("Playing {} with {}", self.url, strategy);

        if self.detached {
            player.detach();
            println!("Stream started in detached window");
            println!("The player will continue running independently");
            return Ok(());
        }

        println!("Starting playback... (Ctrl+C to stop, or use --detached to run in background)");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    player.stop().await;
                    println!("Playback stopped");
                    return Ok(());
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }

            while let Some(event) = player.poll().await {
                match event {
                    PlayerEvent::Ready => eprintln!("Playback started"),
                    PlayerEvent::Ended => {
                        println!("Playback ended");
                        return Ok(());
                    }
                    PlayerEvent::Error(msg) => anyhow::bail!("Playback failed: {}", msg),
                }
            }
        }
    }
}
