// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::debug;

use super::{PlayerEvent, StreamPlayer};

/// Does an ffplay stderr line show the input was opened or frames are
/// being presented? Progress lines (`-stats`) carry an `A-V:`, `M-V:` or
/// `M-A:` clock field.
fn shows_playback(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("Input #")
        || line.contains("A-V:")
        || line.contains("M-V:")
        || line.contains("M-A:")
}

/// Native sink: ffplay handed the URL directly, no remote control beyond
/// stopping and suspending the process.
pub struct FfplayPlayer {
    command: String,
    extra_args: Vec<String>,
    process: Option<Child>,
    /// Set by the stderr reader once playback is visible.
    started: Arc<AtomicBool>,
    started_reported: bool,
    paused: bool,
}

impl FfplayPlayer {
    pub fn new(command: &str, extra_args: Vec<String>) -> Self {
        Self {
            command: command.to_string(),
            extra_args,
            process: None,
            started: Arc::new(AtomicBool::new(false)),
            started_reported: false,
            paused: false,
        }
    }

    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().map(Child::id)
    }

    fn kill_current(&mut self) {
        if let Some(mut proc) = self.process.take() {
            let _ = proc.kill();
            let _ = proc.wait();
        }
        self.paused = false;
    }

    /// Drain stderr on a thread, flagging `started` when playback shows up.
    /// Stats lines are `\r`-terminated, so split on that as well as newlines.
    fn watch_stderr(&self, child: &mut Child) {
        let Some(stderr) = child.stderr.take() else {
            return;
        };
        let started = Arc::clone(&self.started);

        thread::spawn(move || {
            let reader = BufReader::new(stderr);
            for chunk in reader.split(b'\r').map_while(Result::ok) {
                for line in String::from_utf8_lossy(&chunk).lines() {
                    if shows_playback(line) {
                        started.store(true, Ordering::Relaxed);
                    } else if line.contains("error") || line.contains("Error") {
                        debug!("ffplay stderr: {}", line);
                    }
                }
            }
        });
    }

    pub fn detach(&mut self) {
        debug!("Detaching ffplay process");
        self.process.take();
    }
}

impl StreamPlayer for FfplayPlayer {
    async fn load(&mut self, url: &str) -> Result<()> {
        self.kill_current();

        debug!("Starting ffplay with URL: {}", url);

        let mut cmd = Command::new(&self.command);
        cmd.arg("-window_title")
            .arg("m3u-iptv")
            .arg("-autoexit")
            .arg("-stats")
            .args(&self.extra_args)
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .stdin(Stdio::null());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to start {}", self.command))?;

        self.started = Arc::new(AtomicBool::new(false));
        self.started_reported = false;
        self.watch_stderr(&mut child);
        self.process = Some(child);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.kill_current();
        Ok(())
    }

    async fn toggle_pause(&mut self) -> Result<()> {
        let Some(proc) = self.process.as_ref() else {
            return Ok(());
        };

        let signal = if self.paused {
            libc::SIGCONT
        } else {
            libc::SIGSTOP
        };
        let rc = unsafe { libc::kill(proc.id() as libc::pid_t, signal) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error()).context("Failed to signal ffplay");
        }

        self.paused = !self.paused;
        Ok(())
    }

    async fn poll_event(&mut self) -> Option<PlayerEvent> {
        let proc = self.process.as_mut()?;

        match proc.try_wait() {
            Ok(Some(status)) => {
                self.process = None;
                Some(if status.success() {
                    PlayerEvent::Ended
                } else if let Some(code) = status.code() {
                    PlayerEvent::Error(format!("ffplay exited with error code: {}", code))
                } else {
                    PlayerEvent::Error("ffplay terminated by signal".to_string())
                })
            }
            Ok(None) if !self.started_reported && self.started.load(Ordering::Relaxed) => {
                self.started_reported = true;
                Some(PlayerEvent::Ready)
            }
            Ok(None) => None,
            Err(e) => {
                self.process = None;
                Some(PlayerEvent::Error(format!("Failed to check ffplay status: {}", e)))
            }
        }
    }
}

impl Drop for FfplayPlayer {
    fn drop(&mut self) {
        self.kill_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::fake_player;
    use std::time::Duration;

    async fn load_retrying(player: &mut FfplayPlayer, url: &str) {
        // A script written moments ago can fail with ETXTBSY while another
        // test thread is between fork and exec.
        for _ in 0..10 {
            if player.load(url).await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("fake player did not start");
    }

    /// Poll until a terminal event, or until `limit` polls have passed.
    async fn collect_events(player: &mut FfplayPlayer, limit: usize) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        for _ in 0..limit {
            if let Some(event) = player.poll_event().await {
                let done = event != PlayerEvent::Ready;
                events.push(event);
                if done {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        events
    }

    #[test]
    fn test_shows_playback() {
        assert!(shows_playback("Input #0, hls, from 'http://server/1.m3u8':"));
        assert!(shows_playback(
            "   2.52 A-V: -0.012 fd=   0 aq=   17KB vq=  142KB sq=    0B f=0/0"
        ));
        assert!(shows_playback("   4.10 M-V:  0.003 fd=   1 aq=    0KB vq=   88KB"));
        assert!(!shows_playback("http://server/1.ts: Server returned 404 Not Found"));
        assert!(!shows_playback("ffplay version 6.1.1 Copyright (c) 2003-2023"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let mut player = FfplayPlayer::new("m3u-iptv-no-such-ffplay", Vec::new());
        assert!(player.load("http://server/1.ts").await.is_err());
        assert_eq!(player.poll_event().await, None);
        assert!(player.toggle_pause().await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_stream_is_never_ready() {
        let dir = tempfile::tempdir().unwrap();
        let command = fake_player(
            dir.path(),
            "ffplay",
            "echo 'http://server/1.ts: Connection refused' >&2\nsleep 0.3\nexit 1",
        );

        let mut player = FfplayPlayer::new(&command, Vec::new());
        load_retrying(&mut player, "http://server/1.ts").await;

        let events = collect_events(&mut player, 100).await;
        assert_eq!(
            events,
            vec![PlayerEvent::Error(
                "ffplay exited with error code: 1".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_ready_once_input_opens() {
        let dir = tempfile::tempdir().unwrap();
        let command = fake_player(
            dir.path(),
            "ffplay",
            "sleep 0.2\necho \"Input #0, mpegts, from 'http://server/1.ts':\" >&2\nexec sleep 30",
        );

        let mut player = FfplayPlayer::new(&command, Vec::new());
        load_retrying(&mut player, "http://server/1.ts").await;
        assert_eq!(player.poll_event().await, None);

        let events = collect_events(&mut player, 100).await;
        assert_eq!(events.first(), Some(&PlayerEvent::Ready));
        assert_eq!(player.poll_event().await, None);

        player.stop().await.unwrap();
        assert_eq!(player.process_id(), None);
    }

    #[tokio::test]
    async fn test_quiet_exit_is_ended() {
        // `true` ignores its arguments and exits 0 without output.
        let mut player = FfplayPlayer::new("true", Vec::new());
        player.load("http://server/1.ts").await.unwrap();

        let events = collect_events(&mut player, 50).await;
        assert_eq!(events, vec![PlayerEvent::Ended]);
    }
}
