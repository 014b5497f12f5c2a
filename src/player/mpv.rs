// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::{PlayerEvent, StreamPlayer};

/// How long mpv may sit idle after `loadfile` before the load counts as failed.
const LOAD_GRACE: Duration = Duration::from_secs(5);
const SOCKET_ATTEMPTS: u32 = 20;
const SOCKET_POLL: Duration = Duration::from_millis(500);
const IPC_TIMEOUT: Duration = Duration::from_millis(500);

static SOCKET_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Idle,
    Loading(Instant),
    Playing,
    Finished,
}

/// Adaptive-stream decoder: an mpv process controlled over its JSON IPC socket.
pub struct MpvPlayer {
    command: String,
    extra_args: Vec<String>,
    socket_path: PathBuf,
    process: Option<Child>,
    state: LoadState,
}

impl MpvPlayer {
    pub fn new(command: &str, extra_args: Vec<String>) -> Self {
        Self {
            command: command.to_string(),
            extra_args,
            socket_path: Self::socket_path(),
            process: None,
            state: LoadState::Idle,
        }
    }

    /// A fresh socket per instance so an old mpv shutting down never collides
    /// with its replacement.
    fn socket_path() -> PathBuf {
        let seq = SOCKET_SEQ.fetch_add(1, Ordering::Relaxed);
        let name = format!("mpv-{}-{}.sock", std::process::id(), seq);

        if let Some(dir) = dirs::runtime_dir().or_else(dirs::state_dir) {
            let dir = dir.join("m3u-iptv");
            match fs::create_dir_all(&dir) {
                Ok(()) => return dir.join(name),
                Err(e) => warn!("Failed to create state directory: {}", e),
            }
        }

        let uid = unsafe { libc::getuid() };
        std::env::temp_dir().join(format!("m3u-iptv-{}-{}", uid, name))
    }

    fn send_command(&self, command: Value) -> Result<Value> {
        let mut socket = UnixStream::connect(&self.socket_path).with_context(|| {
            format!("Failed to connect to MPV socket at {:?}", self.socket_path)
        })?;
        socket.set_read_timeout(Some(IPC_TIMEOUT))?;

        let command_str = serde_json::to_string(&command)?;
        debug!("Sending MPV command: {}", command_str);

        socket.write_all(command_str.as_bytes())?;
        socket.write_all(b"\n")?;

        // mpv may push unsolicited event lines; skip until the reply arrives.
        let mut reader = BufReader::new(socket);
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                anyhow::bail!("MPV closed the IPC connection");
            }

            let parsed: Value = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse MPV response: {}", line))?;

            if parsed.get("event").is_some() {
                continue;
            }

            if let Some(error) = parsed.get("error").and_then(|e| e.as_str())
                && error != "success"
            {
                return Err(anyhow::anyhow!("MPV command failed: {}", error));
            }

            return Ok(parsed);
        }
    }

    fn get_property(&self, name: &str) -> Result<Value> {
        let reply = self.send_command(json!({ "command": ["get_property", name] }))?;
        Ok(reply.get("data").cloned().unwrap_or(Value::Null))
    }

    fn is_socket_ready(&self) -> bool {
        self.socket_path.exists() && self.get_property("mpv-version").is_ok()
    }

    async fn launch(&mut self) -> Result<()> {
        if self.socket_path.exists() {
            let _ = fs::remove_file(&self.socket_path);
        }

        let mut cmd = Command::new(&self.command);
        cmd.arg(format!("--input-ipc-server={}", self.socket_path.display()))
            .arg("--idle=yes")
            .arg("--force-window=immediate")
            .arg("--keep-open=no")
            .arg("--no-terminal")
            .arg("--really-quiet")
            .arg("--title=m3u-iptv")
            .args(&self.extra_args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());

        debug!("Launching MPV: {:?}", cmd);
        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to start {}. Is it installed?", self.command))?;
        self.process = Some(child);

        for attempt in 1..=SOCKET_ATTEMPTS {
            sleep(SOCKET_POLL).await;

            if let Some(proc) = self.process.as_mut()
                && let Ok(Some(status)) = proc.try_wait()
            {
                self.process = None;
                error!("MPV exited during startup with status: {:?}", status);
                anyhow::bail!("MPV exited during startup with status: {}", status);
            }

            if self.is_socket_ready() {
                debug!("MPV IPC socket ready after {} attempt(s)", attempt);
                return Ok(());
            }
        }

        anyhow::bail!("MPV IPC socket did not come up")
    }

    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().map(Child::id)
    }

    /// Keep the mpv process running after this handle goes away.
    pub fn detach(&mut self) {
        debug!("Detaching MPV process");
        self.process.take();
    }

    fn exit_event(status: std::process::ExitStatus) -> PlayerEvent {
        // 4 is mpv's "quit by user" code.
        match status.code() {
            Some(0) | Some(4) => PlayerEvent::Ended,
            Some(code) => PlayerEvent::Error(format!("MPV exited with error code: {}", code)),
            None => PlayerEvent::Error("MPV terminated by signal".to_string()),
        }
    }
}

impl StreamPlayer for MpvPlayer {
    async fn load(&mut self, url: &str) -> Result<()> {
        if self.process.is_none() {
            self.launch().await?;
        }

        self.send_command(json!({ "command": ["loadfile", url, "replace"] }))
            .context("Failed to hand stream to MPV")?;
        self.state = LoadState::Loading(Instant::now());
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if self.is_socket_ready() {
            let _ = self.send_command(json!({ "command": ["quit"] }));
        }

        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }

        if self.socket_path.exists() {
            let _ = fs::remove_file(&self.socket_path);
        }

        self.state = LoadState::Idle;
        Ok(())
    }

    async fn toggle_pause(&mut self) -> Result<()> {
        self.send_command(json!({ "command": ["cycle", "pause"] }))?;
        Ok(())
    }

    async fn poll_event(&mut self) -> Option<PlayerEvent> {
        if let Some(proc) = self.process.as_mut() {
            match proc.try_wait() {
                Ok(Some(status)) => {
                    self.process = None;
                    self.state = LoadState::Finished;
                    return Some(Self::exit_event(status));
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to check MPV process status: {}", e),
            }
        }

        match self.state {
            LoadState::Loading(started) => {
                if matches!(self.get_property("playback-time"), Ok(Value::Number(_))) {
                    self.state = LoadState::Playing;
                    return Some(PlayerEvent::Ready);
                }

                let idle = matches!(self.get_property("idle-active"), Ok(Value::Bool(true)));
                if idle && started.elapsed() > LOAD_GRACE {
                    self.state = LoadState::Finished;
                    return Some(PlayerEvent::Error("stream could not be loaded".to_string()));
                }
                None
            }
            LoadState::Playing => {
                if matches!(self.get_property("idle-active"), Ok(Value::Bool(true))) {
                    self.state = LoadState::Finished;
                    return Some(PlayerEvent::Ended);
                }
                None
            }
            LoadState::Idle | LoadState::Finished => None,
        }
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        if let Some(mut child) = self.process.take() {
            if let Ok(None) = child.try_wait() {
                debug!("Terminating MPV process on cleanup");
                let _ = child.kill();
            }
            let _ = child.wait();

            if self.socket_path.exists() {
                let _ = fs::remove_file(&self.socket_path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_paths_are_unique() {
        let a = MpvPlayer::new("mpv", Vec::new());
        let b = MpvPlayer::new("mpv", Vec::new());
        assert_ne!(a.socket_path, b.socket_path);
    }

    #[tokio::test]
    async fn test_idle_player_has_no_events() {
        let mut player = MpvPlayer::new("mpv", Vec::new());
        assert_eq!(player.poll_event().await, None);
        assert!(player.stop().await.is_ok());
    }

    #[tokio::test]
    async fn test_load_with_missing_binary_fails() {
        let mut player = MpvPlayer::new("m3u-iptv-no-such-mpv", Vec::new());
        assert!(player.load("http://server/1.m3u8").await.is_err());
    }
}
