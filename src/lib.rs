// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod config;
pub mod error;
pub mod player;
pub mod playlist;
pub mod provider;
pub mod session;
pub mod setup;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};
pub use player::Player;
pub use playlist::{Category, Entry, Playlist};
pub use provider::{Credentials, PlaylistClient};
pub use session::PlayerSession;
pub use tui::run_tui;
