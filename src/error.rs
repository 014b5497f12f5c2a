// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use thiserror::Error;

/// Rejections raised before any network code runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Enter a valid server URL (e.g. https://myiptv.com)")]
    InvalidServerUrl,
    #[error("Fill in username and password to continue")]
    MissingCredentials,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("relay request failed ({0})")]
    RelayStatus(u16),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Reasons downloaded text is refused before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("empty playlist")]
    Empty,
    #[error("invalid credentials or access blocked")]
    Rejected,
    #[error("does not look like a valid playlist")]
    NotAPlaylist,
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("playback not supported: no usable player found")]
    NotSupported,
    #[error("decoder failed: {0}")]
    Decoder(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
