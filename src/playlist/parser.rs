// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::{Category, DESCRIPTOR_MARKER, Entry, NO_GROUP, Playlist, UNTITLED, parse_attributes};

static STREAM_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("stream url pattern is valid"));

/// Entry built from a descriptor line, waiting for its URL line.
struct PendingEntry {
    title: String,
    group: String,
    category: Category,
    logo: String,
}

impl PendingEntry {
    fn from_descriptor(line: &str) -> Self {
        let attributes = parse_attributes(line);
        let group_title = attributes.get("group-title").filter(|g| !g.is_empty());

        Self {
            title: display_title(line)
                .filter(|t| !t.is_empty())
                .unwrap_or(UNTITLED)
                .to_string(),
            group: group_title.cloned().unwrap_or_else(|| NO_GROUP.to_string()),
            category: Category::from_group(group_title.map(String::as_str)),
            logo: attributes.get("tvg-logo").cloned().unwrap_or_default(),
        }
    }

    fn commit(self, stream_url: &str) -> (Category, Entry) {
        (
            self.category,
            Entry {
                title: self.title,
                group: self.group,
                logo: self.logo,
                stream_url: stream_url.to_string(),
            },
        )
    }
}

/// Display name: everything after the first comma that sits outside a quoted
/// attribute value, so commas inside `group-title="A, B"` don't split it.
fn display_title(line: &str) -> Option<&str> {
    let mut in_quotes = false;

    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return Some(line[i + 1..].trim()),
            _ => {}
        }
    }

    None
}

/// Parse playlist text into per-category lists.
///
/// Descriptor lines open a pending entry which the next URL line commits. A
/// newer descriptor silently replaces an uncommitted one, URL lines with no
/// pending entry are skipped, and anything else is ignored.
pub fn parse_m3u(content: &str) -> Playlist {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut playlist = Playlist::default();
    let mut pending: Option<PendingEntry> = None;
    let mut dropped = 0usize;

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(DESCRIPTOR_MARKER) {
            if pending.replace(PendingEntry::from_descriptor(line)).is_some() {
                dropped += 1;
            }
            continue;
        }

        if STREAM_URL_REGEX.is_match(line)
            && let Some(entry) = pending.take()
        {
            let (category, entry) = entry.commit(line);
            playlist.push(category, entry);
        }
    }

    if pending.is_some() {
        dropped += 1;
    }

    debug!(
        "Parsed playlist: {} channels, {} movies, {} series ({} descriptors without URL)",
        playlist.channels.len(),
        playlist.movies.len(),
        playlist.series.len(),
        dropped
    );

    playlist
}
