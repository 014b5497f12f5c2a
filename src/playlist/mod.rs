// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod attributes;
pub mod category;
pub mod parser;
pub mod validate;

use serde::Serialize;

pub use attributes::parse_attributes;
pub use category::Category;
pub use parser::parse_m3u;
pub use validate::ensure_playlist_content;

/// Marker token opening a descriptor line.
pub const DESCRIPTOR_MARKER: &str = "#EXTINF";

pub const UNTITLED: &str = "Untitled content";
pub const NO_GROUP: &str = "No category";

/// One playlist item with its stream URL attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub title: String,
    pub group: String,
    pub logo: String,
    pub stream_url: String,
}

impl Entry {
    /// Category is derived from the group label, never stored.
    pub fn category(&self) -> Category {
        Category::from_group(Some(&self.group))
    }
}

/// Parse result: one ordered list per category, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Playlist {
    pub channels: Vec<Entry>,
    pub movies: Vec<Entry>,
    pub series: Vec<Entry>,
}

impl Playlist {
    pub fn entries(&self, category: Category) -> &[Entry] {
        match category {
            Category::Channels => &self.channels,
            Category::Movies => &self.movies,
            Category::Series => &self.series,
        }
    }

    pub(crate) fn push(&mut self, category: Category, entry: Entry) {
        match category {
            Category::Channels => self.channels.push(entry),
            Category::Movies => self.movies.push(entry),
            Category::Series => self.series.push(entry),
        }
    }

    pub fn total(&self) -> usize {
        self.channels.len() + self.movies.len() + self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// First non-empty category in tab order, falling back to series.
    pub fn preferred_category(&self) -> Category {
        if !self.channels.is_empty() {
            Category::Channels
        } else if !self.movies.is_empty() {
            Category::Movies
        } else {
            Category::Series
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(group: &str) -> Entry {
        Entry {
            title: "t".to_string(),
            group: group.to_string(),
            logo: String::new(),
            stream_url: "http://example.com/1.ts".to_string(),
        }
    }

    #[test]
    fn test_preferred_category_order() {
        let mut playlist = Playlist::default();
        assert_eq!(playlist.preferred_category(), Category::Series);

        playlist.series.push(entry("Series"));
        playlist.movies.push(entry("Movies"));
        assert_eq!(playlist.preferred_category(), Category::Movies);

        playlist.channels.push(entry("News"));
        assert_eq!(playlist.preferred_category(), Category::Channels);
        assert_eq!(playlist.total(), 3);
    }

    #[test]
    fn test_entry_category_is_derived_from_group() {
        assert_eq!(entry("Movie Channel").category(), Category::Movies);
        assert_eq!(entry("Series | BR").category(), Category::Series);
        assert_eq!(entry(NO_GROUP).category(), Category::Channels);
    }
}
