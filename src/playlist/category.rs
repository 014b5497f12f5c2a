// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde::{Deserialize, Serialize};

const MOVIE_KEYWORDS: [&str; 4] = ["movie", "filme", "film", "vod"];
const SERIES_KEYWORDS: [&str; 3] = ["series", "série", "serie"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Channels,
    Movies,
    Series,
}

impl Category {
    /// Tab order.
    pub const ALL: [Category; 3] = [Category::Channels, Category::Movies, Category::Series];

    /// Classify a free-text group label. Movies are checked before series, and
    /// anything unmatched (or absent) is a channel.
    pub fn from_group(group: Option<&str>) -> Self {
        let group = group.unwrap_or_default().to_lowercase();

        if MOVIE_KEYWORDS.iter().any(|k| group.contains(k)) {
            Category::Movies
        } else if SERIES_KEYWORDS.iter().any(|k| group.contains(k)) {
            Category::Series
        } else {
            Category::Channels
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Channels => "channels",
            Category::Movies => "movies",
            Category::Series => "series",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Category::Channels => Category::Movies,
            Category::Movies => Category::Series,
            Category::Series => Category::Channels,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Category::Channels => Category::Series,
            Category::Movies => Category::Channels,
            Category::Series => Category::Movies,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Channels => write!(f, "Channels"),
            Category::Movies => write!(f, "Movies"),
            Category::Series => write!(f, "Series"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "channels" | "channel" | "live" => Ok(Category::Channels),
            "movies" | "movie" | "vod" => Ok(Category::Movies),
            "series" => Ok(Category::Series),
            _ => anyhow::bail!(
                "Invalid category: {}. Use 'channels', 'movies', or 'series'",
                s
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_movies() {
        assert_eq!(Category::from_group(Some("Movie Channel")), Category::Movies);
        assert_eq!(Category::from_group(Some("FILMES | Ação")), Category::Movies);
        assert_eq!(Category::from_group(Some("4K Films")), Category::Movies);
        assert_eq!(Category::from_group(Some("VOD")), Category::Movies);
    }

    #[test]
    fn test_classify_series() {
        assert_eq!(Category::from_group(Some("Series")), Category::Series);
        assert_eq!(Category::from_group(Some("SÉRIES NETFLIX")), Category::Series);
        assert_eq!(Category::from_group(Some("Serie A")), Category::Series);
    }

    #[test]
    fn test_classify_defaults_to_channels() {
        assert_eq!(Category::from_group(None), Category::Channels);
        assert_eq!(Category::from_group(Some("")), Category::Channels);
        assert_eq!(Category::from_group(Some("News HD")), Category::Channels);
    }

    #[test]
    fn test_movies_rule_wins_over_series() {
        assert_eq!(Category::from_group(Some("Series & Movies")), Category::Movies);
        assert_eq!(Category::from_group(Some("VOD Series")), Category::Movies);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Movies".parse::<Category>().unwrap(), Category::Movies);
        assert_eq!("live".parse::<Category>().unwrap(), Category::Channels);
        assert!("music".parse::<Category>().is_err());
    }

    #[test]
    fn test_as_str_parses_back() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!(Category::Series.as_str(), "series");
    }
}
