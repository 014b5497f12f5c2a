// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use crate::error::ContentError;

use super::DESCRIPTOR_MARKER;

/// Words providers answer with instead of a playlist when they refuse access.
const REJECTION_KEYWORDS: [&str; 5] = ["invalid", "expired", "unauthorized", "forbidden", "blocked"];

/// Sanity-check downloaded text before parsing it.
///
/// This is pattern matching only; the parser still has to cope with whatever
/// gets through.
pub fn ensure_playlist_content(content: &str) -> Result<(), ContentError> {
    let normalized = content.trim();
    if normalized.is_empty() {
        return Err(ContentError::Empty);
    }

    let lowered = normalized.to_lowercase();
    if REJECTION_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return Err(ContentError::Rejected);
    }

    if !normalized.contains(DESCRIPTOR_MARKER) {
        return Err(ContentError::NotAPlaylist);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content() {
        assert_eq!(ensure_playlist_content(""), Err(ContentError::Empty));
        assert_eq!(ensure_playlist_content(" \r\n\t "), Err(ContentError::Empty));
    }

    #[test]
    fn test_rejection_keywords() {
        assert_eq!(ensure_playlist_content("Unauthorized"), Err(ContentError::Rejected));
        assert_eq!(
            ensure_playlist_content("{\"user_info\":{\"status\":\"Expired\"}}"),
            Err(ContentError::Rejected)
        );
        assert_eq!(
            ensure_playlist_content("#EXTM3U\n#EXTINF:-1,IP BLOCKED\nhttp://x/1"),
            Err(ContentError::Rejected)
        );
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(
            ensure_playlist_content("<html><body>Welcome</body></html>"),
            Err(ContentError::NotAPlaylist)
        );
    }

    #[test]
    fn test_valid_playlist() {
        let content = "#EXTM3U\n#EXTINF:-1 group-title=\"News\",BBC\nhttp://server/1.ts\n";
        assert_eq!(ensure_playlist_content(content), Ok(()));
    }
}
