// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Browsing state for one loaded playlist: which category is shown, how much
//! of it has been materialized into cards, and which card is selected.
//!
//! Everything here is synchronous; the TUI feeds it events and acts on the
//! effects it returns.

use tracing::debug;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::Error;
use crate::playlist::{Category, Entry, Playlist};

/// Identity of a rendered card. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardId(u64);

/// A materialized list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub group: String,
    pub logo: String,
}

#[derive(Debug, Clone)]
pub struct RenderState {
    active_category: Category,
    cards: Vec<Card>,
    selected: Option<usize>,
}

impl RenderState {
    fn new(active_category: Category) -> Self {
        Self {
            active_category,
            cards: Vec::new(),
            selected: None,
        }
    }

    pub fn active_category(&self) -> Category {
        self.active_category
    }

    /// Number of entries of the active category rendered so far.
    pub fn rendered_count(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }
}

/// Summary line shown above the card list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMeta {
    Idle,
    Loading,
    Failed,
    NoItems(Category),
    Showing { category: Category, total: usize },
}

impl std::fmt::Display for ListMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListMeta::Idle => write!(f, "Log in to load a playlist"),
            ListMeta::Loading => write!(f, "Loading list..."),
            ListMeta::Failed => write!(f, "Loading failed."),
            ListMeta::NoItems(category) => write!(f, "{}: no items found.", category),
            ListMeta::Showing { category, total } => write!(f, "{}: {} items", category, total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub message: String,
    pub is_error: bool,
}

/// Handed out when a download starts; only the newest one is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    SelectNext,
    SelectPrevious,
    Activate,
    Click(CardId),
    LoadMore,
    ShowCategory(Category),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    Play { title: String, url: String },
}

#[derive(Debug)]
pub struct PlayerSession {
    playlist: Playlist,
    render: RenderState,
    page_size: usize,
    next_card_id: u64,
    generation: u64,
    status: Option<StatusLine>,
    meta: ListMeta,
}

impl Default for PlayerSession {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PlayerSession {
    pub fn new(page_size: usize) -> Self {
        Self {
            playlist: Playlist::default(),
            render: RenderState::new(Category::Channels),
            page_size: page_size.max(1),
            next_card_id: 0,
            generation: 0,
            status: None,
            meta: ListMeta::Idle,
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn list_meta(&self) -> &ListMeta {
        &self.meta
    }

    pub fn set_status(&mut self, message: impl Into<String>, is_error: bool) {
        self.status = Some(StatusLine {
            message: message.into(),
            is_error,
        });
    }

    /// Start a new download cycle, superseding any earlier one.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.reset_render(self.render.active_category);
        self.meta = ListMeta::Loading;
        self.set_status("Authenticating and downloading playlist...", false);
        LoadTicket(self.generation)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Apply a finished download. Returns false (and changes nothing) when a
    /// newer load has started since `ticket` was issued.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Playlist, Error>) -> bool {
        if !self.is_current(ticket) {
            debug!("Discarding stale playlist load {:?}", ticket);
            return false;
        }

        match result {
            Ok(playlist) => self.apply_playlist(playlist),
            Err(e) => {
                self.set_status(format!("Could not load the playlist: {}", e), true);
                self.meta = ListMeta::Failed;
            }
        }
        true
    }

    /// Replace the playlist wholesale and show its first non-empty category.
    pub fn apply_playlist(&mut self, playlist: Playlist) {
        let total = playlist.total();
        let start = playlist.preferred_category();
        self.playlist = playlist;

        self.set_status(format!("Playlist loaded. {} items found.", total), false);
        self.render_category(start);
    }

    /// Switch to `category`, discarding everything rendered so far.
    pub fn render_category(&mut self, category: Category) {
        self.reset_render(category);

        if self.playlist.entries(category).is_empty() {
            self.meta = ListMeta::NoItems(category);
            return;
        }

        self.render_next_batch();
    }

    /// Materialize the next page of the active category. Returns how many
    /// cards were appended.
    pub fn render_next_batch(&mut self) -> usize {
        let category = self.render.active_category;
        let entries = self.playlist.entries(category);
        let start = self.render.cards.len();
        let end = (start + self.page_size).min(entries.len());

        for entry in &entries[start..end] {
            let id = CardId(self.next_card_id);
            self.next_card_id += 1;
            self.render.cards.push(Card {
                id,
                title: entry.title.clone(),
                group: entry.group.clone(),
                logo: entry.logo.clone(),
            });
        }

        self.meta = ListMeta::Showing {
            category,
            total: entries.len(),
        };

        end - start
    }

    pub fn has_more(&self) -> bool {
        self.render.cards.len() < self.playlist.entries(self.render.active_category).len()
    }

    /// Move selection down, wrapping to the top. No-op on an empty list.
    pub fn select_next(&mut self) -> bool {
        let count = self.render.cards.len();
        if count == 0 {
            return false;
        }

        let next = match self.render.selected {
            Some(current) => (current + 1) % count,
            None => 0,
        };
        self.select(next)
    }

    /// Move selection up, wrapping to the bottom. No-op on an empty list.
    pub fn select_previous(&mut self) -> bool {
        let count = self.render.cards.len();
        if count == 0 {
            return false;
        }

        let previous = match self.render.selected {
            Some(current) => (current + count - 1) % count,
            None => count - 1,
        };
        self.select(previous)
    }

    /// Activate the selected card, if any.
    pub fn activate(&mut self) -> Option<SessionEffect> {
        let index = self.render.selected?;
        self.activate_index(index)
    }

    /// Direct pick of a card: selects it and activates it.
    pub fn click(&mut self, id: CardId) -> Option<SessionEffect> {
        let index = self.render.cards.iter().position(|card| card.id == id)?;
        self.activate_index(index)
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.render
            .selected
            .and_then(|index| self.playlist.entries(self.render.active_category).get(index))
    }

    /// Single entry point for UI events.
    pub fn handle(&mut self, event: UiEvent) -> Option<SessionEffect> {
        match event {
            UiEvent::SelectNext => {
                self.select_next();
                None
            }
            UiEvent::SelectPrevious => {
                self.select_previous();
                None
            }
            UiEvent::Activate => self.activate(),
            UiEvent::Click(id) => self.click(id),
            UiEvent::LoadMore => {
                if self.has_more() {
                    self.render_next_batch();
                }
                None
            }
            UiEvent::ShowCategory(category) => {
                self.render_category(category);
                None
            }
        }
    }

    fn activate_index(&mut self, index: usize) -> Option<SessionEffect> {
        let entry = self
            .playlist
            .entries(self.render.active_category)
            .get(index)?;
        let effect = SessionEffect::Play {
            title: entry.title.clone(),
            url: entry.stream_url.clone(),
        };

        self.select(index);
        Some(effect)
    }

    fn select(&mut self, index: usize) -> bool {
        if index >= self.render.cards.len() {
            return false;
        }
        let changed = self.render.selected != Some(index);
        self.render.selected = Some(index);
        changed
    }

    fn reset_render(&mut self, category: Category) {
        self.render = RenderState::new(category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentError;

    fn entries(count: usize, group: &str) -> Vec<Entry> {
        (0..count)
            .map(|i| Entry {
                title: format!("{} {}", group, i),
                group: group.to_string(),
                logo: String::new(),
                stream_url: format!("http://server/{}/{}.ts", group, i),
            })
            .collect()
    }

    fn session_with(channels: usize, movies: usize, series: usize) -> PlayerSession {
        let mut session = PlayerSession::default();
        session.apply_playlist(Playlist {
            channels: entries(channels, "News"),
            movies: entries(movies, "Movies"),
            series: entries(series, "Series"),
        });
        session
    }

    #[test]
    fn test_batches_until_exhausted() {
        let mut session = session_with(170, 0, 0);
        assert_eq!(session.render_state().rendered_count(), 80);
        assert!(session.has_more());

        assert_eq!(session.render_next_batch(), 80);
        assert_eq!(session.render_next_batch(), 10);
        assert_eq!(session.render_state().rendered_count(), 170);
        assert!(!session.has_more());

        assert_eq!(session.render_next_batch(), 0);
        assert_eq!(session.render_state().rendered_count(), 170);
        assert_eq!(
            session.list_meta(),
            &ListMeta::Showing {
                category: Category::Channels,
                total: 170
            }
        );
    }

    #[test]
    fn test_cards_follow_source_order() {
        let session = session_with(3, 0, 0);
        let titles: Vec<&str> = session
            .render_state()
            .cards()
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, ["News 0", "News 1", "News 2"]);
    }

    #[test]
    fn test_starts_on_first_non_empty_category() {
        let session = session_with(0, 2, 5);
        assert_eq!(session.render_state().active_category(), Category::Movies);
        assert_eq!(
            session.status().map(|s| s.message.as_str()),
            Some("Playlist loaded. 7 items found.")
        );
    }

    #[test]
    fn test_empty_category_renders_nothing() {
        let mut session = session_with(3, 0, 0);
        session.select_next();

        session.render_category(Category::Series);
        assert_eq!(session.render_state().rendered_count(), 0);
        assert_eq!(session.render_state().selected(), None);
        assert_eq!(session.list_meta(), &ListMeta::NoItems(Category::Series));
        assert!(!session.has_more());
    }

    #[test]
    fn test_category_switch_resets_state() {
        let mut session = session_with(200, 100, 0);
        session.render_next_batch();
        session.select_next();

        session.handle(UiEvent::ShowCategory(Category::Movies));
        assert_eq!(session.render_state().active_category(), Category::Movies);
        assert_eq!(session.render_state().rendered_count(), 80);
        assert_eq!(session.render_state().selected(), None);
    }

    #[test]
    fn test_selection_wraps() {
        let mut session = session_with(3, 0, 0);

        assert!(session.select_next());
        assert_eq!(session.render_state().selected(), Some(0));
        session.select_next();
        session.select_next();
        assert_eq!(session.render_state().selected(), Some(2));
        session.select_next();
        assert_eq!(session.render_state().selected(), Some(0));

        session.select_previous();
        assert_eq!(session.render_state().selected(), Some(2));
    }

    #[test]
    fn test_select_previous_from_none_goes_to_last() {
        let mut session = session_with(3, 0, 0);
        session.select_previous();
        assert_eq!(session.render_state().selected(), Some(2));
    }

    #[test]
    fn test_selection_on_empty_list_is_noop() {
        let mut session = PlayerSession::default();
        assert!(!session.select_next());
        assert!(!session.select_previous());
        assert_eq!(session.render_state().selected(), None);
        assert_eq!(session.activate(), None);
    }

    #[test]
    fn test_activate_requires_selection() {
        let mut session = session_with(2, 0, 0);
        assert_eq!(session.handle(UiEvent::Activate), None);

        session.handle(UiEvent::SelectNext);
        session.handle(UiEvent::SelectNext);
        assert_eq!(
            session.handle(UiEvent::Activate),
            Some(SessionEffect::Play {
                title: "News 1".to_string(),
                url: "http://server/News/1.ts".to_string(),
            })
        );
    }

    #[test]
    fn test_click_selects_and_plays() {
        let mut session = session_with(5, 0, 0);
        let id = session.render_state().cards()[3].id;

        let effect = session.handle(UiEvent::Click(id));
        assert_eq!(
            effect,
            Some(SessionEffect::Play {
                title: "News 3".to_string(),
                url: "http://server/News/3.ts".to_string(),
            })
        );
        assert_eq!(session.render_state().selected(), Some(3));
        assert_eq!(session.selected_entry().map(|e| e.title.as_str()), Some("News 3"));
    }

    #[test]
    fn test_click_on_discarded_card_is_ignored() {
        let mut session = session_with(5, 5, 0);
        let stale = session.render_state().cards()[0].id;

        session.render_category(Category::Movies);
        assert_eq!(session.click(stale), None);
        assert_eq!(session.render_state().selected(), None);
    }

    #[test]
    fn test_load_more_event() {
        let mut session = session_with(100, 0, 0);
        session.handle(UiEvent::LoadMore);
        assert_eq!(session.render_state().rendered_count(), 100);
        session.handle(UiEvent::LoadMore);
        assert_eq!(session.render_state().rendered_count(), 100);
    }

    #[test]
    fn test_custom_page_size() {
        let mut session = PlayerSession::new(2);
        session.apply_playlist(Playlist {
            channels: entries(5, "News"),
            ..Default::default()
        });
        assert_eq!(session.render_state().rendered_count(), 2);
        session.render_next_batch();
        session.render_next_batch();
        assert_eq!(session.render_state().rendered_count(), 5);
        assert!(!session.has_more());
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut session = PlayerSession::default();
        let first = session.begin_load();
        let second = session.begin_load();

        assert!(!session.finish_load(
            first,
            Ok(Playlist {
                channels: entries(1, "Old"),
                ..Default::default()
            })
        ));
        assert!(session.playlist().is_empty());
        assert_eq!(session.list_meta(), &ListMeta::Loading);

        assert!(session.finish_load(
            second,
            Ok(Playlist {
                channels: entries(2, "New"),
                ..Default::default()
            })
        ));
        assert_eq!(session.playlist().channels.len(), 2);
    }

    #[test]
    fn test_failed_load_reports_reason() {
        let mut session = PlayerSession::default();
        let ticket = session.begin_load();
        session.finish_load(ticket, Err(ContentError::Rejected.into()));

        let status = session.status().unwrap();
        assert!(status.is_error);
        assert_eq!(
            status.message,
            "Could not load the playlist: invalid credentials or access blocked"
        );
        assert_eq!(session.list_meta(), &ListMeta::Failed);
    }

    #[test]
    fn test_new_playlist_replaces_old() {
        let mut session = session_with(10, 10, 10);
        session.apply_playlist(Playlist {
            series: entries(1, "Series"),
            ..Default::default()
        });

        assert_eq!(session.playlist().total(), 1);
        assert_eq!(session.render_state().active_category(), Category::Series);
        assert_eq!(session.render_state().rendered_count(), 1);
    }
}
