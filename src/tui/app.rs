// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Position, Rect};
use tokio::sync::mpsc;

use crate::config::ProviderConfig;
use crate::error::{Error, PlaybackError};
use crate::player::{Player, PlayerEvent};
use crate::playlist::{Category, Playlist};
use crate::provider::{Credentials, PlaylistClient};
use crate::session::{LoadTicket, PlayerSession, SessionEffect, UiEvent};

type LoadResult = (LoadTicket, Result<Playlist, Error>);

const MAX_LOGS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Browse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Server,
    Username,
    Password,
}

impl LoginField {
    pub const ALL: [LoginField; 3] = [LoginField::Server, LoginField::Username, LoginField::Password];

    fn next(self) -> Self {
        match self {
            LoginField::Server => LoginField::Username,
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Server,
        }
    }

    fn previous(self) -> Self {
        match self {
            LoginField::Server => LoginField::Password,
            LoginField::Username => LoginField::Server,
            LoginField::Password => LoginField::Username,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoginField::Server => "Server URL",
            LoginField::Username => "Username",
            LoginField::Password => "Password",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub server: String,
    pub username: String,
    pub password: String,
    pub focus: LoginField,
}

impl LoginForm {
    fn from_provider(provider: Option<&ProviderConfig>) -> Self {
        match provider {
            Some(p) => Self {
                server: p.server.clone(),
                username: p.username.clone(),
                password: p.password.clone(),
                focus: LoginField::Server,
            },
            None => Self::default(),
        }
    }

    pub fn value(&self, field: LoginField) -> &str {
        match field {
            LoginField::Server => &self.server,
            LoginField::Username => &self.username,
            LoginField::Password => &self.password,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Server => &mut self.server,
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Play { title: String, url: String },
}

pub struct App {
    pub screen: Screen,
    pub login: LoginForm,
    pub session: PlayerSession,
    pub player: Player,
    client: PlaylistClient,
    load_sender: mpsc::UnboundedSender<LoadResult>,
    load_receiver: mpsc::UnboundedReceiver<LoadResult>,
    pub loading_playlist: bool,
    /// Title of the stream being started; drives the loading overlay.
    pub stream_loading: Option<String>,
    pub now_playing: Option<String>,
    pub scroll_offset: usize,
    pub visible_height: usize,
    /// Where the card list was last drawn, for mapping clicks to cards.
    pub list_area: Rect,
    pub show_help: bool,
    pub logs: Vec<(DateTime<Local>, String)>,
}

impl App {
    pub fn new(
        session: PlayerSession,
        player: Player,
        client: PlaylistClient,
        provider: Option<&ProviderConfig>,
    ) -> Self {
        let (load_sender, load_receiver) = mpsc::unbounded_channel();

        let mut app = Self {
            screen: Screen::Login,
            login: LoginForm::from_provider(provider),
            session,
            player,
            client,
            load_sender,
            load_receiver,
            loading_playlist: false,
            stream_loading: None,
            now_playing: None,
            scroll_offset: 0,
            visible_height: 20,
            list_area: Rect::default(),
            show_help: false,
            logs: Vec::new(),
        };

        let capabilities = app.player.capabilities();
        if !capabilities.adaptive && !capabilities.native {
            app.add_log("No player found: install mpv or ffplay to play streams".to_string());
        }
        if let Some(p) = provider {
            app.add_log(format!("Using provider: {}", p.display_name()));
        }

        app
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::F(1) | KeyCode::Esc) {
                self.show_help = false;
            }
            return None;
        }

        if key.code == KeyCode::F(1) {
            self.show_help = true;
            return None;
        }

        match self.screen {
            Screen::Login => {
                self.handle_login_key(key);
                None
            }
            Screen::Browse => self.handle_browse_key(key).await,
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.login.focus = self.login.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.login.focus = self.login.focus.previous(),
            KeyCode::Enter => self.submit_login(),
            KeyCode::Backspace => {
                self.login.focused_mut().pop();
            }
            KeyCode::Esc => {
                if !self.session.playlist().is_empty() {
                    self.screen = Screen::Browse;
                }
            }
            KeyCode::Char(c) => self.login.focused_mut().push(c),
            _ => {}
        }
    }

    async fn handle_browse_key(&mut self, key: KeyEvent) -> Option<Action> {
        let active = self.session.render_state().active_category();

        match key.code {
            KeyCode::Char('q') => return Some(Action::Quit),
            KeyCode::Down | KeyCode::Char('j') => return self.dispatch(UiEvent::SelectNext),
            KeyCode::Up | KeyCode::Char('k') => return self.dispatch(UiEvent::SelectPrevious),
            KeyCode::Enter => return self.dispatch(UiEvent::Activate),
            KeyCode::Char(' ') => self.toggle_pause().await,
            KeyCode::Char('1') => return self.dispatch(UiEvent::ShowCategory(Category::Channels)),
            KeyCode::Char('2') => return self.dispatch(UiEvent::ShowCategory(Category::Movies)),
            KeyCode::Char('3') => return self.dispatch(UiEvent::ShowCategory(Category::Series)),
            KeyCode::Right | KeyCode::Tab => {
                return self.dispatch(UiEvent::ShowCategory(active.next()));
            }
            KeyCode::Left | KeyCode::BackTab => {
                return self.dispatch(UiEvent::ShowCategory(active.previous()));
            }
            KeyCode::Char('m') => return self.dispatch(UiEvent::LoadMore),
            KeyCode::PageDown => self.page_down(),
            KeyCode::Char('s') => self.stop_playing().await,
            KeyCode::Char('l') | KeyCode::Esc => self.screen = Screen::Login,
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }

        None
    }

    /// Map a click on the card list to the card under the cursor.
    pub fn handle_click(&mut self, column: u16, row: u16) -> Option<Action> {
        if self.show_help || self.screen != Screen::Browse {
            return None;
        }
        if !self.list_area.contains(Position::new(column, row)) {
            return None;
        }

        let index = self.scroll_offset + (row - self.list_area.y) as usize;
        let id = self.session.render_state().cards().get(index)?.id;
        self.dispatch(UiEvent::Click(id))
    }

    fn dispatch(&mut self, event: UiEvent) -> Option<Action> {
        let effect = self.session.handle(event);

        if let UiEvent::ShowCategory(category) = event {
            self.scroll_offset = 0;
            self.add_log(format!("Showing {}", category));
        }
        self.ensure_selected_visible();

        effect.map(|SessionEffect::Play { title, url }| Action::Play { title, url })
    }

    /// Move a page down; at the last rendered card, render the next batch.
    fn page_down(&mut self) {
        let render = self.session.render_state();
        let count = render.rendered_count();
        if count == 0 {
            return;
        }

        let current = render.selected().unwrap_or(0);
        if render.selected() == Some(count - 1) {
            self.dispatch(UiEvent::LoadMore);
            return;
        }

        let steps = if render.selected().is_none() {
            self.visible_height.min(count - 1) + 1
        } else {
            self.visible_height.max(1).min(count - 1 - current)
        };
        for _ in 0..steps {
            self.session.handle(UiEvent::SelectNext);
        }
        self.ensure_selected_visible();
    }

    fn submit_login(&mut self) {
        let credentials = match Credentials::new(
            &self.login.server,
            &self.login.username,
            &self.login.password,
        ) {
            Ok(credentials) => credentials,
            Err(e) => {
                self.session.set_status(e.to_string(), true);
                self.add_log(format!("Login rejected: {}", e));
                return;
            }
        };

        let ticket = self.session.begin_load();
        self.loading_playlist = true;
        self.scroll_offset = 0;
        self.add_log(format!("Downloading playlist from {}", credentials.server));

        let client = self.client.clone();
        let sender = self.load_sender.clone();
        tokio::spawn(async move {
            let result = client.fetch_playlist(&credentials).await;
            let _ = sender.send((ticket, result));
        });
    }

    /// Apply finished downloads and player events. Returns true if anything
    /// visible changed.
    pub async fn async_tick(&mut self) -> bool {
        let mut redraw = false;

        while let Ok((ticket, result)) = self.load_receiver.try_recv() {
            let outcome = result.as_ref().map(Playlist::total).map_err(|e| e.to_string());
            if !self.session.finish_load(ticket, result) {
                continue;
            }

            self.loading_playlist = false;
            match outcome {
                Ok(total) => {
                    self.screen = Screen::Browse;
                    self.scroll_offset = 0;
                    self.add_log(format!("Playlist loaded: {} items", total));
                }
                Err(e) => self.add_log(format!("Playlist load failed: {}", e)),
            }
            redraw = true;
        }

        while let Some(event) = self.player.poll().await {
            match event {
                PlayerEvent::Ready => self.add_log("Playback started".to_string()),
                PlayerEvent::Error(msg) => {
                    self.now_playing = None;
                    self.add_log(format!("Playback error: {}", msg));
                }
                PlayerEvent::Ended => {
                    self.now_playing = None;
                    self.add_log("Playback ended".to_string());
                }
            }
            redraw = true;
        }

        if self.stream_loading.is_some() && !self.player.is_loading() {
            self.stream_loading = None;
            redraw = true;
        }

        redraw
    }

    pub async fn play(&mut self, title: String, url: String) {
        self.stream_loading = Some(title.clone());

        match self.player.dispatch(&url).await {
            Ok(strategy) => {
                self.add_log(format!("Starting {} ({})", title, strategy));
                self.now_playing = Some(title);
            }
            Err(PlaybackError::NotSupported) => {
                self.now_playing = None;
                self.session
                    .set_status("Playback not supported: install mpv or ffplay", true);
                self.add_log(format!("Cannot play {}: no player available", title));
            }
            Err(e) => {
                self.now_playing = None;
                self.add_log(format!("Playback failed: {}", e));
            }
        }

        if !self.player.is_loading() {
            self.stream_loading = None;
        }
    }

    async fn toggle_pause(&mut self) {
        match self.player.toggle_pause().await {
            Ok(true) => self.add_log("Toggled pause".to_string()),
            Ok(false) => {}
            Err(e) => self.add_log(format!("Pause failed: {}", e)),
        }
    }

    async fn stop_playing(&mut self) {
        if self.player.is_active() {
            self.player.stop().await;
            self.add_log("Stopped playback".to_string());
        }
        self.now_playing = None;
        self.stream_loading = None;
    }

    pub async fn shutdown(&mut self) {
        self.player.shutdown().await;
    }

    fn add_log(&mut self, message: String) {
        tracing::debug!("{}", message);
        self.logs.push((Local::now(), message));
        if self.logs.len() > MAX_LOGS {
            self.logs.remove(0);
        }
    }

    /// Scroll so the selected card is on screen, keeping a line of context.
    fn ensure_selected_visible(&mut self) {
        let Some(position) = self.session.render_state().selected() else {
            return;
        };
        let total = self.session.render_state().rendered_count();
        let visible_height = self.visible_height.max(1);
        let context_lines = if visible_height > 2 { 1 } else { 0 };

        if position < self.scroll_offset + context_lines {
            self.scroll_offset = position.saturating_sub(context_lines);
        } else if position + context_lines >= self.scroll_offset + visible_height {
            let max_scroll = total.saturating_sub(visible_height);
            self.scroll_offset = (position + context_lines + 1)
                .saturating_sub(visible_height)
                .min(max_scroll);
        }
    }
}
