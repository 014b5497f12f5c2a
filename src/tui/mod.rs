// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

pub mod app;
pub mod event;
pub mod ui;
pub mod widgets;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;

use crate::config::Config;
use crate::player::Player;
use crate::provider::PlaylistClient;
use crate::session::PlayerSession;

pub use app::{Action, App};
pub use event::{Event, EventHandler};

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    pub event_handler: EventHandler,
}

impl Tui {
    pub fn new() -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        let event_handler = EventHandler::new(250);
        Ok(Self {
            terminal,
            event_handler,
        })
    }

    pub fn init(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        self.terminal.draw(|frame| ui::draw(frame, app))?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

/// Run the interactive client. `provider` picks a configured provider to
/// prefill the login form; without one the first configured provider is used.
pub async fn run_tui(config: Config, provider: Option<&str>) -> Result<()> {
    let selected = config
        .find_provider(provider)?
        .or(config.providers.first())
        .cloned();
    let client = PlaylistClient::new(&config.network)?;
    let player = Player::new(config.player.clone());
    let session = PlayerSession::new(config.ui.page_size);

    let mut tui = Tui::new()?;
    tui.init()?;

    let mut app = App::new(session, player, client, selected.as_ref());
    let res = run_app(&mut tui, &mut app).await;

    app.shutdown().await;

    tui.exit()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    tui.draw(app)?;

    loop {
        let event = tokio::time::timeout(
            std::time::Duration::from_millis(250),
            tui.event_handler.next(),
        )
        .await;

        let action = match event {
            Ok(Ok(Event::Key(key_event))) => app.handle_key_event(key_event).await,
            Ok(Ok(Event::Click { column, row })) => app.handle_click(column, row),
            Ok(Ok(Event::Resize(_, _))) => None,
            Ok(Ok(Event::Tick)) => {
                if app.async_tick().await {
                    tui.draw(app)?;
                }
                continue;
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                if app.async_tick().await {
                    tui.draw(app)?;
                }
                continue;
            }
        };

        match action {
            Some(Action::Quit) => break,
            Some(Action::Play { title, url }) => {
                // Show the loading overlay before the decoder starts.
                app.stream_loading = Some(title.clone());
                tui.draw(app)?;
                app.play(title, url).await;
            }
            None => {}
        }

        tui.draw(app)?;
    }

    Ok(())
}
