// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
};

use super::app::{App, LoginField, Screen};
use super::widgets::{centered_rect, create_help_widget};
use crate::playlist::Category;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(size);

    draw_header(frame, app, chunks[0]);

    match app.screen {
        Screen::Login => draw_login(frame, app, chunks[1]),
        Screen::Browse => draw_content(frame, app, chunks[1]),
    }

    draw_footer(frame, app, chunks[2]);

    if app.show_help {
        draw_help_overlay(frame, size);
    }

    if app.loading_playlist {
        draw_loading_overlay(frame, size, "Downloading playlist...");
    } else if let Some(title) = &app.stream_loading {
        draw_loading_overlay(frame, size, &format!("Starting {}", title));
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    if app.screen == Screen::Login {
        let header = Paragraph::new("M3U IPTV - Login")
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(header, area);
        return;
    }

    let playlist = app.session.playlist();
    let titles: Vec<Line> = Category::ALL
        .iter()
        .enumerate()
        .map(|(i, category)| {
            Line::from(format!(
                "{} {} ({})",
                i + 1,
                category,
                playlist.entries(*category).len()
            ))
        })
        .collect();

    let active = app.session.render_state().active_category();
    let selected = Category::ALL.iter().position(|c| *c == active).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(block)
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    frame.render_widget(tabs, area);
}

fn draw_login(frame: &mut Frame, app: &App, area: Rect) {
    let form_area = centered_rect(60, 60, area);

    let mut lines = vec![Line::from("")];
    for field in LoginField::ALL {
        let focused = app.login.focus == field;
        let value = match field {
            LoginField::Password => "*".repeat(app.login.password.chars().count()),
            _ => app.login.value(field).to_string(),
        };

        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if focused { "_" } else { "" };

        lines.push(Line::from(Span::styled(
            format!(" {}{}", if focused { "▶ " } else { "  " }, field.label()),
            label_style,
        )));
        lines.push(Line::from(format!("    {}{}", value, cursor)));
        lines.push(Line::from(""));
    }
    lines.push(
        Line::from(" Enter: download playlist | Tab: next field | F1: help")
            .style(Style::default().fg(Color::DarkGray)),
    );

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Provider "),
    );

    frame.render_widget(Clear, form_area);
    frame.render_widget(form, form_area);
}

fn draw_content(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(50),    // Cards
            Constraint::Length(40), // Side panel
        ])
        .split(area);

    draw_card_list(frame, app, chunks[0]);
    draw_side_panel(frame, app, chunks[1]);
}

fn draw_card_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", app.session.list_meta()));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    app.list_area = inner_area;
    app.visible_height = inner_area.height as usize;

    let render = app.session.render_state();
    let cards = render.cards();
    if cards.is_empty() {
        let empty_msg = Paragraph::new(app.session.list_meta().to_string())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty_msg, inner_area);
        return;
    }

    let visible_height = inner_area.height as usize;
    let start = app.scroll_offset.min(cards.len());
    let end = (start + visible_height).min(cards.len());

    let items: Vec<ListItem> = cards[start..end]
        .iter()
        .enumerate()
        .map(|(i, card)| {
            let index = start + i;
            let marker = if render.selected() == Some(index) {
                " ▶ "
            } else {
                "   "
            };
            let line = Line::from(vec![
                Span::raw(marker),
                Span::raw(card.title.clone()),
                Span::styled(
                    format!("  [{}]", card.group),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);

            if render.selected() == Some(index) {
                ListItem::new(
                    line.style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                )
            } else {
                ListItem::new(line)
            }
        })
        .collect();

    frame.render_widget(List::new(items).style(Style::default().fg(Color::White)), inner_area);

    if cards.len() > visible_height {
        draw_scrollbar(frame, inner_area, app.scroll_offset, cards.len(), visible_height);
    }
}

fn draw_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Logs
            Constraint::Length(7), // Details
        ])
        .split(area);

    draw_logs_panel(frame, app, chunks[0]);
    draw_info_panel(frame, app, chunks[1]);
}

fn draw_logs_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Logs ");

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    if app.logs.is_empty() {
        return;
    }

    let visible_count = inner_area.height as usize;
    let start = app.logs.len().saturating_sub(visible_count);

    let log_lines: Vec<Line> = app.logs[start..]
        .iter()
        .map(|(time, msg)| {
            Line::from(vec![
                Span::styled(
                    time.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(msg.clone(), Style::default().fg(Color::Gray)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(log_lines).wrap(Wrap { trim: true }), inner_area);
}

fn draw_info_panel(frame: &mut Frame, app: &App, area: Rect) {
    let mut info_text = Vec::new();

    if let Some(entry) = app.session.selected_entry() {
        info_text.push(Line::from(entry.title.clone()).style(Style::default().fg(Color::White)));
        info_text.push(Line::from(format!("Group: {}", entry.group)));
        if !entry.logo.is_empty() {
            info_text.push(Line::from(format!("Logo: {}", entry.logo)));
        }
    } else {
        info_text.push(Line::from("Press '?' for help"));
    }

    match &app.now_playing {
        Some(title) => info_text.push(
            Line::from(format!("▶ {} (space: pause, s: stop)", title))
                .style(Style::default().fg(Color::Green)),
        ),
        None => info_text.push(Line::from("Nothing playing")),
    }

    let info = Paragraph::new(info_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Info "),
        )
        .style(Style::default().fg(Color::Cyan))
        .wrap(Wrap { trim: true });

    frame.render_widget(info, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let (text, color) = match app.session.status() {
        Some(status) if status.is_error => (format!(" {} ", status.message), Color::Red),
        Some(status) => (format!(" {} ", status.message), Color::Gray),
        None => (
            " Enter your provider details to begin | F1: Help ".to_string(),
            Color::DarkGray,
        ),
    };

    let mut spans = vec![Span::styled(text, Style::default().fg(color))];
    if app.screen == Screen::Browse && app.session.has_more() {
        let render = app.session.render_state();
        let total = app.session.playlist().entries(render.active_category()).len();
        spans.push(Span::styled(
            format!("| {} of {} shown, m: load more ", render.rendered_count(), total),
            Style::default().fg(Color::Yellow),
        ));
    }

    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(footer, area);
}

fn draw_scrollbar(frame: &mut Frame, area: Rect, offset: usize, total: usize, visible: usize) {
    if total <= visible || area.width == 0 || area.height == 0 {
        return;
    }

    let scrollbar_height = area.height as usize;
    let scrollbar_pos = (offset * scrollbar_height) / total;
    let scrollbar_size = ((visible * scrollbar_height) / total).max(1);

    let scrollbar_lines: Vec<Line> = (0..scrollbar_height)
        .map(|i| {
            if i >= scrollbar_pos && i < scrollbar_pos + scrollbar_size {
                Line::from("█")
            } else {
                Line::from("│")
            }
        })
        .collect();

    let scrollbar =
        Paragraph::new(scrollbar_lines).style(Style::default().fg(Color::DarkGray));

    let scrollbar_area = Rect {
        x: area.x + area.width - 1,
        y: area.y,
        width: 1,
        height: area.height,
    };

    frame.render_widget(scrollbar, scrollbar_area);
}

fn draw_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, help_area);
    frame.render_widget(create_help_widget(), help_area);
}

fn draw_loading_overlay(frame: &mut Frame, area: Rect, message: &str) {
    let loading_area = centered_rect(40, 20, area);
    frame.render_widget(Clear, loading_area);

    let loading = Paragraph::new(vec![
        Line::from(""),
        Line::from("⏳ Loading...").style(Style::default().fg(Color::Yellow)),
        Line::from(""),
        Line::from(message.to_string()).style(Style::default().fg(Color::Gray)),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Please Wait "),
    )
    .alignment(Alignment::Center);

    frame.render_widget(loading, loading_area);
}
