// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )])
}

pub fn help_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            "M3U IPTV - Help",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        section("Login:"),
        Line::from("  Tab/↓     - Next field"),
        Line::from("  S-Tab/↑   - Previous field"),
        Line::from("  Enter     - Download playlist"),
        Line::from("  Esc       - Back to the list (if one is loaded)"),
        Line::from(""),
        section("List:"),
        Line::from("  ↓/j ↑/k   - Move selection (wraps around)"),
        Line::from("  Enter     - Play selected item"),
        Line::from("  Click     - Select and play an item"),
        Line::from("  Space     - Pause / resume playback"),
        Line::from("  1/2/3     - Channels / Movies / Series"),
        Line::from("  ←/→       - Previous / next category"),
        Line::from("  PgDn      - Page down (loads more at the end)"),
        Line::from("  m         - Load more items"),
        Line::from("  s         - Stop playback"),
        Line::from("  l         - Back to login"),
        Line::from(""),
        section("General:"),
        Line::from("  ?/F1      - Toggle this help"),
        Line::from("  q         - Quit (list only)"),
        Line::from("  Ctrl+C    - Force quit"),
        Line::from(""),
        Line::from("Press Esc, ? or F1 to close this help"),
    ]
}

pub fn create_help_widget() -> Paragraph<'static> {
    Paragraph::new(help_lines())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(" Help "),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
}
