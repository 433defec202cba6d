//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, NoticeLevel, Row};
use crate::audio::PlaybackStatus;
use crate::config::UiSettings;
use crate::library::Node;

const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "play / fold"),
    ("space", "mark"),
    ("d", "delete"),
    ("u", "upload"),
    ("r", "rebuild"),
    ("p", "pause"),
    ("s", "stop"),
    ("q", "quit"),
];

fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn left_pad() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

/// One tree line: indent, fold glyph, mark, name.
fn row_label(app: &App, row: &Row) -> String {
    let indent = "  ".repeat(row.depth);
    let glyph = match row.node.as_ref() {
        Node::Folder(_) if row.open => "▾ ",
        Node::Folder(_) => "▸ ",
        Node::File(_) => "  ",
    };
    let mark = if app.marked.contains(row.node.path()) {
        "* "
    } else {
        ""
    };
    format!("{indent}{glyph}{mark}{}", row.node.name())
}

fn status_text(app: &App) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(format!(" DIR: {}", app.library.dir().display()));
    parts.push(format!("ITEMS: {}", app.root.descendant_count()));
    if !app.marked.is_empty() {
        parts.push(format!("MARKED: {}", app.marked.len()));
    }

    if let Some(info) = app.playback() {
        let name = info
            .path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match info.status {
            PlaybackStatus::Idle => parts.push("Stopped".to_string()),
            PlaybackStatus::Playing => {
                parts.push(format!("Song: {} [{}]", name, format_mmss(info.elapsed)));
                parts.push("Playing".to_string());
            }
            PlaybackStatus::Paused => {
                parts.push(format!("Song: {} [{}]", name, format_mmss(info.elapsed)));
                parts.push("Paused".to_string());
            }
            PlaybackStatus::Failed(reason) => parts.push(format!("Playback error: {reason}")),
        }
    }

    parts.join(" • ")
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, rows: &[Row], ui_settings: &UiSettings) {
    let notice_height = ui_settings.notice_lines.max(1) as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(notice_height),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" tunetree ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status_par = Paragraph::new(status_text(app))
        .block(Block::bordered().padding(left_pad()).title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Tree
    {
        // Only build ListItems for the visible window, centered on the cursor when possible.
        let total = rows.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let visible_items: Vec<ListItem> = rows[start..end]
            .iter()
            .map(|row| {
                let item = ListItem::new(row_label(app, row));
                if app.marked.contains(row.node.path()) {
                    item.style(Style::default().fg(Color::Yellow))
                } else {
                    item
                }
            })
            .collect();

        let title = if total == 0 {
            " library (empty, press u to upload) ".to_string()
        } else {
            " library ".to_string()
        };
        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Notices
    let lines: Vec<Line> = app
        .notices
        .iter()
        .map(|n| {
            let line = Line::from(n.text.as_str());
            match n.level {
                NoticeLevel::Info => line,
                NoticeLevel::Warn => line.yellow(),
                NoticeLevel::Error => line.red(),
            }
        })
        .collect();
    let notices = Paragraph::new(lines)
        .block(Block::bordered().padding(left_pad()).title(" notices "))
        .wrap(Wrap { trim: true });
    frame.render_widget(notices, chunks[3]);

    if app.confirm_delete {
        let popup_area = centered_rect_sized(60, 5, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let text = format!(
            "Delete {} item(s) from disk? [y] yes, any other key cancels",
            app.delete_targets().len()
        );
        let popup = Paragraph::new(text)
            .block(Block::bordered().padding(left_pad()).title(" delete "))
            .wrap(Wrap { trim: true });
        frame.render_widget(popup, popup_area);
    }

    if let Some(prompt) = &app.prompt {
        let popup_area = centered_rect_sized(80, 12, chunks[2]);
        frame.render_widget(Clear, popup_area);

        let mut lines: Vec<Line> = prompt
            .entries
            .iter()
            .map(|p| Line::from(format!("  {}", p.display())))
            .collect();
        lines.push(Line::from(format!("> {}_", prompt.input)).bold());
        lines.push(Line::from(""));
        let hint = if prompt.request.multi_select {
            format!(
                "one path per line • empty line: {} • esc: cancel • allowed: {}",
                prompt.request.button_label,
                prompt.request.extensions.join(", ")
            )
        } else {
            format!(
                "enter: {} • esc: cancel • allowed: {}",
                prompt.request.button_label,
                prompt.request.extensions.join(", ")
            )
        };
        lines.push(Line::from(hint).italic());

        let popup = Paragraph::new(lines)
            .block(
                Block::bordered()
                    .padding(left_pad())
                    .title(format!(" {} ", prompt.request.title)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(popup, popup_area);
    }

    let footer = Paragraph::new(controls_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_pad()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
