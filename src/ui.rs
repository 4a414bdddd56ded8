//! Rendering of the terminal user interface with `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Text},
    widgets::{Block, Borders, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, RadioStatus, View};
use crate::config::{ControlsSettings, UiSettings};
use crate::playback::{PlaybackState, PlaybackView};

static CONTROLS_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(|| {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    map.insert("j/k".to_string(), "up/down".to_string());
    map.insert("gg/G".to_string(), "top/bottom".to_string());
    map.insert("enter".to_string(), "load selected".to_string());
    map.insert("space/p".to_string(), "play/pause".to_string());
    map.insert("s".to_string(), "stop".to_string());
    // H/L is filled in from config.
    map.insert("tab".to_string(), "library/radio".to_string());
    map.insert("/".to_string(), "search".to_string());
    map.insert("R".to_string(), "reset playlist".to_string());
    map.insert("q".to_string(), "quit".to_string());
    map
});

/// Controls help line, with the configured seek step.
fn controls_text(seek_step_ms: u64) -> String {
    let order = [
        "j/k", "gg/G", "enter", "space/p", "s", "H/L", "tab", "/", "R", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] seek -/+{}s", seek_step_ms / 1000))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// "Playing • Artist - Title" style line for the status box.
fn now_playing_text(view: &PlaybackView) -> String {
    let state = view.snapshot.state.label();
    match &view.snapshot.track {
        Some(track) if track.source.is_remote() => format!("{state} • {} (live)", track.name),
        Some(track) => format!("{state} • {}", track.name),
        None => state.to_string(),
    }
}

fn list_title(app: &App) -> String {
    match app.view {
        View::Library => format!(" library ({}) ", app.library.len()),
        View::Radio => match app.radio_status {
            RadioStatus::Idle | RadioStatus::Loading => " radio (loading stations...) ".to_string(),
            RadioStatus::Ready { builtin: true } => " radio (offline fallback) ".to_string(),
            RadioStatus::Ready { builtin: false } => format!(" radio ({}) ", app.stations.len()),
        },
    }
}

/// Whether entry `i` of the current view is the track being played.
fn is_playing_entry(app: &App, i: usize, playing_id: Option<&str>) -> bool {
    playing_id.is_some() && app.entry_id(i) == playing_id
}

fn entry_item<'a>(app: &'a App, i: usize, playing_id: Option<&str>) -> ListItem<'a> {
    let name = app.entry_name(i).unwrap_or_default();
    let detail = Line::from(app.entry_detail(i).unwrap_or_default()).fg(Color::DarkGray);
    if is_playing_entry(app, i, playing_id) {
        ListItem::new(Text::from(vec![Line::from(format!("♪ {name}")).bold(), detail]))
    } else {
        ListItem::new(Text::from(vec![Line::from(name), detail]))
    }
}

pub fn draw(
    frame: &mut Frame,
    app: &App,
    display: &[usize],
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" flashplayer ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box: now playing, progress gauge, last message.
    let playback = app.playback();
    let status_block = Block::bordered()
        .padding(Padding {
            left: 1,
            right: 1,
            top: 0,
            bottom: 0,
        })
        .title(" status ");
    let inner = status_block.inner(chunks[1]);
    frame.render_widget(status_block, chunks[1]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let mut now_playing = Paragraph::new(now_playing_text(&playback));
    if playback.snapshot.state == PlaybackState::Loading {
        now_playing = now_playing.slow_blink();
    }
    frame.render_widget(now_playing, rows[0]);

    let progress = &playback.progress;
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .use_unicode(true)
        .ratio(progress.ratio)
        .label(format!(
            "{} / {}",
            progress.position_label, progress.duration_label
        ));
    frame.render_widget(gauge, rows[1]);

    let message = match (&app.notice, &playback.last_error) {
        (Some(notice), _) => Paragraph::new(notice.as_str()),
        (None, Some(err)) => Paragraph::new(err.as_str()).fg(Color::Red),
        (None, None) => {
            let q = app.filter_query.trim();
            if app.filter_mode || !q.is_empty() {
                Paragraph::new(format!("SEARCH: {q}"))
            } else {
                Paragraph::new("")
            }
        }
    };
    frame.render_widget(message, rows[2]);

    // Main list
    {
        // Only build ListItems for the visible window, centred on the cursor.
        // Every entry takes two rows: name, then date.
        let total = display.len();
        let list_height = (chunks[2].height.saturating_sub(2) / 2) as usize;
        let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
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

        let playing_id = playback.snapshot.track.as_ref().map(|t| t.id.as_str());
        let visible_items: Vec<ListItem> = display[start..end]
            .iter()
            .map(|&i| entry_item(app, i, playing_id))
            .collect();

        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(list_title(app)))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    let footer = Paragraph::new(controls_text(controls_settings.seek_step_ms))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[3]);
}
