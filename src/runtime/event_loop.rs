use std::error::Error;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, RadioStatus, View};
use crate::config;
use crate::library::PlaylistRepository;
use crate::playback::{AudioBackend, PlaybackError, TransportController};
use crate::radio::{Lookup, LookupOrigin, builtin_stations};
use crate::runtime::radio_lookup::spawn_lookup;
use crate::ui;

/// State tracked by the event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Two-key prefix state for `gg`.
    pub pending_gg: bool,
    /// Station lookup in flight, if any.
    pub radio_rx: Option<Receiver<Lookup>>,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Main terminal loop: applies backend events, draws, handles keys.
/// Returns when the user quits; the caller tears playback down.
pub fn run<B: AudioBackend>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    controller: &mut TransportController<B>,
    playlist: &mut dyn PlaylistRepository,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn Error>> {
    follow_cursor(app, controller);
    loop {
        if let Some(error) = controller.pump().pop() {
            app.set_notice(error.to_string());
        }

        poll_radio_lookup(app, state);

        let display = app.display_indices();
        terminal.draw(|f| ui::draw(f, app, &display, &settings.ui, &settings.controls))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, controller, playlist, state) {
                    break;
                }
                follow_cursor(app, controller);
            }
        }
    }

    Ok(())
}

fn poll_radio_lookup(app: &mut App, state: &mut EventLoopState) {
    let Some(rx) = state.radio_rx.as_ref() else {
        return;
    };
    match rx.try_recv() {
        Ok(lookup) => {
            let builtin = lookup.origin == LookupOrigin::Builtin;
            app.set_stations(lookup.stations, builtin);
            state.radio_rx = None;
        }
        Err(TryRecvError::Empty) => {}
        Err(TryRecvError::Disconnected) => {
            warn!("radio lookup thread ended without a result");
            app.set_stations(builtin_stations(), true);
            state.radio_rx = None;
        }
    }
}

/// Show a transport failure in the footer; the controller already logged it.
fn report(app: &mut App, result: Result<(), PlaybackError>) {
    if let Err(e) = result {
        app.set_notice(e.to_string());
    }
}

fn load_selected<B: AudioBackend>(app: &mut App, controller: &mut TransportController<B>) {
    let Some(track) = app.selected_track() else {
        return;
    };
    app.notice = None;
    let result = controller.load(track);
    report(app, result);
}

/// Until something is played, Space starts the entry under the cursor.
fn follow_cursor<B: AudioBackend>(app: &App, controller: &mut TransportController<B>) {
    if let Some(track) = app.selected_track() {
        controller.cue_if_idle(track);
    }
}

fn seek_step(settings: &config::Settings) -> i64 {
    i64::try_from(settings.controls.seek_step_ms).unwrap_or(i64::MAX)
}

/// Returns true when the user asked to quit.
fn handle_key_event<B: AudioBackend>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    controller: &mut TransportController<B>,
    playlist: &mut dyn PlaylistRepository,
    state: &mut EventLoopState,
) -> bool {
    if app.filter_mode {
        state.pending_gg = false;
        match key.code {
            KeyCode::Esc => app.clear_filter(),
            KeyCode::Backspace => app.pop_filter_char(),
            KeyCode::Char('j') | KeyCode::Char('n')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                app.next()
            }
            KeyCode::Char('k') | KeyCode::Char('p')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                app.prev()
            }
            KeyCode::Down => app.next(),
            KeyCode::Up => app.prev(),
            KeyCode::Char(c) => {
                if !c.is_control() {
                    app.push_filter_char(c);
                }
            }
            KeyCode::Enter => {
                if app.display_indices().is_empty() {
                    return false;
                }
                app.exit_filter_mode();
                load_selected(app, controller);
            }
            _ => {}
        }

        return false;
    }

    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => {
            app.toggle_view();
            if app.view == View::Radio && app.radio_status == RadioStatus::Idle {
                info!("looking up {} radio stations", settings.radio.country_code);
                state.radio_rx = Some(spawn_lookup(settings.radio.clone()));
                app.radio_status = RadioStatus::Loading;
            }
        }
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                if let Some(&first) = app.display_indices().first() {
                    app.set_selected(first);
                }
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            if let Some(&last) = app.display_indices().last() {
                app.set_selected(last);
            }
        }
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => load_selected(app, controller),
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let result = controller.toggle_play_pause();
            report(app, result);
        }
        KeyCode::Char('s') => {
            let result = controller.stop();
            report(app, result);
        }
        KeyCode::Char('L') | KeyCode::Right => {
            let result = controller.seek_relative(seek_step(settings));
            report(app, result);
        }
        KeyCode::Char('H') | KeyCode::Left => {
            let result = controller.seek_relative(-seek_step(settings));
            report(app, result);
        }
        KeyCode::Char('R') => match playlist.clear() {
            Ok(()) => {
                info!("playlist reset");
                app.set_library(Vec::new());
                app.set_notice("playlist cleared");
            }
            Err(e) => {
                warn!("playlist reset failed: {e}");
                app.set_notice(format!("reset failed: {e}"));
            }
        },
        _ => {}
    }

    false
}
