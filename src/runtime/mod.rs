use std::env;
use std::error::Error;
use std::path::Path;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{info, warn};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::RodioBackend;
use crate::config::Settings;
use crate::library::{MemoryPlaylist, PlaylistRepository, TomlPlaylistStore, import_directory};
use crate::playback::TransportController;

mod event_loop;
mod logging;
mod radio_lookup;
mod settings;

fn open_playlist(settings: &Settings) -> Box<dyn PlaylistRepository> {
    match settings.playlist_path() {
        Some(path) => {
            info!("playlist at {}", path.display());
            Box::new(TomlPlaylistStore::new(path))
        }
        None => {
            warn!("no data directory; the playlist will not be saved");
            Box::new(MemoryPlaylist::default())
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let (settings, settings_warning) = settings::load_settings();

    let logging = match logging::init(&settings) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("flashplayer: logging disabled: {e}");
            None
        }
    };
    if let Some(msg) = settings_warning {
        if logging.is_some() {
            warn!("{msg}");
        } else {
            eprintln!("flashplayer: {msg}");
        }
    }
    info!("starting flashplayer {}", env!("CARGO_PKG_VERSION"));

    let mut playlist = open_playlist(&settings);
    let mut notice = None;

    if let Some(dir) = env::args().nth(1) {
        match import_directory(playlist.as_mut(), Path::new(&dir), &settings.library) {
            Ok(added) => notice = Some(format!("imported {added} new tracks from {dir}")),
            Err(e) => {
                warn!("import of {dir} failed: {e}");
                notice = Some(format!("import failed: {e}"));
            }
        }
    }

    let tracks = match playlist.list() {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!("could not read playlist: {e}");
            notice = Some(format!("could not read playlist: {e}"));
            Vec::new()
        }
    };

    let (events_tx, events_rx) = mpsc::channel();
    let backend = RodioBackend::spawn(events_tx, settings.audio.clone())?;
    let mut controller = TransportController::new(backend, events_rx, settings.audio.auto_start);

    let mut app = App::new(tracks);
    app.set_playback_handle(controller.view_handle());
    app.notice = notice;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::new();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &mut controller,
        playlist.as_mut(),
        &mut state,
    );

    controller.teardown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("bye");
    run_result
}
