use std::mem;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::library::Track;

use super::backend::{AudioBackend, BackendCommand, BackendEvent, HandleId};
use super::error::PlaybackError;
use super::projection::{ProgressProjection, project};
use super::session::{
    Applied, PlaybackSession, PlaybackSnapshot, PlaybackState, UNKNOWN_DURATION_MS,
};

/// What the presentation layer renders. Replaced as a whole on every change.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackView {
    pub snapshot: PlaybackSnapshot,
    pub progress: ProgressProjection,
    pub last_error: Option<String>,
    /// Bumped on every published change.
    pub revision: u64,
}

impl Default for PlaybackView {
    fn default() -> Self {
        Self {
            snapshot: PlaybackSnapshot::default(),
            progress: project(0, UNKNOWN_DURATION_MS),
            last_error: None,
            revision: 0,
        }
    }
}

pub type ViewHandle = Arc<Mutex<PlaybackView>>;

/// Owns the playback session and the single backend resource behind it.
///
/// Backend events are drained at the start of every operation, so every
/// decision is made against the newest state the backend has reported.
pub struct TransportController<B: AudioBackend> {
    backend: B,
    events: Receiver<BackendEvent>,
    session: PlaybackSession,
    view: ViewHandle,
    auto_start: bool,
    last_error: Option<String>,
    surfaced: Vec<PlaybackError>,
}

impl<B: AudioBackend> TransportController<B> {
    pub fn new(backend: B, events: Receiver<BackendEvent>, auto_start: bool) -> Self {
        Self {
            backend,
            events,
            session: PlaybackSession::new(),
            view: Arc::new(Mutex::new(PlaybackView::default())),
            auto_start,
            last_error: None,
            surfaced: Vec::new(),
        }
    }

    pub fn view_handle(&self) -> ViewHandle {
        Arc::clone(&self.view)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.session.snapshot()
    }

    #[cfg(test)]
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Apply everything the backend reported since the last call and return
    /// the errors that surfaced meanwhile.
    pub fn pump(&mut self) -> Vec<PlaybackError> {
        self.drain_events();
        mem::take(&mut self.surfaced)
    }

    /// Open `track` and make it current. Loading the track that is already
    /// open does nothing.
    pub fn load(&mut self, track: Track) -> Result<(), PlaybackError> {
        self.drain_events();
        if self.session.holds(&track.id) {
            debug!("{} is already loaded", track.name);
            return Ok(());
        }

        let source = track.source.clone();
        info!("loading {} from {source}", track.name);
        let (handle, previous) = self.session.begin_load(track);
        if let Some(previous) = previous {
            self.release_quietly(previous);
        }
        self.last_error = None;

        let result = self.backend.open(handle, &source, self.auto_start);
        if let Err(error) = &result {
            warn!("open {handle} could not be submitted: {error}");
            self.session.fail_load(handle);
            self.last_error = Some(PlaybackError::Open(error.clone()).to_string());
        }
        self.publish();
        result.map_err(PlaybackError::from)
    }

    /// Make `track` current without opening it. The next toggle loads it.
    pub fn cue(&mut self, track: Track) {
        self.drain_events();
        if let Some(previous) = self.session.cue(track) {
            self.release_quietly(previous);
        }
        self.publish();
    }

    /// Cue `track` while nothing has been played yet, so the first toggle
    /// starts what the user is pointing at. Otherwise does nothing.
    pub fn cue_if_idle(&mut self, track: Track) {
        self.drain_events();
        let current = self.session.current_track().map(|t| t.id.as_str());
        if self.session.state() == PlaybackState::Idle && current != Some(track.id.as_str()) {
            debug!("cueing {}", track.name);
            self.cue(track);
        }
    }

    /// Decides against the intended state, so a second press before the
    /// backend answers the first still flips it back.
    pub fn toggle_play_pause(&mut self) -> Result<(), PlaybackError> {
        self.drain_events();
        match self.session.intended_state() {
            PlaybackState::Playing => self.send(BackendCommand::Pause),
            PlaybackState::Paused => self.send(BackendCommand::Resume),
            PlaybackState::Idle | PlaybackState::Stopped => {
                // A stop may still be in flight; that resource is abandoned.
                if let Some(handle) = self.session.take_resource() {
                    info!("abandoning stopping {handle} to restart");
                    self.release_quietly(handle);
                }
                match self.session.current_track().cloned() {
                    Some(track) => self.load(track),
                    None => Ok(()),
                }
            }
            // Reload explicitly to retry a failed track.
            PlaybackState::Loading | PlaybackState::Failed => Ok(()),
        }
    }

    pub fn stop(&mut self) -> Result<(), PlaybackError> {
        self.drain_events();
        match self.session.intended_state() {
            PlaybackState::Playing | PlaybackState::Paused => self.send(BackendCommand::Stop),
            PlaybackState::Loading => {
                if let Some(handle) = self.session.cancel_load() {
                    info!("cancelled loading {handle}");
                    self.release_quietly(handle);
                }
                self.publish();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Seek by `delta_ms` from the current position, clamped to the track.
    pub fn seek_relative(&mut self, delta_ms: i64) -> Result<(), PlaybackError> {
        self.drain_events();
        if !matches!(
            self.session.intended_state(),
            PlaybackState::Playing | PlaybackState::Paused
        ) {
            return Ok(());
        }
        let position_ms = self.session.seek_target(delta_ms);
        self.send(BackendCommand::Seek { position_ms })
    }

    /// Release the resource and return to `Idle`. Safe to call repeatedly;
    /// release failures are logged and swallowed.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.session.take_resource() {
            info!("releasing {handle} on teardown");
            self.release_quietly(handle);
        }
        self.session.reset();
        while self.events.try_recv().is_ok() {}
        self.last_error = None;
        self.publish();
    }

    fn send(&mut self, command: BackendCommand) -> Result<(), PlaybackError> {
        let Some(handle) = self.session.active_handle() else {
            return Ok(());
        };
        debug!("{command} -> {handle}");
        let result = match command {
            BackendCommand::Pause => self.backend.pause(handle),
            BackendCommand::Resume => self.backend.resume(handle),
            BackendCommand::Stop => self.backend.stop(handle),
            BackendCommand::Seek { position_ms } => self.backend.seek(handle, position_ms),
        };
        if result.is_ok() {
            self.session.note_sent(command);
        }
        result.map_err(|error| {
            let error = PlaybackError::Command { command, error };
            warn!("{error}");
            self.last_error = Some(error.to_string());
            self.publish();
            error
        })
    }

    fn drain_events(&mut self) {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => changed |= self.apply(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if changed {
            self.publish();
        }
    }

    fn apply(&mut self, event: BackendEvent) -> bool {
        let handle = event.handle();
        match self.session.apply(event) {
            Applied::Stale => {
                debug!("dropping event from stale resource {handle}");
                false
            }
            Applied::Unchanged => false,
            Applied::Changed => true,
            Applied::Stopped(handle) => {
                self.release_quietly(handle);
                true
            }
            Applied::OpenFailed(error) => {
                self.surface(PlaybackError::Open(error));
                true
            }
            Applied::Rejected { command, error } => {
                self.surface(PlaybackError::Command { command, error });
                true
            }
        }
    }

    fn surface(&mut self, error: PlaybackError) {
        warn!("{error}");
        self.last_error = Some(error.to_string());
        self.surfaced.push(error);
    }

    fn release_quietly(&mut self, handle: HandleId) {
        if let Err(error) = self.backend.release(handle) {
            warn!("releasing {handle} failed: {error}");
        }
    }

    fn publish(&mut self) {
        let snapshot = self.session.snapshot();
        if let Ok(mut view) = self.view.lock() {
            if view.snapshot == snapshot && view.last_error == self.last_error {
                return;
            }
            view.progress = snapshot.progress();
            view.snapshot = snapshot;
            view.last_error = self.last_error.clone();
            view.revision += 1;
        }
    }
}

impl<B: AudioBackend> Drop for TransportController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
