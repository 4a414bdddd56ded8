use crate::library::Track;

use super::backend::{BackendCommand, BackendEvent, BackendStatus, HandleId};
use super::error::{CommandError, ResourceOpenError};
use super::projection::{ProgressProjection, project};

/// Duration used while the real one is unknown. Keeps every ratio finite.
pub const UNKNOWN_DURATION_MS: u64 = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Stopped,
    Failed,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Loading => "Loading",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
            Self::Failed => "Failed",
        }
    }
}

/// Consistent copy of the session published to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub track: Option<Track>,
    pub state: PlaybackState,
    pub position_ms: u64,
    pub duration_ms: u64,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            track: None,
            state: PlaybackState::Idle,
            position_ms: 0,
            duration_ms: UNKNOWN_DURATION_MS,
        }
    }
}

impl PlaybackSnapshot {
    pub fn progress(&self) -> ProgressProjection {
        project(self.position_ms, self.duration_ms)
    }
}

/// What applying one backend event did to the session.
#[derive(Debug, PartialEq, Eq)]
pub enum Applied {
    /// The event belongs to a superseded or released resource.
    Stale,
    Unchanged,
    Changed,
    /// Stop was acknowledged. The session no longer owns the handle and the
    /// caller must release it.
    Stopped(HandleId),
    OpenFailed(ResourceOpenError),
    Rejected {
        command: BackendCommand,
        error: CommandError,
    },
}

/// The playback state machine. Pure bookkeeping: it never talks to the
/// backend, it only says which handle to open or release.
#[derive(Debug)]
pub struct PlaybackSession {
    track: Option<Track>,
    state: PlaybackState,
    position_ms: u64,
    duration_ms: u64,
    active: Option<HandleId>,
    /// Pause, resume or stop sent to `active` and not yet acknowledged.
    pending: Option<BackendCommand>,
    last_handle: u64,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            track: None,
            state: PlaybackState::Idle,
            position_ms: 0,
            duration_ms: UNKNOWN_DURATION_MS,
            active: None,
            pending: None,
            last_handle: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn active_handle(&self) -> Option<HandleId> {
        self.active
    }

    /// The state the session will reach once every command already sent to
    /// the active resource is acknowledged.
    pub fn intended_state(&self) -> PlaybackState {
        match self.pending {
            Some(BackendCommand::Pause) => PlaybackState::Paused,
            Some(BackendCommand::Resume) => PlaybackState::Playing,
            Some(BackendCommand::Stop) => PlaybackState::Stopped,
            _ => self.state,
        }
    }

    /// Remember a transport command the backend accepted for the active
    /// resource. Seeks do not change the intended state.
    pub fn note_sent(&mut self, command: BackendCommand) {
        if matches!(
            command,
            BackendCommand::Pause | BackendCommand::Resume | BackendCommand::Stop
        ) && self.pending != Some(BackendCommand::Stop)
        {
            self.pending = Some(command);
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            track: self.track.clone(),
            state: self.state,
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
        }
    }

    /// True when a resource is open (or opening) for the track with this id
    /// and is not being stopped.
    pub fn holds(&self, track_id: &str) -> bool {
        self.active.is_some()
            && self.pending != Some(BackendCommand::Stop)
            && self.track.as_ref().is_some_and(|t| t.id == track_id)
    }

    /// Start loading `track` under a fresh handle.
    ///
    /// Returns the new handle and the previously held one, if any, which the
    /// caller must release.
    pub fn begin_load(&mut self, track: Track) -> (HandleId, Option<HandleId>) {
        let previous = self.active.take();
        self.last_handle += 1;
        let handle = HandleId(self.last_handle);

        self.track = Some(track);
        self.state = PlaybackState::Loading;
        self.position_ms = 0;
        self.duration_ms = UNKNOWN_DURATION_MS;
        self.active = Some(handle);
        self.pending = None;
        (handle, previous)
    }

    /// The open request for `handle` could not be submitted.
    pub fn fail_load(&mut self, handle: HandleId) {
        if self.active == Some(handle) {
            self.active = None;
            self.state = PlaybackState::Failed;
        }
    }

    /// Make `track` current without opening anything. Returns a handle the
    /// caller must release if one was held.
    pub fn cue(&mut self, track: Track) -> Option<HandleId> {
        let previous = self.active.take();
        self.pending = None;
        self.track = Some(track);
        self.state = PlaybackState::Idle;
        self.position_ms = 0;
        self.duration_ms = UNKNOWN_DURATION_MS;
        previous
    }

    /// Abandon a load in progress. Returns the handle to release.
    pub fn cancel_load(&mut self) -> Option<HandleId> {
        if self.state != PlaybackState::Loading {
            return None;
        }
        self.state = PlaybackState::Stopped;
        self.position_ms = 0;
        self.pending = None;
        self.active.take()
    }

    /// Target for a relative seek, clamped to `[0, duration]`.
    pub fn seek_target(&self, delta_ms: i64) -> u64 {
        let target = i128::from(self.position_ms) + i128::from(delta_ms);
        // Clamped into u64 range above, so the cast is lossless.
        target.clamp(0, i128::from(self.duration_ms)) as u64
    }

    /// Give up ownership of the open resource, if any.
    pub fn take_resource(&mut self) -> Option<HandleId> {
        self.pending = None;
        self.active.take()
    }

    /// Back to the initial state. Handles are never reused after a reset.
    pub fn reset(&mut self) {
        self.track = None;
        self.state = PlaybackState::Idle;
        self.position_ms = 0;
        self.duration_ms = UNKNOWN_DURATION_MS;
        self.active = None;
        self.pending = None;
    }

    pub fn apply(&mut self, event: BackendEvent) -> Applied {
        if self.active != Some(event.handle()) {
            return Applied::Stale;
        }

        match event {
            BackendEvent::Status { status, .. } => self.apply_status(status),
            BackendEvent::OpenFailed { error, .. } => {
                self.active = None;
                self.pending = None;
                self.state = PlaybackState::Failed;
                self.position_ms = 0;
                Applied::OpenFailed(error)
            }
            BackendEvent::Completed { handle, command } => {
                self.settle(command);
                self.apply_completed(handle, command)
            }
            BackendEvent::Rejected { command, error, .. } => {
                self.settle(command);
                Applied::Rejected { command, error }
            }
        }
    }

    /// The backend answered `command`; it is no longer outstanding unless a
    /// later one replaced it.
    fn settle(&mut self, command: BackendCommand) {
        if self.pending == Some(command) {
            self.pending = None;
        }
    }

    fn apply_status(&mut self, status: BackendStatus) -> Applied {
        if !status.is_loaded {
            return Applied::Unchanged;
        }
        let transport = match self.state {
            PlaybackState::Loading | PlaybackState::Playing | PlaybackState::Paused => {
                if status.is_playing {
                    PlaybackState::Playing
                } else {
                    PlaybackState::Paused
                }
            }
            other => other,
        };

        let duration_ms = status
            .duration_ms
            .unwrap_or(UNKNOWN_DURATION_MS)
            .max(UNKNOWN_DURATION_MS);
        let position_ms = status.position_ms.min(duration_ms);

        self.update(transport, position_ms, duration_ms)
    }

    fn apply_completed(&mut self, handle: HandleId, command: BackendCommand) -> Applied {
        let transport = matches!(self.state, PlaybackState::Playing | PlaybackState::Paused);
        match command {
            BackendCommand::Pause if transport => {
                self.update(PlaybackState::Paused, self.position_ms, self.duration_ms)
            }
            BackendCommand::Resume if transport => {
                self.update(PlaybackState::Playing, self.position_ms, self.duration_ms)
            }
            BackendCommand::Seek { position_ms } if transport => {
                self.update(self.state, position_ms.min(self.duration_ms), self.duration_ms)
            }
            BackendCommand::Stop => {
                self.state = PlaybackState::Stopped;
                self.position_ms = 0;
                self.active = None;
                Applied::Stopped(handle)
            }
            _ => Applied::Unchanged,
        }
    }

    fn update(&mut self, state: PlaybackState, position_ms: u64, duration_ms: u64) -> Applied {
        if (self.state, self.position_ms, self.duration_ms) == (state, position_ms, duration_ms) {
            return Applied::Unchanged;
        }
        self.state = state;
        self.position_ms = position_ms;
        self.duration_ms = duration_ms;
        Applied::Changed
    }
}
