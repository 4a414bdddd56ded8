//! Contract between the playback core and an audio engine.
//!
//! Commands go in through [`AudioBackend`]; everything the engine has to say
//! comes back as [`BackendEvent`]s on a channel, each tagged with the
//! [`HandleId`] of the resource that produced it.

use std::fmt;

use crate::library::TrackSource;

use super::error::{CommandError, ResourceOpenError};

/// Identity of one opened (or opening) backend resource.
///
/// Allocated by the session, never reused, so events from a released
/// resource can never be mistaken for events of a newer one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Immutable playback report for one resource.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BackendStatus {
    pub is_loaded: bool,
    pub position_ms: u64,
    /// `None` while unknown, and for live streams.
    pub duration_ms: Option<u64>,
    pub is_playing: bool,
}

/// Transport commands that the backend acknowledges.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackendCommand {
    Pause,
    Resume,
    Stop,
    Seek { position_ms: u64 },
}

impl fmt::Display for BackendCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pause => f.write_str("pause"),
            Self::Resume => f.write_str("resume"),
            Self::Stop => f.write_str("stop"),
            Self::Seek { position_ms } => write!(f, "seek to {position_ms}ms"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendEvent {
    /// Periodic or change-driven status. The first loaded status after an
    /// open is the "ready" signal.
    Status {
        handle: HandleId,
        status: BackendStatus,
    },
    /// The resource could not be opened; nothing is left to release.
    OpenFailed {
        handle: HandleId,
        error: ResourceOpenError,
    },
    Completed {
        handle: HandleId,
        command: BackendCommand,
    },
    Rejected {
        handle: HandleId,
        command: BackendCommand,
        error: CommandError,
    },
}

impl BackendEvent {
    pub fn handle(&self) -> HandleId {
        match self {
            Self::Status { handle, .. }
            | Self::OpenFailed { handle, .. }
            | Self::Completed { handle, .. }
            | Self::Rejected { handle, .. } => *handle,
        }
    }
}

/// An audio engine able to hold resources identified by caller-chosen handles.
///
/// Every method only submits work; an `Err` means the request could not even
/// be submitted. Outcomes arrive later as [`BackendEvent`]s. Requests must be
/// processed in submission order.
pub trait AudioBackend {
    fn open(
        &mut self,
        handle: HandleId,
        source: &TrackSource,
        auto_start: bool,
    ) -> Result<(), ResourceOpenError>;

    fn pause(&mut self, handle: HandleId) -> Result<(), CommandError>;

    fn resume(&mut self, handle: HandleId) -> Result<(), CommandError>;

    fn stop(&mut self, handle: HandleId) -> Result<(), CommandError>;

    fn seek(&mut self, handle: HandleId, position_ms: u64) -> Result<(), CommandError>;

    /// Drop the resource. Releasing an unknown or already released handle is
    /// not an error for the engine.
    fn release(&mut self, handle: HandleId) -> Result<(), CommandError>;
}
