use thiserror::Error;

use super::backend::{BackendCommand, HandleId};

/// The backend could not open a source.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResourceOpenError {
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("cannot decode {location}: {reason}")]
    Undecodable { location: String, reason: String },
    #[error("stream {url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },
    #[error("no audio output device: {0}")]
    NoOutputDevice(String),
    #[error("audio backend is not running")]
    BackendGone,
}

/// A transport command failed on an already open resource.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("not supported: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Failed(String),
    #[error("no open resource {0}")]
    UnknownHandle(HandleId),
    #[error("audio backend is not running")]
    BackendGone,
}

/// Anything the transport controller reports back to its caller.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("could not open track: {0}")]
    Open(#[from] ResourceOpenError),
    #[error("{command} failed: {error}")]
    Command {
        command: BackendCommand,
        #[source]
        error: CommandError,
    },
}
