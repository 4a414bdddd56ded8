//! Playback core: the session state machine, the transport controller that
//! drives an [`AudioBackend`], and progress projection for display.

mod backend;
mod controller;
mod error;
mod projection;
mod session;

pub use backend::{AudioBackend, BackendCommand, BackendEvent, BackendStatus, HandleId};
pub use controller::{PlaybackView, TransportController, ViewHandle};
pub use error::{CommandError, PlaybackError, ResourceOpenError};
pub use projection::{ProgressProjection, format_clock, project};
pub use session::{PlaybackSession, PlaybackSnapshot, PlaybackState, UNKNOWN_DURATION_MS};

#[cfg(test)]
mod tests;
