//! Creating `rodio` sinks from track sources.
//!
//! Every sink starts paused; the thread decides when to play it.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use rodio::{Decoder, OutputStream, Sink, Source};

use crate::library::TrackSource;
use crate::playback::ResourceOpenError;

use super::stream::StreamConnector;

/// A freshly built sink plus the source length, when it has one.
pub(super) struct Opened {
    pub sink: Sink,
    pub duration: Option<Duration>,
}

/// Create a paused sink for `source` that starts at `start_at`.
///
/// Streams ignore `start_at`; they always join the broadcast live.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    connector: &StreamConnector,
    source: &TrackSource,
    start_at: Duration,
) -> Result<Opened, ResourceOpenError> {
    let sink = Sink::connect_new(stream.mixer());
    let duration = match source {
        TrackSource::File(path) => {
            let file = File::open(path).map_err(|e| ResourceOpenError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let decoder =
                Decoder::new(BufReader::new(file)).map_err(|e| ResourceOpenError::Undecodable {
                    location: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            let duration = tagged_duration(path).or_else(|| decoder.total_duration());
            // `skip_duration` is the seeking primitive; ZERO is fine.
            sink.append(decoder.skip_duration(start_at));
            duration
        }
        TrackSource::Stream(url) => {
            let live = connector.connect(url)?;
            let decoder = Decoder::builder()
                .with_data(live)
                .with_seekable(false)
                .build()
                .map_err(|e| ResourceOpenError::Undecodable {
                    location: url.clone(),
                    reason: e.to_string(),
                })?;
            sink.append(decoder);
            None
        }
    };
    sink.pause();

    Ok(Opened {
        sink,
        duration: duration.filter(|d| !d.is_zero()),
    })
}

fn tagged_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
}
