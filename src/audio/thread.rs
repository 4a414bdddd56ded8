use std::collections::HashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info, warn};
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::config::AudioSettings;
use crate::library::TrackSource;
use crate::playback::{
    BackendCommand, BackendEvent, BackendStatus, CommandError, HandleId, ResourceOpenError,
};

use super::sink::{Opened, create_sink_at};
use super::stream::StreamConnector;
use super::types::Request;

/// One open sink and what is needed to rebuild it.
struct Resource {
    source: TrackSource,
    sink: Sink,
    /// Position the current sink was started at; `get_pos` counts from here.
    offset: Duration,
    duration: Option<Duration>,
    last_reported: Option<BackendStatus>,
}

impl Resource {
    fn new(source: TrackSource, opened: Opened, offset: Duration) -> Self {
        Self {
            source,
            sink: opened.sink,
            offset,
            duration: opened.duration,
            last_reported: None,
        }
    }

    fn finished(&self) -> bool {
        self.sink.empty()
    }

    fn status(&self) -> BackendStatus {
        let mut position = self.offset + self.sink.get_pos();
        if let Some(duration) = self.duration {
            if self.finished() || position > duration {
                position = duration;
            }
        }
        BackendStatus {
            is_loaded: true,
            position_ms: as_ms(position),
            duration_ms: self.duration.map(as_ms),
            is_playing: !self.finished() && !self.sink.is_paused(),
        }
    }

    /// Swap in a fresh sink for the same source, starting at `start_at`.
    fn rebuild(
        &mut self,
        stream: &OutputStream,
        connector: &StreamConnector,
        start_at: Duration,
    ) -> Result<(), ResourceOpenError> {
        let opened = create_sink_at(stream, connector, &self.source, start_at)?;
        self.sink.stop();
        self.sink = opened.sink;
        self.duration = opened.duration.or(self.duration);
        self.offset = start_at;
        Ok(())
    }
}

fn as_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Emits events back to the controller. A dropped receiver only means nobody
/// is listening anymore, so send failures are ignored.
struct Reporter {
    events: Sender<BackendEvent>,
}

impl Reporter {
    fn status(&self, handle: HandleId, resource: &mut Resource) {
        let status = resource.status();
        if resource.last_reported == Some(status) {
            return;
        }
        resource.last_reported = Some(status);
        let _ = self.events.send(BackendEvent::Status { handle, status });
    }

    fn completed(&self, handle: HandleId, command: BackendCommand) {
        let _ = self.events.send(BackendEvent::Completed { handle, command });
    }

    fn rejected(&self, handle: HandleId, command: BackendCommand, error: CommandError) {
        warn!("{command} on {handle} rejected: {error}");
        let _ = self.events.send(BackendEvent::Rejected {
            handle,
            command,
            error,
        });
    }

    fn open_failed(&self, handle: HandleId, error: ResourceOpenError) {
        warn!("open {handle} failed: {error}");
        let _ = self.events.send(BackendEvent::OpenFailed { handle, error });
    }
}

/// Start the audio thread.
///
/// `ready` receives exactly one message: whether the output device opened.
pub(super) fn spawn_audio_thread(
    rx: Receiver<Request>,
    events: Sender<BackendEvent>,
    ready: Sender<Result<(), ResourceOpenError>>,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(ResourceOpenError::NoOutputDevice(e.to_string())));
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped, which would
        // scribble over the TUI.
        stream.log_on_drop(false);
        let _ = ready.send(Ok(()));

        let connector = StreamConnector::new(&audio_settings);
        let reporter = Reporter { events };
        let tick = Duration::from_millis(audio_settings.status_interval_ms.max(1));
        let mut resources: HashMap<HandleId, Resource> = HashMap::new();

        loop {
            match rx.recv_timeout(tick) {
                Ok(Request::Open {
                    handle,
                    source,
                    auto_start,
                }) => match create_sink_at(&stream, &connector, &source, Duration::ZERO) {
                    Ok(opened) => {
                        info!("opened {handle}: {source}");
                        let mut resource = Resource::new(source, opened, Duration::ZERO);
                        if auto_start {
                            resource.sink.play();
                        }
                        reporter.status(handle, &mut resource);
                        resources.insert(handle, resource);
                    }
                    Err(error) => reporter.open_failed(handle, error),
                },

                Ok(Request::Pause(handle)) => {
                    let command = BackendCommand::Pause;
                    let Some(resource) = resources.get_mut(&handle) else {
                        reporter.rejected(handle, command, CommandError::UnknownHandle(handle));
                        continue;
                    };
                    resource.sink.pause();
                    reporter.completed(handle, command);
                    reporter.status(handle, resource);
                }

                Ok(Request::Resume(handle)) => {
                    let command = BackendCommand::Resume;
                    let Some(resource) = resources.get_mut(&handle) else {
                        reporter.rejected(handle, command, CommandError::UnknownHandle(handle));
                        continue;
                    };
                    // Resuming a finished track starts it over.
                    if resource.finished() {
                        if let Err(e) = resource.rebuild(&stream, &connector, Duration::ZERO) {
                            reporter.rejected(handle, command, CommandError::Failed(e.to_string()));
                            continue;
                        }
                    }
                    resource.sink.play();
                    reporter.completed(handle, command);
                    reporter.status(handle, resource);
                }

                Ok(Request::Stop(handle)) => {
                    let command = BackendCommand::Stop;
                    match resources.get_mut(&handle) {
                        Some(resource) => {
                            resource.sink.stop();
                            reporter.completed(handle, command);
                        }
                        None => {
                            reporter.rejected(handle, command, CommandError::UnknownHandle(handle))
                        }
                    }
                }

                Ok(Request::Seek {
                    handle,
                    position_ms,
                }) => {
                    let command = BackendCommand::Seek { position_ms };
                    let Some(resource) = resources.get_mut(&handle) else {
                        reporter.rejected(handle, command, CommandError::UnknownHandle(handle));
                        continue;
                    };
                    if resource.source.is_remote() {
                        reporter.rejected(
                            handle,
                            command,
                            CommandError::Unsupported("live streams cannot seek".into()),
                        );
                        continue;
                    }

                    let was_playing = !resource.finished() && !resource.sink.is_paused();
                    let target = Duration::from_millis(position_ms);
                    match resource.rebuild(&stream, &connector, target) {
                        Ok(()) => {
                            if was_playing {
                                resource.sink.play();
                            }
                            reporter.completed(handle, command);
                            reporter.status(handle, resource);
                        }
                        Err(e) => {
                            reporter.rejected(handle, command, CommandError::Failed(e.to_string()))
                        }
                    }
                }

                Ok(Request::Release(handle)) => {
                    if let Some(resource) = resources.remove(&handle) {
                        resource.sink.stop();
                        debug!("released {handle}");
                    }
                }

                Ok(Request::Quit) => {
                    for resource in resources.values() {
                        resource.sink.stop();
                    }
                    break;
                }

                Err(RecvTimeoutError::Timeout) => {
                    for (handle, resource) in resources.iter_mut() {
                        reporter.status(*handle, resource);
                    }
                }

                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}
