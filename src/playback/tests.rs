use super::session::Applied;
use super::*;
use crate::library::{Track, TrackSource};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    Open(HandleId, TrackSource, bool),
    Pause(HandleId),
    Resume(HandleId),
    Stop(HandleId),
    Seek(HandleId, u64),
    Release(HandleId),
}

/// Records every request. With `auto_ack` set, transport commands are
/// acknowledged on the event channel right away.
struct ScriptedBackend {
    events: Sender<BackendEvent>,
    calls: Vec<Call>,
    auto_ack: bool,
    refuse_open: bool,
    refuse_commands: bool,
    fail_release: bool,
}

impl ScriptedBackend {
    fn new(events: Sender<BackendEvent>) -> Self {
        Self {
            events,
            calls: Vec::new(),
            auto_ack: true,
            refuse_open: false,
            refuse_commands: false,
            fail_release: false,
        }
    }

    fn command(
        &mut self,
        handle: HandleId,
        command: BackendCommand,
        call: Call,
    ) -> Result<(), CommandError> {
        self.calls.push(call);
        if self.refuse_commands {
            return Err(CommandError::BackendGone);
        }
        if self.auto_ack {
            let _ = self.events.send(BackendEvent::Completed { handle, command });
        }
        Ok(())
    }

    fn releases(&self) -> Vec<HandleId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Release(h) => Some(*h),
                _ => None,
            })
            .collect()
    }
}

impl AudioBackend for ScriptedBackend {
    fn open(
        &mut self,
        handle: HandleId,
        source: &TrackSource,
        auto_start: bool,
    ) -> Result<(), ResourceOpenError> {
        self.calls.push(Call::Open(handle, source.clone(), auto_start));
        if self.refuse_open {
            return Err(ResourceOpenError::BackendGone);
        }
        Ok(())
    }

    fn pause(&mut self, handle: HandleId) -> Result<(), CommandError> {
        self.command(handle, BackendCommand::Pause, Call::Pause(handle))
    }

    fn resume(&mut self, handle: HandleId) -> Result<(), CommandError> {
        self.command(handle, BackendCommand::Resume, Call::Resume(handle))
    }

    fn stop(&mut self, handle: HandleId) -> Result<(), CommandError> {
        self.command(handle, BackendCommand::Stop, Call::Stop(handle))
    }

    fn seek(&mut self, handle: HandleId, position_ms: u64) -> Result<(), CommandError> {
        self.command(handle, BackendCommand::Seek { position_ms }, Call::Seek(handle, position_ms))
    }

    fn release(&mut self, handle: HandleId) -> Result<(), CommandError> {
        self.calls.push(Call::Release(handle));
        if self.fail_release {
            return Err(CommandError::Failed("device vanished".into()));
        }
        Ok(())
    }
}

struct Harness {
    controller: TransportController<ScriptedBackend>,
    tx: Sender<BackendEvent>,
}

impl Harness {
    fn new() -> Self {
        Self::with_backend(|_| {})
    }

    fn with_backend(configure: impl FnOnce(&mut ScriptedBackend)) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut backend = ScriptedBackend::new(tx.clone());
        configure(&mut backend);
        Self {
            controller: TransportController::new(backend, rx, true),
            tx,
        }
    }

    fn handle(&self) -> HandleId {
        self.controller
            .session()
            .active_handle()
            .expect("a resource should be open")
    }

    fn status(
        &self,
        handle: HandleId,
        position_ms: u64,
        duration_ms: Option<u64>,
        is_playing: bool,
    ) {
        self.tx
            .send(BackendEvent::Status {
                handle,
                status: BackendStatus {
                    is_loaded: true,
                    position_ms,
                    duration_ms,
                    is_playing,
                },
            })
            .unwrap();
    }

    /// Load `track` and deliver the ready status for it.
    fn play(&mut self, track: Track, duration_ms: u64) -> HandleId {
        self.controller.load(track).unwrap();
        let handle = self.handle();
        self.status(handle, 0, Some(duration_ms), true);
        self.controller.pump();
        handle
    }

    fn state(&self) -> PlaybackState {
        self.controller.session().state()
    }

    fn calls(&self) -> &[Call] {
        &self.controller.backend().calls
    }

    fn complete(&self, handle: HandleId, command: BackendCommand) {
        self.tx
            .send(BackendEvent::Completed { handle, command })
            .unwrap();
    }
}

fn song(id: &str) -> Track {
    Track::new(
        id,
        format!("Song {id}"),
        TrackSource::File(PathBuf::from(format!("/music/{id}.mp3"))),
        "2024-05-01",
    )
}

fn radio() -> Track {
    Track::new(
        "bbc1",
        "BBC Radio 1",
        TrackSource::Stream("http://example.invalid/radio1".into()),
        "Live Radio",
    )
}

#[test]
fn starts_idle_with_safe_duration() {
    let h = Harness::new();
    let snap = h.controller.snapshot();
    assert_eq!(snap.state, PlaybackState::Idle);
    assert_eq!(snap.track, None);
    assert_eq!(snap.position_ms, 0);
    assert_eq!(snap.duration_ms, 1);
}

#[test]
fn load_opens_with_auto_start_and_waits_for_ready() {
    let mut h = Harness::new();
    h.controller.load(song("a")).unwrap();

    let handle = h.handle();
    assert_eq!(h.state(), PlaybackState::Loading);
    assert_eq!(
        h.calls(),
        &[Call::Open(handle, TrackSource::File(PathBuf::from("/music/a.mp3")), true)]
    );

    h.status(handle, 0, Some(200_000), true);
    assert!(h.controller.pump().is_empty());

    let snap = h.controller.snapshot();
    assert_eq!(snap.state, PlaybackState::Playing);
    assert_eq!(snap.duration_ms, 200_000);
    assert_eq!(snap.track.map(|t| t.id), Some("a".to_string()));
}

#[test]
fn ready_without_autoplay_lands_in_paused() {
    let mut h = Harness::new();
    h.controller.load(song("a")).unwrap();
    let handle = h.handle();
    h.status(handle, 0, Some(10_000), false);
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Paused);
}

#[test]
fn unloaded_status_does_not_finish_loading() {
    let mut h = Harness::new();
    h.controller.load(song("a")).unwrap();
    let handle = h.handle();
    h.tx.send(BackendEvent::Status {
        handle,
        status: BackendStatus {
            is_loaded: false,
            position_ms: 0,
            duration_ms: None,
            is_playing: false,
        },
    })
    .unwrap();
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Loading);
}

#[test]
fn loading_same_track_twice_is_a_no_op() {
    let mut h = Harness::new();
    let handle = h.play(song("a"), 90_000);
    h.status(handle, 30_000, Some(90_000), true);

    h.controller.load(song("a")).unwrap();

    assert_eq!(h.handle(), handle);
    assert_eq!(h.calls().len(), 1);
    assert_eq!(h.state(), PlaybackState::Playing);
    assert_eq!(h.controller.snapshot().position_ms, 30_000);
}

#[test]
fn switching_tracks_releases_the_old_resource_first() {
    let mut h = Harness::new();
    let first = h.play(song("a"), 90_000);

    h.controller.load(song("b")).unwrap();
    let second = h.handle();

    assert_ne!(first, second);
    let release_at = h.calls().iter().position(|c| *c == Call::Release(first));
    let open_at = h
        .calls()
        .iter()
        .position(|c| matches!(c, Call::Open(handle, _, _) if *handle == second));
    assert!(release_at.unwrap() < open_at.unwrap());
    assert_eq!(h.state(), PlaybackState::Loading);
    assert_eq!(h.controller.snapshot().position_ms, 0);
}

#[test]
fn rapid_switching_ignores_late_events_from_old_resources() {
    let mut h = Harness::new();
    h.controller.load(song("a")).unwrap();
    let a = h.handle();
    h.controller.load(song("b")).unwrap();
    let b = h.handle();

    // A's ready and failure arrive after B took over.
    h.status(a, 5_000, Some(60_000), true);
    h.tx.send(BackendEvent::OpenFailed {
        handle: a,
        error: ResourceOpenError::BackendGone,
    })
    .unwrap();
    assert!(h.controller.pump().is_empty());

    let snap = h.controller.snapshot();
    assert_eq!(snap.state, PlaybackState::Loading);
    assert_eq!(snap.track.as_ref().map(|t| t.id.as_str()), Some("b"));

    h.status(b, 0, Some(120_000), true);
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Playing);
    assert_eq!(h.controller.snapshot().duration_ms, 120_000);
}

#[test]
fn toggle_pauses_and_resumes_only_on_acknowledgement() {
    let mut h = Harness::with_backend(|b| b.auto_ack = false);
    let handle = h.play(song("a"), 90_000);

    h.controller.toggle_play_pause().unwrap();
    assert_eq!(h.calls().last(), Some(&Call::Pause(handle)));
    assert_eq!(h.state(), PlaybackState::Playing);

    h.tx.send(BackendEvent::Completed {
        handle,
        command: BackendCommand::Pause,
    })
    .unwrap();
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Paused);

    h.controller.toggle_play_pause().unwrap();
    assert_eq!(h.calls().last(), Some(&Call::Resume(handle)));
    h.tx.send(BackendEvent::Completed {
        handle,
        command: BackendCommand::Resume,
    })
    .unwrap();
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Playing);
}

#[test]
fn double_toggle_returns_to_playing() {
    let mut h = Harness::new();
    h.play(song("a"), 90_000);

    h.controller.toggle_play_pause().unwrap();
    h.controller.toggle_play_pause().unwrap();
    h.controller.pump();

    assert_eq!(h.state(), PlaybackState::Playing);
}

#[test]
fn toggle_without_a_track_does_nothing() {
    let mut h = Harness::new();
    h.controller.toggle_play_pause().unwrap();
    assert!(h.calls().is_empty());
    assert_eq!(h.state(), PlaybackState::Idle);
}

#[test]
fn toggle_on_a_cued_track_loads_it() {
    let mut h = Harness::new();
    h.controller.cue(song("a"));
    assert_eq!(h.state(), PlaybackState::Idle);
    assert!(h.calls().is_empty());

    h.controller.toggle_play_pause().unwrap();
    assert_eq!(h.state(), PlaybackState::Loading);
    assert!(matches!(h.calls(), [Call::Open(_, _, true)]));
}

#[test]
fn cue_if_idle_follows_the_cursor_until_something_plays() {
    let mut h = Harness::new();
    h.controller.cue_if_idle(song("a"));
    h.controller.cue_if_idle(song("b"));
    assert_eq!(
        h.controller.snapshot().track.map(|t| t.id),
        Some("b".to_string())
    );
    assert!(h.calls().is_empty());

    h.controller.toggle_play_pause().unwrap();
    let handle = h.handle();
    h.status(handle, 0, Some(60_000), true);
    h.controller.pump();

    h.controller.cue_if_idle(song("c"));
    assert_eq!(h.state(), PlaybackState::Playing);
    assert_eq!(
        h.controller.snapshot().track.map(|t| t.id),
        Some("b".to_string())
    );
    assert_eq!(h.controller.backend().releases(), Vec::<HandleId>::new());
}

#[test]
fn toggle_while_loading_does_nothing() {
    let mut h = Harness::new();
    h.controller.load(song("a")).unwrap();
    h.controller.toggle_play_pause().unwrap();
    assert_eq!(h.calls().len(), 1);
    assert_eq!(h.state(), PlaybackState::Loading);
}

#[test]
fn stop_resets_position_and_releases_the_resource() {
    let mut h = Harness::new();
    let handle = h.play(song("a"), 90_000);
    h.status(handle, 40_000, Some(90_000), true);
    h.controller.pump();

    h.controller.stop().unwrap();
    h.controller.pump();

    let snap = h.controller.snapshot();
    assert_eq!(snap.state, PlaybackState::Stopped);
    assert_eq!(snap.position_ms, 0);
    assert_eq!(h.controller.session().active_handle(), None);
    assert_eq!(h.controller.backend().releases(), vec![handle]);
}

#[test]
fn toggle_after_stop_reloads_the_same_track() {
    let mut h = Harness::new();
    let first = h.play(song("a"), 90_000);
    h.controller.stop().unwrap();

    h.controller.toggle_play_pause().unwrap();

    let second = h.handle();
    assert_ne!(first, second);
    assert_eq!(h.state(), PlaybackState::Loading);
    assert_eq!(
        h.controller.snapshot().track.map(|t| t.id),
        Some("a".to_string())
    );
}

#[test]
fn toggle_before_stop_is_acknowledged_restarts_the_track() {
    let mut h = Harness::with_backend(|b| b.auto_ack = false);
    let first = h.play(song("a"), 90_000);

    h.controller.stop().unwrap();
    assert_eq!(h.state(), PlaybackState::Playing);
    h.controller.toggle_play_pause().unwrap();

    let second = h.handle();
    assert_ne!(first, second);
    assert_eq!(h.state(), PlaybackState::Loading);
    assert_eq!(
        h.calls()[1..],
        [
            Call::Stop(first),
            Call::Release(first),
            Call::Open(second, TrackSource::File(PathBuf::from("/music/a.mp3")), true),
        ]
    );

    // The stop acknowledgement now belongs to a released resource.
    h.complete(first, BackendCommand::Stop);
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Loading);
    assert_eq!(h.controller.backend().releases(), vec![first]);

    h.status(second, 0, Some(90_000), true);
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Playing);
    assert_eq!(h.controller.snapshot().position_ms, 0);
}

#[test]
fn nothing_is_sent_to_a_stopping_resource() {
    let mut h = Harness::with_backend(|b| b.auto_ack = false);
    let handle = h.play(song("a"), 90_000);
    h.controller.stop().unwrap();

    h.controller.stop().unwrap();
    h.controller.seek_relative(5_000).unwrap();
    assert_eq!(h.calls()[1..], [Call::Stop(handle)]);

    h.complete(handle, BackendCommand::Stop);
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Stopped);
    assert_eq!(h.controller.backend().releases(), vec![handle]);
}

#[test]
fn loading_the_stopping_track_opens_it_again() {
    let mut h = Harness::with_backend(|b| b.auto_ack = false);
    let first = h.play(song("a"), 90_000);
    h.controller.stop().unwrap();

    h.controller.load(song("a")).unwrap();
    let second = h.handle();
    assert_ne!(first, second);
    assert_eq!(h.controller.backend().releases(), vec![first]);
    assert_eq!(h.state(), PlaybackState::Loading);
}

#[test]
fn double_toggle_before_any_acknowledgement_ends_playing() {
    let mut h = Harness::with_backend(|b| b.auto_ack = false);
    let handle = h.play(song("a"), 90_000);

    h.controller.toggle_play_pause().unwrap();
    h.controller.toggle_play_pause().unwrap();
    assert_eq!(h.calls()[1..], [Call::Pause(handle), Call::Resume(handle)]);

    h.complete(handle, BackendCommand::Pause);
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Paused);
    h.complete(handle, BackendCommand::Resume);
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Playing);

    h.controller.toggle_play_pause().unwrap();
    assert_eq!(h.calls().last(), Some(&Call::Pause(handle)));
}

#[test]
fn rejected_pause_lets_the_next_toggle_pause_again() {
    let mut h = Harness::with_backend(|b| b.auto_ack = false);
    let handle = h.play(song("a"), 90_000);

    h.controller.toggle_play_pause().unwrap();
    h.tx.send(BackendEvent::Rejected {
        handle,
        command: BackendCommand::Pause,
        error: CommandError::Failed("device busy".into()),
    })
    .unwrap();
    assert_eq!(h.controller.pump().len(), 1);
    assert_eq!(h.state(), PlaybackState::Playing);

    h.controller.toggle_play_pause().unwrap();
    assert_eq!(h.calls()[1..], [Call::Pause(handle), Call::Pause(handle)]);
}

#[test]
fn stop_while_loading_cancels_the_load() {
    let mut h = Harness::new();
    h.controller.load(song("a")).unwrap();
    let handle = h.handle();

    h.controller.stop().unwrap();
    assert_eq!(h.state(), PlaybackState::Stopped);
    assert_eq!(h.controller.backend().releases(), vec![handle]);

    // The late ready for the cancelled load is ignored.
    h.status(handle, 0, Some(90_000), true);
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Stopped);
}

#[test]
fn stop_when_idle_does_nothing() {
    let mut h = Harness::new();
    h.controller.stop().unwrap();
    assert!(h.calls().is_empty());
    assert_eq!(h.state(), PlaybackState::Idle);
}

#[test]
fn status_updates_track_position_and_newest_wins() {
    let mut h = Harness::new();
    let handle = h.play(song("a"), 100_000);

    h.status(handle, 50_000, Some(100_000), true);
    h.status(handle, 20_000, Some(100_000), true);
    h.controller.pump();
    assert_eq!(h.controller.snapshot().position_ms, 20_000);

    h.status(handle, 150_000, Some(100_000), true);
    h.controller.pump();
    assert_eq!(h.controller.snapshot().position_ms, 100_000);
}

#[test]
fn status_mirrors_backend_transport_state() {
    let mut h = Harness::new();
    let handle = h.play(song("a"), 100_000);

    // Track ended on its own.
    h.status(handle, 100_000, Some(100_000), false);
    h.controller.pump();
    assert_eq!(h.state(), PlaybackState::Paused);
    assert_eq!(h.controller.snapshot().progress().ratio, 1.0);
}

#[test]
fn seek_is_clamped_and_applied_on_acknowledgement() {
    let mut h = Harness::with_backend(|b| b.auto_ack = false);
    let handle = h.play(song("a"), 100_000);
    h.status(handle, 95_000, Some(100_000), true);
    h.controller.pump();

    h.controller.seek_relative(10_000).unwrap();
    assert_eq!(h.calls().last(), Some(&Call::Seek(handle, 100_000)));
    assert_eq!(h.controller.snapshot().position_ms, 95_000);

    h.tx.send(BackendEvent::Completed {
        handle,
        command: BackendCommand::Seek { position_ms: 100_000 },
    })
    .unwrap();
    h.controller.pump();
    assert_eq!(h.controller.snapshot().position_ms, 100_000);

    h.controller.seek_relative(-250_000).unwrap();
    assert_eq!(h.calls().last(), Some(&Call::Seek(handle, 0)));
}

#[test]
fn seek_with_extreme_deltas_saturates() {
    let mut h = Harness::new();
    let handle = h.play(song("a"), 100_000);

    h.controller.seek_relative(i64::MAX).unwrap();
    assert_eq!(h.calls().last(), Some(&Call::Seek(handle, 100_000)));
    h.controller.seek_relative(i64::MIN).unwrap();
    assert_eq!(h.calls().last(), Some(&Call::Seek(handle, 0)));
}

#[test]
fn seek_outside_transport_states_does_nothing() {
    let mut h = Harness::new();
    h.controller.seek_relative(10_000).unwrap();
    h.controller.load(song("a")).unwrap();
    h.controller.seek_relative(10_000).unwrap();
    assert_eq!(h.calls().len(), 1);
}

#[test]
fn open_failure_event_moves_to_failed_and_surfaces() {
    let mut h = Harness::new();
    h.controller.load(radio()).unwrap();
    let handle = h.handle();
    let error = ResourceOpenError::Unreachable {
        url: "http://example.invalid/radio1".into(),
        reason: "connection refused".into(),
    };
    h.tx.send(BackendEvent::OpenFailed {
        handle,
        error: error.clone(),
    })
    .unwrap();

    let surfaced = h.controller.pump();
    assert_eq!(surfaced, vec![PlaybackError::Open(error)]);
    assert_eq!(h.state(), PlaybackState::Failed);
    assert_eq!(h.controller.session().active_handle(), None);
    // Nothing to release for a resource that never opened.
    assert!(h.controller.backend().releases().is_empty());

    let view = h.controller.view_handle();
    let view = view.lock().unwrap();
    assert!(view.last_error.as_deref().unwrap().contains("connection refused"));
}

#[test]
fn toggle_in_failed_does_nothing_but_load_retries() {
    let mut h = Harness::new();
    h.controller.load(song("a")).unwrap();
    let handle = h.handle();
    h.tx.send(BackendEvent::OpenFailed {
        handle,
        error: ResourceOpenError::BackendGone,
    })
    .unwrap();
    h.controller.pump();

    h.controller.toggle_play_pause().unwrap();
    assert_eq!(h.calls().len(), 1);

    h.controller.load(song("a")).unwrap();
    assert_eq!(h.state(), PlaybackState::Loading);
    assert_eq!(h.calls().len(), 2);
}

#[test]
fn open_submission_failure_is_returned() {
    let mut h = Harness::with_backend(|b| b.refuse_open = true);
    let result = h.controller.load(song("a"));
    assert_eq!(result, Err(PlaybackError::Open(ResourceOpenError::BackendGone)));
    assert_eq!(h.state(), PlaybackState::Failed);
    assert_eq!(h.controller.session().active_handle(), None);
}

#[test]
fn rejected_command_surfaces_without_changing_state() {
    let mut h = Harness::with_backend(|b| b.auto_ack = false);
    let handle = h.play(radio(), 1);

    h.controller.seek_relative(10_000).unwrap();
    h.tx.send(BackendEvent::Rejected {
        handle,
        command: BackendCommand::Seek { position_ms: 1 },
        error: CommandError::Unsupported("live streams cannot seek".into()),
    })
    .unwrap();

    let surfaced = h.controller.pump();
    assert_eq!(surfaced.len(), 1);
    assert!(matches!(surfaced[0], PlaybackError::Command { .. }));
    assert_eq!(h.state(), PlaybackState::Playing);
    // Surfaced errors are handed out once.
    assert!(h.controller.pump().is_empty());
}

#[test]
fn command_submission_failure_is_returned() {
    let mut h = Harness::with_backend(|b| b.refuse_commands = true);
    h.play(song("a"), 1_000);
    let result = h.controller.toggle_play_pause();
    assert!(matches!(
        result,
        Err(PlaybackError::Command {
            command: BackendCommand::Pause,
            error: CommandError::BackendGone,
        })
    ));
    assert_eq!(h.state(), PlaybackState::Playing);
}

#[test]
fn live_stream_shows_zero_clock() {
    let mut h = Harness::new();
    let handle = h.play(radio(), 1);
    h.status(handle, 125_000, None, true);
    h.controller.pump();

    let snap = h.controller.snapshot();
    assert_eq!(snap.duration_ms, 1);
    assert!(snap.position_ms <= snap.duration_ms);
    let progress = snap.progress();
    assert_eq!(progress.position_label, "0:00");
    assert_eq!(progress.duration_label, "0:00");
}

#[test]
fn teardown_releases_once_and_is_idempotent() {
    let mut h = Harness::new();
    let handle = h.play(song("a"), 90_000);

    h.controller.teardown();
    h.controller.teardown();

    assert_eq!(h.controller.backend().releases(), vec![handle]);
    let snap = h.controller.snapshot();
    assert_eq!(snap, PlaybackSnapshot::default());
}

#[test]
fn teardown_swallows_release_failures() {
    let mut h = Harness::with_backend(|b| b.fail_release = true);
    h.play(song("a"), 90_000);
    h.controller.teardown();
    assert_eq!(h.state(), PlaybackState::Idle);
    assert_eq!(h.controller.session().active_handle(), None);
}

#[test]
fn teardown_during_loading_releases_pending_handle() {
    let mut h = Harness::new();
    h.controller.load(song("a")).unwrap();
    let handle = h.handle();
    h.controller.teardown();
    assert_eq!(h.controller.backend().releases(), vec![handle]);
    assert_eq!(h.state(), PlaybackState::Idle);
}

#[test]
fn view_is_published_after_each_change() {
    let mut h = Harness::new();
    let view = h.controller.view_handle();
    assert_eq!(view.lock().unwrap().revision, 0);

    h.controller.load(song("a")).unwrap();
    let after_load = view.lock().unwrap().clone();
    assert_eq!(after_load.snapshot.state, PlaybackState::Loading);
    assert!(after_load.revision > 0);

    let handle = h.handle();
    h.status(handle, 45_000, Some(90_000), true);
    h.controller.pump();
    let playing = view.lock().unwrap().clone();
    assert_eq!(playing.snapshot.state, PlaybackState::Playing);
    assert_eq!(playing.progress.ratio, 0.5);
    assert_eq!(playing.progress.position_label, "0:45");
    assert!(playing.revision > after_load.revision);

    // Nothing new: no new revision.
    h.controller.pump();
    assert_eq!(view.lock().unwrap().revision, playing.revision);
}

#[test]
fn dropping_the_controller_releases_the_resource() {
    let (tx, rx) = mpsc::channel();
    let (released_tx, released_rx) = mpsc::channel::<HandleId>();

    struct ReleaseSpy {
        inner: ScriptedBackend,
        released: Sender<HandleId>,
    }
    impl AudioBackend for ReleaseSpy {
        fn open(
            &mut self,
            handle: HandleId,
            source: &TrackSource,
            auto_start: bool,
        ) -> Result<(), ResourceOpenError> {
            self.inner.open(handle, source, auto_start)
        }
        fn pause(&mut self, handle: HandleId) -> Result<(), CommandError> {
            self.inner.pause(handle)
        }
        fn resume(&mut self, handle: HandleId) -> Result<(), CommandError> {
            self.inner.resume(handle)
        }
        fn stop(&mut self, handle: HandleId) -> Result<(), CommandError> {
            self.inner.stop(handle)
        }
        fn seek(&mut self, handle: HandleId, position_ms: u64) -> Result<(), CommandError> {
            self.inner.seek(handle, position_ms)
        }
        fn release(&mut self, handle: HandleId) -> Result<(), CommandError> {
            let _ = self.released.send(handle);
            self.inner.release(handle)
        }
    }

    let backend = ReleaseSpy {
        inner: ScriptedBackend::new(tx),
        released: released_tx,
    };
    let mut controller = TransportController::new(backend, rx, false);
    controller.load(song("a")).unwrap();
    let handle = controller.session().active_handle().unwrap();
    drop(controller);

    assert_eq!(released_rx.try_iter().collect::<Vec<_>>(), vec![handle]);
}

#[test]
fn session_reports_stale_and_stop_outcomes() {
    let mut session = PlaybackSession::new();
    let (first, previous) = session.begin_load(song("a"));
    assert_eq!(previous, None);
    let (second, previous) = session.begin_load(song("b"));
    assert_eq!(previous, Some(first));

    let stale = session.apply(BackendEvent::Completed {
        handle: first,
        command: BackendCommand::Stop,
    });
    assert_eq!(stale, Applied::Stale);

    session.apply(BackendEvent::Status {
        handle: second,
        status: BackendStatus {
            is_loaded: true,
            position_ms: 0,
            duration_ms: Some(0),
            is_playing: true,
        },
    });
    // A zero duration report never drops below the safe minimum.
    assert_eq!(session.snapshot().duration_ms, 1);

    let stopped = session.apply(BackendEvent::Completed {
        handle: second,
        command: BackendCommand::Stop,
    });
    assert_eq!(stopped, Applied::Stopped(second));
    assert_eq!(session.state(), PlaybackState::Stopped);
}

#[test]
fn handles_are_never_reused_across_reset() {
    let mut session = PlaybackSession::new();
    let (first, _) = session.begin_load(song("a"));
    session.reset();
    let (second, _) = session.begin_load(song("a"));
    assert!(second > first);
}

#[test]
fn unreachable_stream_then_valid_file_recovers_to_playing() {
    let mut h = Harness::new();
    h.controller.load(radio()).unwrap();
    let dead = h.handle();
    h.tx.send(BackendEvent::OpenFailed {
        handle: dead,
        error: ResourceOpenError::Unreachable {
            url: "http://example.invalid/radio1".into(),
            reason: "no route to host".into(),
        },
    })
    .unwrap();
    assert_eq!(h.controller.pump().len(), 1);
    assert_eq!(h.state(), PlaybackState::Failed);

    h.play(song("a"), 180_000);
    let snap = h.controller.snapshot();
    assert_eq!(snap.state, PlaybackState::Playing);
    assert_eq!(snap.duration_ms, 180_000);
    // A fresh load clears the previous error.
    assert_eq!(h.controller.view_handle().lock().unwrap().last_error, None);
}

#[test]
fn teardown_is_idempotent_from_every_reachable_state() {
    type Setup = fn(&mut Harness);
    let setups: [(&str, Setup); 6] = [
        ("idle", |_| {}),
        ("loading", |h| h.controller.load(song("a")).unwrap()),
        ("playing", |h| {
            h.play(song("a"), 1_000);
        }),
        ("paused", |h| {
            h.play(song("a"), 1_000);
            h.controller.toggle_play_pause().unwrap();
            h.controller.pump();
        }),
        ("stopped", |h| {
            h.play(song("a"), 1_000);
            h.controller.stop().unwrap();
            h.controller.pump();
        }),
        ("failed", |h| {
            h.controller.load(song("a")).unwrap();
            let handle = h.handle();
            h.tx.send(BackendEvent::OpenFailed {
                handle,
                error: ResourceOpenError::BackendGone,
            })
            .unwrap();
            h.controller.pump();
        }),
    ];

    for (name, setup) in setups {
        let mut h = Harness::new();
        setup(&mut h);
        let open = h.controller.session().active_handle();

        h.controller.teardown();
        let once = h.controller.snapshot();
        let releases_once = h.controller.backend().releases();
        h.controller.teardown();

        assert_eq!(once, PlaybackSnapshot::default(), "{name}");
        assert_eq!(h.controller.snapshot(), once, "{name}");
        assert_eq!(h.controller.backend().releases(), releases_once, "{name}");
        if let Some(handle) = open {
            let count = releases_once.iter().filter(|h| **h == handle).count();
            assert_eq!(count, 1, "{name}");
        }
    }
}
