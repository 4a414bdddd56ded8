use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use crate::config::AudioSettings;
use crate::library::TrackSource;
use crate::playback::{AudioBackend, BackendEvent, CommandError, HandleId, ResourceOpenError};

use super::thread::spawn_audio_thread;
use super::types::Request;

/// [`AudioBackend`] backed by a dedicated `rodio` thread.
pub struct RodioBackend {
    tx: Sender<Request>,
    join: Option<JoinHandle<()>>,
}

impl RodioBackend {
    /// Start the audio thread. Fails when no output device can be opened.
    pub fn spawn(
        events: Sender<BackendEvent>,
        audio_settings: AudioSettings,
    ) -> Result<Self, ResourceOpenError> {
        let (tx, rx) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let join = spawn_audio_thread(rx, events, ready_tx, audio_settings);

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                tx,
                join: Some(join),
            }),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(ResourceOpenError::BackendGone)
            }
        }
    }

    fn send(&self, request: Request) -> Result<(), CommandError> {
        self.tx.send(request).map_err(|_| CommandError::BackendGone)
    }
}

impl AudioBackend for RodioBackend {
    fn open(
        &mut self,
        handle: HandleId,
        source: &TrackSource,
        auto_start: bool,
    ) -> Result<(), ResourceOpenError> {
        self.tx
            .send(Request::Open {
                handle,
                source: source.clone(),
                auto_start,
            })
            .map_err(|_| ResourceOpenError::BackendGone)
    }

    fn pause(&mut self, handle: HandleId) -> Result<(), CommandError> {
        self.send(Request::Pause(handle))
    }

    fn resume(&mut self, handle: HandleId) -> Result<(), CommandError> {
        self.send(Request::Resume(handle))
    }

    fn stop(&mut self, handle: HandleId) -> Result<(), CommandError> {
        self.send(Request::Stop(handle))
    }

    fn seek(&mut self, handle: HandleId, position_ms: u64) -> Result<(), CommandError> {
        self.send(Request::Seek {
            handle,
            position_ms,
        })
    }

    fn release(&mut self, handle: HandleId) -> Result<(), CommandError> {
        self.send(Request::Release(handle))
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        let _ = self.tx.send(Request::Quit);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}
