//! Network side of the backend: connecting to radio streams.

use std::io::{self, Read, Seek, SeekFrom};
use std::time::Duration;

use crate::config::AudioSettings;
use crate::playback::ResourceOpenError;

/// A forward-only HTTP body that satisfies the decoder's `Read + Seek` bound.
///
/// Only "where am I" queries are answered; any real movement fails with
/// `Unsupported`.
pub(super) struct LiveStream {
    inner: Box<dyn Read + Send + Sync>,
    position: u64,
}

impl LiveStream {
    pub(super) fn new(inner: Box<dyn Read + Send + Sync>) -> Self {
        Self { inner, position: 0 }
    }
}

impl Read for LiveStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl Seek for LiveStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Current(0) => Ok(self.position),
            SeekFrom::Start(p) if p == self.position => Ok(p),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "live streams cannot seek",
            )),
        }
    }
}

pub(super) struct StreamConnector {
    agent: ureq::Agent,
}

impl StreamConnector {
    pub(super) fn new(settings: &AudioSettings) -> Self {
        let timeout = Duration::from_millis(settings.stream_connect_timeout_ms);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        Self { agent }
    }

    pub(super) fn connect(&self, url: &str) -> Result<LiveStream, ResourceOpenError> {
        let response =
            self.agent
                .get(url)
                .call()
                .map_err(|e| ResourceOpenError::Unreachable {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        Ok(LiveStream::new(response.into_reader()))
    }
}
