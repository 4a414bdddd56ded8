//! Persisted playlist: an ordered list of tracks keyed by `id`.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::Track;

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("playlist I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("playlist file {path} is not valid: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not encode playlist: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Storage for the user's playlist, independent of any playback session.
pub trait PlaylistRepository {
    /// All tracks, in insertion order.
    fn list(&self) -> Result<Vec<Track>, PlaylistError>;
    /// Append `track`. Returns `false` (and changes nothing) when a track with
    /// the same id is already stored.
    fn append(&mut self, track: Track) -> Result<bool, PlaylistError>;
    /// Remove every track.
    fn clear(&mut self) -> Result<(), PlaylistError>;
}

/// In-memory playlist; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryPlaylist {
    tracks: Vec<Track>,
}

impl PlaylistRepository for MemoryPlaylist {
    fn list(&self) -> Result<Vec<Track>, PlaylistError> {
        Ok(self.tracks.clone())
    }

    fn append(&mut self, track: Track) -> Result<bool, PlaylistError> {
        if self.tracks.iter().any(|t| t.id == track.id) {
            return Ok(false);
        }
        self.tracks.push(track);
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), PlaylistError> {
        self.tracks.clear();
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlaylistFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

/// Playlist stored as a TOML file (`[[tracks]]` tables).
///
/// Every mutation rewrites the whole file; playlists are small.
#[derive(Debug, Clone)]
pub struct TomlPlaylistStore {
    path: PathBuf,
}

impl TomlPlaylistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<PlaylistFile, PlaylistError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PlaylistFile::default()),
            Err(source) => {
                return Err(PlaylistError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        toml::from_str(&text).map_err(|source| PlaylistError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, file: &PlaylistFile) -> Result<(), PlaylistError> {
        let text = toml::to_string(file)?;
        let io_err = |source| PlaylistError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        fs::write(&self.path, text).map_err(io_err)
    }
}

impl PlaylistRepository for TomlPlaylistStore {
    fn list(&self) -> Result<Vec<Track>, PlaylistError> {
        Ok(self.read()?.tracks)
    }

    fn append(&mut self, track: Track) -> Result<bool, PlaylistError> {
        let mut file = self.read()?;
        if file.tracks.iter().any(|t| t.id == track.id) {
            return Ok(false);
        }
        file.tracks.push(track);
        self.write(&file)?;
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), PlaylistError> {
        self.write(&PlaylistFile::default())
    }
}
