use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a track's audio comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSource {
    /// Local file or bundled asset.
    File(PathBuf),
    /// Remote stream URL (internet radio).
    Stream(String),
}

impl TrackSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stream(url) => f.write_str(url),
        }
    }
}

/// One playable audio source. Identity is `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub source: TrackSource,
    /// Import date, or a label such as "Live Radio".
    pub added_at: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: TrackSource,
        added_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source,
            added_at: added_at.into(),
        }
    }
}
