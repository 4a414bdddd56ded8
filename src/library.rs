//! Track source: the track model, the persisted playlist and directory import.

mod model;
mod playlist;
mod scan;

pub use model::{Track, TrackSource};
pub use playlist::{MemoryPlaylist, PlaylistError, PlaylistRepository, TomlPlaylistStore};
pub use scan::import_directory;

/// Case-insensitive substring match used by the playlist search box.
/// `query_lower` must already be lowercase.
pub fn name_matches(name: &str, query_lower: &str) -> bool {
    query_lower.is_empty() || name.to_lowercase().contains(query_lower)
}
