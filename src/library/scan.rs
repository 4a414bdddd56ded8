use std::path::{Path, PathBuf};

use lofty::prelude::*;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{Track, TrackSource};
use super::playlist::{PlaylistError, PlaylistRepository};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// "Artist - Title" when the artist tag is usable, otherwise just the title.
pub(super) fn display_name(title: &str, artist: Option<&str>) -> String {
    match artist.map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => format!("{} - {}", a, title.trim()),
        None => title.trim().to_string(),
    }
}

/// Name for an audio file: tags when readable, else the file stem.
fn name_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let Ok(tagged) = lofty::read_from_path(path) else {
        return stem;
    };
    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return stem;
    };

    let title = tag
        .title()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or(stem);
    let artist = tag.artist().map(|a| a.to_string());
    display_name(&title, artist.as_deref())
}

/// Collect the audio files under `dir`, sorted by path.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_audio_file(path, settings))
        .collect();

    files.sort();
    files
}

/// Build a new `Track` for a local file, with a fresh id and today's date.
pub fn track_from_file(path: &Path) -> Track {
    Track::new(
        uuid::Uuid::new_v4().to_string(),
        name_for(path),
        TrackSource::File(path.to_path_buf()),
        chrono::Local::now().format("%Y-%m-%d").to_string(),
    )
}

/// Import every audio file under `dir` that the playlist does not already
/// reference. Returns how many tracks were appended.
pub fn import_directory<R: PlaylistRepository + ?Sized>(
    repo: &mut R,
    dir: &Path,
    settings: &LibrarySettings,
) -> Result<usize, PlaylistError> {
    let known: Vec<TrackSource> = repo.list()?.into_iter().map(|t| t.source).collect();

    let mut added = 0;
    for path in scan(dir, settings) {
        let source = TrackSource::File(path.clone());
        if known.contains(&source) {
            log::debug!("import: {} already in playlist", path.display());
            continue;
        }
        if repo.append(track_from_file(&path))? {
            added += 1;
        }
    }

    log::info!("import: added {added} track(s) from {}", dir.display());
    Ok(added)
}
