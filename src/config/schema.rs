use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/flashplayer/config.toml` or
/// `~/.config/flashplayer/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `FLASHPLAYER__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub controls: ControlsSettings,
    pub ui: UiSettings,
    pub library: LibrarySettings,
    pub radio: RadioSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Start playback as soon as a loaded resource becomes ready.
    pub auto_start: bool,
    /// How often the audio thread reports position/duration (milliseconds).
    pub status_interval_ms: u64,
    /// Connect/read timeout used when opening a remote stream (milliseconds).
    pub stream_connect_timeout_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            auto_start: true,
            status_interval_ms: 250,
            stream_connect_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Milliseconds to seek when pressing `H` / `L`.
    pub seek_step_ms: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            seek_step_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ FlashPlayer ~ ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during import.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
    /// Where the playlist is persisted. Defaults to the XDG data directory.
    pub playlist_path: Option<PathBuf>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            playlist_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadioSettings {
    /// Equivalent radio-browser API mirrors.
    pub mirrors: Vec<String>,
    /// ISO 3166-1 alpha-2 country code used for the station lookup.
    pub country_code: String,
    /// Maximum number of stations kept from a successful lookup.
    pub station_limit: usize,
    /// Per-mirror request timeout (milliseconds).
    pub request_timeout_ms: u64,
    /// Try mirrors in a random order on every lookup.
    pub shuffle_mirrors: bool,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            mirrors: vec![
                "https://all.api.radio-browser.info".into(),
                "https://de1.api.radio-browser.info".into(),
                "https://de2.api.radio-browser.info".into(),
                "https://fi1.api.radio-browser.info".into(),
                "https://nl1.api.radio-browser.info".into(),
            ],
            country_code: "GB".to_string(),
            station_limit: 50,
            request_timeout_ms: 5_000,
            shuffle_mirrors: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
    /// Log file. The terminal is owned by the UI, so logs never go to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
