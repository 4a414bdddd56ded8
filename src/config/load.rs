use std::{env, path::PathBuf};

use log::LevelFilter;

use super::schema::Settings;

const APP_DIR: &str = "flashplayer";

/// Configuration loading helpers.
///
/// `Settings::load` layers environment variables (prefix `FLASHPLAYER__`) over an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("FLASHPLAYER")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.status_interval_ms == 0 {
            return Err("audio.status_interval_ms must be >= 1".to_string());
        }
        if self.controls.seek_step_ms == 0 {
            return Err("controls.seek_step_ms must be >= 1".to_string());
        }
        if self.radio.station_limit == 0 {
            return Err("radio.station_limit must be >= 1".to_string());
        }
        if self.radio.mirrors.iter().all(|m| m.trim().is_empty()) {
            return Err("radio.mirrors must list at least one endpoint".to_string());
        }
        if self.log_level().is_none() {
            return Err(format!("logging.level {:?} is not a log level", self.logging.level));
        }
        Ok(())
    }

    /// Parse `logging.level` into a filter.
    pub fn log_level(&self) -> Option<LevelFilter> {
        self.logging.level.trim().parse().ok()
    }

    /// Playlist file: `library.playlist_path` or the XDG data directory.
    pub fn playlist_path(&self) -> Option<PathBuf> {
        self.library
            .playlist_path
            .clone()
            .or_else(|| {
                xdg_dir("XDG_DATA_HOME", &[".local", "share"]).map(|d| d.join("playlist.toml"))
            })
    }

    /// Log file: `logging.file` or the XDG state directory.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.logging
            .file
            .clone()
            .or_else(|| {
                xdg_dir("XDG_STATE_HOME", &[".local", "state"]).map(|d| d.join("flashplayer.log"))
            })
    }
}

/// Resolve the config path from `FLASHPLAYER_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("FLASHPLAYER_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/flashplayer/config.toml`
/// or `~/.config/flashplayer/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).map(|d| d.join("config.toml"))
}

/// `$<var>/flashplayer`, or `$HOME/<fallback...>/flashplayer`.
fn xdg_dir(var: &str, home_fallback: &[&str]) -> Option<PathBuf> {
    let base = if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| {
            home_fallback
                .iter()
                .fold(PathBuf::from(home), |p, part| p.join(part))
        })
    };

    base.map(|d| d.join(APP_DIR))
}
