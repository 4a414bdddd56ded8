use std::time::Duration;

use log::{info, warn};
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::config::RadioSettings;

use super::station::{Station, builtin_stations};

#[derive(Debug, Error)]
pub enum DirectoryLookupError {
    #[error("request to {mirror} failed: {reason}")]
    Request { mirror: String, reason: String },
    #[error("{mirror} returned unreadable station data: {reason}")]
    Decode { mirror: String, reason: String },
    #[error("{mirror} has no playable stations")]
    Empty { mirror: String },
    #[error("no radio directory mirrors configured")]
    NoMirrors,
}

/// Fetches the raw station list for a country from one mirror.
pub trait StationFetcher {
    fn fetch(&self, mirror: &str, country_code: &str) -> Result<Vec<Station>, DirectoryLookupError>;
}

pub struct HttpStationFetcher {
    agent: ureq::Agent,
}

impl HttpStationFetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl StationFetcher for HttpStationFetcher {
    fn fetch(
        &self,
        mirror: &str,
        country_code: &str,
    ) -> Result<Vec<Station>, DirectoryLookupError> {
        let url = format!(
            "{}/json/stations/bycountrycodeexact/{}",
            mirror.trim_end_matches('/'),
            country_code
        );
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| DirectoryLookupError::Request {
                mirror: mirror.to_string(),
                reason: e.to_string(),
            })?;
        response
            .into_json::<Vec<Station>>()
            .map_err(|e| DirectoryLookupError::Decode {
                mirror: mirror.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Where a station list came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupOrigin {
    Mirror(String),
    Builtin,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lookup {
    pub stations: Vec<Station>,
    pub origin: LookupOrigin,
}

/// Station lookup over a set of equivalent mirrors.
pub struct RadioDirectory<F: StationFetcher> {
    fetcher: F,
    mirrors: Vec<String>,
    station_limit: usize,
    shuffle: bool,
}

impl<F: StationFetcher> RadioDirectory<F> {
    pub fn new(fetcher: F, settings: &RadioSettings) -> Self {
        Self {
            fetcher,
            mirrors: settings.mirrors.clone(),
            station_limit: settings.station_limit,
            shuffle: settings.shuffle_mirrors,
        }
    }

    #[cfg(test)]
    pub(crate) fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Stations for `country_code`, falling back to the built-in list when no
    /// mirror has any.
    pub fn lookup(&self, country_code: &str) -> Lookup {
        match self.try_lookup(country_code) {
            Ok((mirror, stations)) => {
                info!("{} stations from {mirror}", stations.len());
                Lookup {
                    stations,
                    origin: LookupOrigin::Mirror(mirror),
                }
            }
            Err(e) => {
                warn!("radio lookup failed ({e}); using built-in stations");
                Lookup {
                    stations: builtin_stations(),
                    origin: LookupOrigin::Builtin,
                }
            }
        }
    }

    /// First mirror with a non-empty playable list. The error is the last
    /// mirror's failure.
    pub fn try_lookup(
        &self,
        country_code: &str,
    ) -> Result<(String, Vec<Station>), DirectoryLookupError> {
        let country_code = country_code.trim().to_ascii_uppercase();
        let mut mirrors = self.mirrors.clone();
        if self.shuffle {
            mirrors.shuffle(&mut rand::rng());
        }

        let mut last_error = DirectoryLookupError::NoMirrors;
        for mirror in mirrors {
            let stations = match self.fetcher.fetch(&mirror, &country_code) {
                Ok(stations) => stations,
                Err(e) => {
                    warn!("{e}");
                    last_error = e;
                    continue;
                }
            };

            let mut playable: Vec<Station> =
                stations.into_iter().filter(Station::is_playable).collect();
            if playable.is_empty() {
                last_error = DirectoryLookupError::Empty { mirror };
                continue;
            }
            playable.truncate(self.station_limit);
            return Ok((mirror, playable));
        }
        Err(last_error)
    }
}
