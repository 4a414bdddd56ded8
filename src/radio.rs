//! Internet radio: station model and the radio-browser directory lookup.

mod directory;
mod station;

pub use directory::{
    DirectoryLookupError, HttpStationFetcher, Lookup, LookupOrigin, RadioDirectory, StationFetcher,
};
pub use station::{LIVE_RADIO, Station, builtin_stations};
