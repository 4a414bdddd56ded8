use serde::Deserialize;

use crate::library::{Track, TrackSource};

/// Shown where a file track shows the date it was added.
pub const LIVE_RADIO: &str = "Live Radio";

/// One entry of the radio-browser station list. Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Station {
    #[serde(rename = "stationuuid")]
    pub uuid: String,
    pub name: String,
    #[serde(rename = "countrycode")]
    pub country_code: String,
    /// Playable URL after playlist/redirect resolution.
    pub url_resolved: String,
    pub favicon: String,
    /// Comma separated genre tags.
    pub tags: String,
}

impl Station {
    pub fn is_playable(&self) -> bool {
        !self.url_resolved.trim().is_empty()
    }

    /// Case-insensitive substring match on name or tags.
    /// `query_lower` must already be lowercase.
    pub fn matches(&self, query_lower: &str) -> bool {
        query_lower.is_empty()
            || self.name.to_lowercase().contains(query_lower)
            || self.tags.to_lowercase().contains(query_lower)
    }

    /// Id of the track this station plays as. Falls back to the stream URL
    /// for stations without a uuid.
    pub fn track_id(&self) -> &str {
        if self.uuid.is_empty() {
            &self.url_resolved
        } else {
            &self.uuid
        }
    }

    pub fn to_track(&self) -> Track {
        Track::new(
            self.track_id(),
            self.name.trim(),
            TrackSource::Stream(self.url_resolved.clone()),
            LIVE_RADIO,
        )
    }
}

/// Stations offered when no mirror answers.
pub fn builtin_stations() -> Vec<Station> {
    vec![
        Station {
            uuid: "bbc1".into(),
            name: "BBC Radio 1".into(),
            country_code: "GB".into(),
            url_resolved: "http://bbcmedia.ic.llnwd.net/stream/bbcmedia_radio1_mf_p".into(),
            favicon: "https://upload.wikimedia.org/wikipedia/en/thumb/4/48/BBC_Radio_1.svg/1200px-BBC_Radio_1.svg.png".into(),
            tags: "pop, chart".into(),
        },
        Station {
            uuid: "capital".into(),
            name: "Capital FM UK".into(),
            country_code: "GB".into(),
            url_resolved: "http://media-ice.musicradio.com/CapitalMP3".into(),
            favicon: "https://upload.wikimedia.org/wikipedia/en/3/34/Capital_FM_logo.png".into(),
            tags: "pop, hits".into(),
        },
    ]
}
