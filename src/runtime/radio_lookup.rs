use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use crate::config::RadioSettings;
use crate::radio::{HttpStationFetcher, Lookup, RadioDirectory};

/// Run the station lookup off the UI thread; the result arrives on the
/// returned channel exactly once.
pub fn spawn_lookup(settings: RadioSettings) -> Receiver<Lookup> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let fetcher = HttpStationFetcher::new(Duration::from_millis(settings.request_timeout_ms));
        let directory = RadioDirectory::new(fetcher, &settings);
        let _ = tx.send(directory.lookup(&settings.country_code));
    });
    rx
}
