//! Application model: what the TUI shows besides playback itself.
//!
//! `App` holds the library, the radio station list, which of the two is on
//! screen, the cursor and the search box.

use crate::library::{Track, name_matches};
use crate::playback::{PlaybackView, ViewHandle};
use crate::radio::{LIVE_RADIO, Station};

/// Which list is on screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Library,
    Radio,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RadioStatus {
    /// Lookup not started yet.
    #[default]
    Idle,
    Loading,
    /// Stations are in; `builtin` when every mirror failed.
    Ready { builtin: bool },
}

pub struct App {
    pub library: Vec<Track>,
    pub stations: Vec<Station>,
    pub view: View,
    /// Index into the list of the current view.
    pub selected: usize,
    pub radio_status: RadioStatus,
    pub filter_mode: bool,
    pub filter_query: String,
    pub playback_handle: Option<ViewHandle>,
    /// One-line message for the footer (import results, errors).
    pub notice: Option<String>,
}

impl App {
    pub fn new(library: Vec<Track>) -> Self {
        Self {
            library,
            stations: Vec::new(),
            view: View::Library,
            selected: 0,
            radio_status: RadioStatus::Idle,
            filter_mode: false,
            filter_query: String::new(),
            playback_handle: None,
            notice: None,
        }
    }

    pub fn set_playback_handle(&mut self, h: ViewHandle) {
        self.playback_handle = Some(h);
    }

    /// Copy of the latest published playback view.
    pub fn playback(&self) -> PlaybackView {
        self.playback_handle
            .as_ref()
            .and_then(|h| h.lock().ok().map(|v| v.clone()))
            .unwrap_or_default()
    }

    pub fn set_notice(&mut self, msg: impl Into<String>) {
        self.notice = Some(msg.into());
    }

    pub fn set_library(&mut self, tracks: Vec<Track>) {
        self.library = tracks;
        self.ensure_selected_visible();
    }

    pub fn set_stations(&mut self, stations: Vec<Station>, builtin: bool) {
        self.stations = stations;
        self.radio_status = RadioStatus::Ready { builtin };
        self.ensure_selected_visible();
    }

    /// Switch between the library and radio lists. The search box is per
    /// list, so it is cleared.
    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Library => View::Radio,
            View::Radio => View::Library,
        };
        self.filter_query.clear();
        self.filter_mode = false;
        self.selected = 0;
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        match self.view {
            View::Library => self.library.len(),
            View::Radio => self.stations.len(),
        }
    }

    /// Name shown for entry `i` of the current view.
    pub fn entry_name(&self, i: usize) -> Option<&str> {
        match self.view {
            View::Library => self.library.get(i).map(|t| t.name.as_str()),
            View::Radio => self.stations.get(i).map(|s| s.name.as_str()),
        }
    }

    /// Id the entry plays under, comparable with the current track's id.
    pub fn entry_id(&self, i: usize) -> Option<&str> {
        match self.view {
            View::Library => self.library.get(i).map(|t| t.id.as_str()),
            View::Radio => self.stations.get(i).map(Station::track_id),
        }
    }

    /// Second line of entry `i`: when the file was added, or that it is live.
    pub fn entry_detail(&self, i: usize) -> Option<&str> {
        match self.view {
            View::Library => self.library.get(i).map(|t| t.added_at.as_str()),
            View::Radio => self.stations.get(i).map(|_| LIVE_RADIO),
        }
    }

    /// Indices of the current view that pass the search box, in list order.
    pub fn display_indices(&self) -> Vec<usize> {
        let query = self.filter_query.trim().to_lowercase();
        match self.view {
            View::Library => self
                .library
                .iter()
                .enumerate()
                .filter(|(_, t)| name_matches(&t.name, &query))
                .map(|(i, _)| i)
                .collect(),
            View::Radio => self
                .stations
                .iter()
                .enumerate()
                .filter(|(_, s)| s.matches(&query))
                .map(|(i, _)| i)
                .collect(),
        }
    }

    /// Track for the entry under the cursor. Stations become stream tracks.
    pub fn selected_track(&self) -> Option<Track> {
        if !self.display_indices().contains(&self.selected) {
            return None;
        }
        match self.view {
            View::Library => self.library.get(self.selected).cloned(),
            View::Radio => self.stations.get(self.selected).map(Station::to_track),
        }
    }

    /// Next visible index after `current`, wrapping to the first.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Previous visible index before `current`, wrapping to the last.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(0) => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
            None => Some(display[display.len() - 1]),
        }
    }

    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.ensure_selected_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Keep `selected` inside the filtered view, else jump to its first entry.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }

        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }

    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }
}
