//! Application module: the model behind the TUI.
//!
//! `App` lives in `app::model` and holds the library, the radio stations,
//! the cursor and search state, and a handle to the published playback view.

mod model;

pub use model::*;
