//! Layered settings: struct defaults, then `config.toml`, then `FLASHPLAYER__*`
//! environment overrides.

mod load;
mod schema;

pub use schema::*;
