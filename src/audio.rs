//! `rodio` audio backend.
//!
//! A single thread owns the output stream and every open sink. The rest of
//! the program talks to it through [`RodioBackend`] and hears back through
//! the event channel handed to [`RodioBackend::spawn`].

mod backend;
mod sink;
mod stream;
mod thread;
mod types;

pub use backend::RodioBackend;
