mod app;
mod audio;
mod config;
mod library;
mod playback;
mod radio;
mod runtime;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
