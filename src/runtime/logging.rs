use std::error::Error;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use log::LevelFilter;

use crate::config::Settings;

/// Route `log` output to the log file. stderr is unusable while the TUI owns
/// the terminal, so without a file path nothing is logged.
pub fn init(settings: &Settings) -> Result<Option<PathBuf>, Box<dyn Error>> {
    let Some(path) = settings.log_path() else {
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let mut clog = colog::default_builder();
    clog.filter_level(settings.log_level().unwrap_or(LevelFilter::Info));
    clog.write_style(env_logger::WriteStyle::Never);
    clog.target(env_logger::Target::Pipe(Box::new(file)));
    clog.try_init()?;

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
        default_hook(panic_info);
    }));

    Ok(Some(path))
}
