//! Logging setup.
//!
//! The cooking screen owns the terminal, so log lines go to a file under the
//! state directory instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Default filter for a `-v` count, overridden by `RUST_LOG`
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbose)))
}

/// Sends logs to `log_path`, or nowhere if the file cannot be opened.
pub fn init_logging(verbose: u8, log_path: Option<&Path>) {
    let file = log_path.and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    let Some(file) = file else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .try_init();

    debug!("sizzle started with verbosity level: {}", verbose);
}
