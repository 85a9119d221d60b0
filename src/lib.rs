// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod book;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod recipe;
pub mod runtime;
pub mod samples;
pub mod session;
pub mod store;
pub mod ui;
pub mod util;
