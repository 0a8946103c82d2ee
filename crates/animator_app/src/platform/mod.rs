mod app;
mod config;
mod credential;
mod logging;
mod ui;

pub use app::run_app;
