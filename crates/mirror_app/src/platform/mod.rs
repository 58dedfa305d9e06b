mod app;
mod artifacts;
mod config;
mod logging;
mod render;

pub use app::run_app;
