mod app;
mod driver;
mod effects;
mod persistence;
mod ui;

pub use app::run_app;
