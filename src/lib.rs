pub mod api;
pub mod app;
pub mod state;
pub mod utils;

#[cfg(feature = "gui")]
pub mod ui;
