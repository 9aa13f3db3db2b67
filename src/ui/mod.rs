mod app;
mod components;
pub mod format;
pub mod state;

pub use app::ChatApp;
