pub mod common;
pub mod config;
pub mod network;
pub mod session;
pub mod sync;
pub mod ui;
