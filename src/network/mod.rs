pub mod api;
pub mod client;
pub mod error;

pub use api::{ChatApi, HttpChatApi};
pub use client::ChatClient;
pub use error::{ApiError, ApiResult};
