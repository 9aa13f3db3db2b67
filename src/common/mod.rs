pub mod commands;
pub mod events;
pub mod types;

pub use commands::{ChatCommand, Confirmation, PollerCommand};
pub use events::{ChatEvent, SyncEvent};
pub use types::{ChatMessage, MessageId};
