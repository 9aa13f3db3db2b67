use tokio::sync::mpsc;

use super::events::SyncEvent;
use super::types::ChatMessage;

/// Commands the UI sends to the chat task.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Reload the full message list from the backend.
    Refresh,
    SendMessage(String),
    /// Clear every message on the backend, once the user has answered the
    /// confirmation prompt.
    ClearAll(Confirmation),
    DismissError,
    Shutdown,
}

/// Answer to the "clear all messages" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

/// Mailbox of a running message poller.
#[derive(Debug)]
pub enum PollerCommand {
    /// Replace the baseline wholesale.
    SetBaseline(Vec<ChatMessage>),
    /// Append one message to the baseline.
    AddMessage(ChatMessage),
    /// Forget every known message.
    ClearBaseline,
    /// Attach another listener for new-message notifications.
    Subscribe(mpsc::Sender<SyncEvent>),
}
