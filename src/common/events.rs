use serde::{Deserialize, Serialize};

use super::types::ChatMessage;

/// Notification envelope sent by the poller to its listeners.
///
/// Envelopes carry owned lists so the receiving side never shares state with
/// the poller task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncEvent {
    #[serde(rename_all = "camelCase")]
    NewMessages {
        new_only: Vec<ChatMessage>,
        fetched: Vec<ChatMessage>,
    },
}

/// Events the chat task reports back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Display list, already sorted by send time.
    MessagesUpdated(Vec<ChatMessage>),
    ErrorChanged(Option<String>),
    Loading(bool),
    Sending(bool),
    /// The last `SendMessage` was accepted by the backend.
    MessageSent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_kind_discriminator() {
        let event = SyncEvent::NewMessages {
            new_only: vec![ChatMessage::new(2, "li", "sapphires shipped")],
            fetched: vec![
                ChatMessage::new(1, "li", "hi"),
                ChatMessage::new(2, "li", "sapphires shipped"),
            ],
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NEW_MESSAGES");
        assert_eq!(json["newOnly"].as_array().unwrap().len(), 1);
        assert_eq!(json["fetched"].as_array().unwrap().len(), 2);

        let decoded: SyncEvent = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, event);
    }
}
