//! Identifier-based diffing shared by the poller and the coordinator.

use std::collections::HashSet;

use crate::common::{ChatMessage, MessageId};

/// Messages in `fetched` whose id is not in `known`, in fetch order.
/// A duplicated id inside `fetched` is reported once.
pub fn find_new_messages(known: &[ChatMessage], fetched: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut seen: HashSet<&MessageId> = known.iter().map(|message| &message.id).collect();
    fetched
        .iter()
        .filter(|message| seen.insert(&message.id))
        .cloned()
        .collect()
}

/// Appends every incoming message whose id is not displayed yet and returns
/// the ones actually added. The first-seen copy of an id always wins.
pub fn merge_unique(
    display: &mut Vec<ChatMessage>,
    incoming: impl IntoIterator<Item = ChatMessage>,
) -> Vec<ChatMessage> {
    let mut seen: HashSet<MessageId> = display.iter().map(|message| message.id.clone()).collect();
    let mut added = Vec::new();
    for message in incoming {
        if seen.insert(message.id.clone()) {
            added.push(message.clone());
            display.push(message);
        }
    }
    added
}

/// Copy of `messages` ordered by send time, oldest first. The sort is stable
/// and messages without a readable time come first.
pub fn sorted_by_sent_time(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut sorted = messages.to_vec();
    sorted.sort_by_key(|message| message.sent_time());
    sorted
}
