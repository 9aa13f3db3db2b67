use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the backend. The chat API hands out numeric ids;
/// string ids are accepted as well so the client does not depend on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Number(id) => write!(f, "{id}"),
            MessageId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        MessageId::Number(id)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        MessageId::Text(id.to_string())
    }
}

/// A chat message as the backend serves it.
///
/// `id` is the only identity: two messages with the same id are the same
/// message even if the other fields differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sent_at: Option<String>,
}

impl ChatMessage {
    pub fn new(id: i64, username: &str, message: &str) -> Self {
        Self {
            id: MessageId::Number(id),
            username: username.to_string(),
            message: message.to_string(),
            sent_at: None,
        }
    }

    pub fn with_sent_at(mut self, sent_at: &str) -> Self {
        self.sent_at = Some(sent_at.to_string());
        self
    }

    /// Parsed send time. Accepts RFC 3339 and zone-less ISO-8601 (read as UTC).
    pub fn sent_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.sent_at.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
