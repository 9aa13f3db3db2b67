use std::env;

use serde::{Deserialize, Serialize};

use crate::common::ChatMessage;

pub const ADMIN_ROLE: &str = "ADMIN";

/// The signed-in user, as far as the chat needs to know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
}

impl Session {
    /// Reads `CHAT_TOKEN`, `CHAT_USERNAME`, `CHAT_DISPLAY_NAME` and `CHAT_ROLE`.
    pub fn from_env() -> Self {
        let read = |key: &str| env::var(key).unwrap_or_default().trim().to_string();
        Self {
            token: read("CHAT_TOKEN"),
            username: read("CHAT_USERNAME"),
            display_name: read("CHAT_DISPLAY_NAME"),
            role: read("CHAT_ROLE"),
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    /// Only admins get the clear-all action.
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(ADMIN_ROLE)
    }

    /// Whether `message` was written by this user (matched on username or display name).
    pub fn owns(&self, message: &ChatMessage) -> bool {
        let author = message.username.as_str();
        !author.is_empty() && (author == self.username || author == self.display_name)
    }

    /// Name shown for this user, falling back to the username.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}
