use crate::common::{ChatEvent, ChatMessage};
use crate::session::Session;

/// Local state of the chat window.
pub struct AppState {
    pub session: Session,
    pub messages: Vec<ChatMessage>,
    pub input_text: String,
    pub error: Option<String>,
    pub loading: bool,
    pub sending: bool,
    /// The "clear all messages" prompt is showing.
    pub confirm_clear_open: bool,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            messages: Vec::new(),
            input_text: String::new(),
            error: None,
            loading: false,
            sending: false,
            confirm_clear_open: false,
        }
    }

    pub fn apply(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::MessagesUpdated(messages) => self.messages = messages,
            ChatEvent::ErrorChanged(error) => self.error = error,
            ChatEvent::Loading(loading) => self.loading = loading,
            ChatEvent::Sending(sending) => self.sending = sending,
            ChatEvent::MessageSent => self.input_text.clear(),
        }
    }

    pub fn can_clear(&self) -> bool {
        self.session.is_admin()
    }

    /// Trimmed input, if there is anything worth sending right now.
    pub fn pending_input(&self) -> Option<String> {
        let body = self.input_text.trim();
        if body.is_empty() || self.sending {
            None
        } else {
            Some(body.to_string())
        }
    }
}
