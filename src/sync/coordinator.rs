//! Foreground side of the chat: owns the displayed message list, drives the
//! poller's lifecycle and keeps its baseline in step with local actions.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::common::{ChatMessage, Confirmation, SyncEvent};
use crate::network::ChatApi;
use crate::session::Session;

use super::diff::{merge_unique, sorted_by_sent_time};
use super::error::{UserAction, UserFacingError};
use super::poller::{MessagePoller, PollerHandle};

pub struct ChatCoordinator {
    api: Arc<dyn ChatApi>,
    session: Session,
    poll_interval: Duration,
    messages: Vec<ChatMessage>,
    error: Option<UserFacingError>,
    poller: Option<PollerHandle>,
    events: Option<mpsc::Receiver<SyncEvent>>,
}

impl ChatCoordinator {
    pub fn new(api: Arc<dyn ChatApi>, session: Session, poll_interval: Duration) -> Self {
        Self {
            api,
            session,
            poll_interval,
            messages: Vec::new(),
            error: None,
            poller: None,
            events: None,
        }
    }

    /// Loads the message list once, then starts polling with it as baseline.
    ///
    /// Polling starts even when the first load fails; only a missing token
    /// keeps it off.
    pub async fn initialize(&mut self) -> Result<(), UserFacingError> {
        if !self.session.has_token() {
            return Err(self.fail(UserFacingError::AuthenticationRequired));
        }

        let loaded = self.load_messages().await;
        self.start_polling();
        loaded
    }

    /// Reloads the full list and hands it to the poller as its new baseline.
    pub async fn refresh(&mut self) -> Result<(), UserFacingError> {
        self.load_messages().await?;
        if let Some(poller) = &self.poller {
            poller.set_baseline(self.messages.clone());
        }
        Ok(())
    }

    /// (Re)starts the poller from the current display list. A running poller
    /// is stopped first, so a session never has two timers.
    pub fn start_polling(&mut self) {
        self.teardown();
        let (handle, events) =
            MessagePoller::start(Arc::clone(&self.api), self.messages.clone(), self.poll_interval);
        self.poller = Some(handle);
        self.events = Some(events);
    }

    /// Stops the poller. Must run whenever the chat is no longer shown.
    pub fn teardown(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
        self.events = None;
    }

    /// Next poller notification. Pending forever while not polling.
    pub async fn next_notification(&mut self) -> Option<SyncEvent> {
        let Some(events) = self.events.as_mut() else {
            return future::pending().await;
        };

        let event = events.recv().await;
        if event.is_none() {
            log::warn!("Message poller went away");
            self.events = None;
        }
        event
    }

    /// Merges a poller notification and returns the messages actually added.
    pub fn on_notification(&mut self, event: SyncEvent) -> Vec<ChatMessage> {
        match event {
            SyncEvent::NewMessages { new_only, .. } => {
                let added = merge_unique(&mut self.messages, new_only);
                if !added.is_empty() {
                    log::debug!("{} new chat messages merged", added.len());
                }
                added
            }
        }
    }

    /// Posts `body` (trimmed). Blank input is ignored and returns `Ok(None)`.
    pub async fn send_message(
        &mut self,
        body: &str,
    ) -> Result<Option<ChatMessage>, UserFacingError> {
        let body = body.trim();
        if body.is_empty() {
            return Ok(None);
        }
        if !self.session.has_token() {
            return Err(self.fail(UserFacingError::AuthenticationRequired));
        }

        match self.api.send_message(body).await {
            Ok(message) => {
                merge_unique(&mut self.messages, [message.clone()]);
                if let Some(poller) = &self.poller {
                    poller.set_baseline(self.messages.clone());
                }
                self.error = None;
                Ok(Some(message))
            }
            Err(err) => {
                log::error!("Error sending message: {err}");
                Err(self.fail(UserFacingError::from_api(UserAction::Send, &err)))
            }
        }
    }

    /// Clears every message on the backend once the user has confirmed.
    /// Returns whether anything was cleared.
    pub async fn clear_all(&mut self, confirmation: Confirmation) -> Result<bool, UserFacingError> {
        if confirmation == Confirmation::Declined {
            return Ok(false);
        }
        if !self.session.has_token() {
            return Err(self.fail(UserFacingError::AuthenticationRequired));
        }

        match self.api.clear_messages().await {
            Ok(()) => {
                self.messages.clear();
                if let Some(poller) = &self.poller {
                    poller.set_baseline(Vec::new());
                }
                self.error = None;
                log::info!("Chat history cleared");
                Ok(true)
            }
            Err(err) => {
                log::error!("Error clearing messages: {err}");
                Err(self.fail(UserFacingError::from_api(UserAction::Clear, &err)))
            }
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Display list ordered by send time, oldest first.
    pub fn sorted_messages(&self) -> Vec<ChatMessage> {
        sorted_by_sent_time(&self.messages)
    }

    pub fn error(&self) -> Option<&UserFacingError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(PollerHandle::is_running)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn load_messages(&mut self) -> Result<(), UserFacingError> {
        if !self.session.has_token() {
            return Err(self.fail(UserFacingError::AuthenticationRequired));
        }

        match self.api.fetch_messages().await {
            Ok(fetched) => {
                let mut messages = Vec::with_capacity(fetched.len());
                merge_unique(&mut messages, fetched);
                log::info!("Loaded {} chat messages", messages.len());
                self.messages = messages;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                log::error!("Error loading messages: {err}");
                Err(self.fail(UserFacingError::from_api(UserAction::Load, &err)))
            }
        }
    }

    fn fail(&mut self, error: UserFacingError) -> UserFacingError {
        self.error = Some(error.clone());
        error
    }
}
