//! In-memory chat backend for the poller and coordinator tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::common::ChatMessage;
use crate::network::{ApiError, ApiResult, ChatApi};

#[derive(Default)]
pub struct FakeChatApi {
    store: Mutex<Vec<ChatMessage>>,
    /// Served by the next fetches instead of `store`, to model a poll racing a write.
    stale_view: Mutex<Option<Vec<ChatMessage>>>,
    failure: Mutex<Option<u16>>,
    fetch_delay: Duration,
    next_id: AtomicI64,
    fetches: AtomicUsize,
    active_fetches: AtomicUsize,
    max_active_fetches: AtomicUsize,
    sends: AtomicUsize,
    clears: AtomicUsize,
}

impl FakeChatApi {
    pub fn with_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            store: Mutex::new(messages),
            ..Self::default()
        }
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn push(&self, message: ChatMessage) {
        self.store.lock().unwrap().push(message);
    }

    pub fn serve_stale(&self, messages: Vec<ChatMessage>) {
        *self.stale_view.lock().unwrap() = Some(messages);
    }

    pub fn serve_live(&self) {
        *self.stale_view.lock().unwrap() = None;
    }

    /// Every call fails with this HTTP status until `recover` is called.
    pub fn fail_with(&self, status: u16) {
        *self.failure.lock().unwrap() = Some(status);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_active_fetches.load(Ordering::SeqCst)
    }

    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> ApiResult<()> {
        match *self.failure.lock().unwrap() {
            Some(401) => Err(ApiError::Unauthorized),
            Some(403) => Err(ApiError::Forbidden),
            Some(status) => Err(ApiError::Status(status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatApi for FakeChatApi {
    async fn fetch_messages(&self) -> ApiResult<Vec<ChatMessage>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let active = self.active_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_fetches.fetch_max(active, Ordering::SeqCst);

        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }

        let result = self.check_failure().map(|()| {
            let stale = self.stale_view.lock().unwrap().clone();
            stale.unwrap_or_else(|| self.store.lock().unwrap().clone())
        });
        self.active_fetches.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn send_message(&self, body: &str) -> ApiResult<ChatMessage> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message =
            ChatMessage::new(id, "me", body).with_sent_at("2024-05-01T12:00:00Z");
        self.store.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn clear_messages(&self) -> ApiResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.store.lock().unwrap().clear();
        Ok(())
    }
}
