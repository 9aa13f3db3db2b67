//! Background message poller.
//!
//! One tokio task per chat session. On every tick it fetches the full message
//! list, diffs it against its baseline by id and notifies listeners about the
//! messages it has not seen before. At most one fetch is outstanding: a tick
//! that fires while a fetch is pending is dropped, never queued.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::common::{ChatMessage, PollerCommand, SyncEvent};
use crate::network::{ApiResult, ChatApi};

use super::diff::find_new_messages;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
const EVENT_CHANNEL_CAPACITY: usize = 100;

type PendingFetch = BoxFuture<'static, ApiResult<Vec<ChatMessage>>>;

pub struct MessagePoller {
    api: Arc<dyn ChatApi>,
    baseline: Vec<ChatMessage>,
    interval: Duration,
    listeners: Vec<mpsc::Sender<SyncEvent>>,
    /// Baseline additions since the current fetch started. A fetch that began
    /// before them cannot contain them, so they survive its result.
    added_during_fetch: Vec<ChatMessage>,
    command_receiver: mpsc::UnboundedReceiver<PollerCommand>,
}

impl MessagePoller {
    /// Spawns the poller and returns its handle plus the first listener.
    ///
    /// The first tick fires one `interval` after start. A zero interval falls
    /// back to [`DEFAULT_POLL_INTERVAL`].
    pub fn start(
        api: Arc<dyn ChatApi>,
        baseline: Vec<ChatMessage>,
        interval: Duration,
    ) -> (PollerHandle, mpsc::Receiver<SyncEvent>) {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        let (event_sender, event_receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };

        let poller = Self {
            api,
            baseline,
            interval,
            listeners: vec![event_sender],
            added_during_fetch: Vec::new(),
            command_receiver,
        };
        let task = tokio::spawn(poller.run());

        (
            PollerHandle {
                commands: command_sender,
                task: Some(task),
            },
            event_receiver,
        )
    }

    async fn run(mut self) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<PendingFetch> = None;

        log::info!(
            "Message poller started ({} known messages, every {} ms)",
            self.baseline.len(),
            self.interval.as_millis()
        );

        loop {
            tokio::select! {
                // Mailbox first: a baseline update sent before a tick is
                // always visible to that tick's diff.
                biased;

                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
                result = settle(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    match result {
                        Ok(fetched) => self.apply_fetch(fetched).await,
                        Err(err) => log::warn!("Failed to poll chat messages: {err}"),
                    }
                }
                _ = ticker.tick() => {
                    if in_flight.is_some() {
                        log::trace!("Poll still in flight; dropping tick");
                        continue;
                    }
                    self.added_during_fetch.clear();
                    let api = Arc::clone(&self.api);
                    in_flight = Some(async move { api.fetch_messages().await }.boxed());
                }
            }
        }

        log::info!("Message poller mailbox closed; exiting");
    }

    fn handle_command(&mut self, command: PollerCommand) {
        match command {
            PollerCommand::SetBaseline(messages) => {
                log::debug!("Baseline replaced ({} messages)", messages.len());
                self.added_during_fetch
                    .retain(|added| messages.iter().any(|message| message.id == added.id));
                for message in &messages {
                    let known = self.baseline.iter().any(|old| old.id == message.id);
                    if !known && !contains_id(&self.added_during_fetch, message) {
                        self.added_during_fetch.push(message.clone());
                    }
                }
                self.baseline = messages;
            }
            PollerCommand::AddMessage(message) => {
                if !contains_id(&self.added_during_fetch, &message) {
                    self.added_during_fetch.push(message.clone());
                }
                self.baseline.push(message);
            }
            PollerCommand::ClearBaseline => {
                log::debug!("Baseline cleared");
                self.baseline.clear();
                self.added_during_fetch.clear();
            }
            PollerCommand::Subscribe(listener) => {
                self.listeners.push(listener);
            }
        }
    }

    /// The fetched list becomes the baseline, plus anything added to the
    /// baseline while this fetch was in flight and missing from its result.
    async fn apply_fetch(&mut self, fetched: Vec<ChatMessage>) {
        let new_only = find_new_messages(&self.baseline, &fetched);
        log::debug!("Polled {} messages, {} new", fetched.len(), new_only.len());
        if new_only.is_empty() {
            return;
        }

        let mut baseline = fetched.clone();
        for added in self.added_during_fetch.drain(..) {
            if !contains_id(&baseline, &added) {
                baseline.push(added);
            }
        }
        self.baseline = baseline;
        self.notify(SyncEvent::NewMessages { new_only, fetched }).await;
    }

    async fn notify(&mut self, event: SyncEvent) {
        let mut open = Vec::with_capacity(self.listeners.len());
        for listener in self.listeners.drain(..) {
            if listener.send(event.clone()).await.is_ok() {
                open.push(listener);
            } else {
                log::debug!("Dropping detached poller listener");
            }
        }
        self.listeners = open;
    }
}

fn contains_id(messages: &[ChatMessage], message: &ChatMessage) -> bool {
    messages.iter().any(|known| known.id == message.id)
}

async fn settle(fetch: &mut Option<PendingFetch>) -> ApiResult<Vec<ChatMessage>> {
    match fetch.as_mut() {
        Some(fetch) => fetch.await,
        None => future::pending().await,
    }
}

/// Owner's side of a running poller. Stopping or dropping the handle ends the
/// task at its next await point.
///
/// On a multi-threaded runtime a notification that was already being
/// delivered when `stop` ran may still land. Drop the receiver as well to be
/// sure nothing more arrives.
pub struct PollerHandle {
    commands: mpsc::UnboundedSender<PollerCommand>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn set_baseline(&self, messages: Vec<ChatMessage>) {
        self.send(PollerCommand::SetBaseline(messages));
    }

    pub fn add_message(&self, message: ChatMessage) {
        self.send(PollerCommand::AddMessage(message));
    }

    pub fn clear_baseline(&self) {
        self.send(PollerCommand::ClearBaseline);
    }

    pub fn subscribe(&self) -> mpsc::Receiver<SyncEvent> {
        let (sender, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.send(PollerCommand::Subscribe(sender));
        receiver
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancels the timer and any pending fetch. Safe to call repeatedly.
    /// Does not wait for the task to wind down.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            log::info!("Message poller stopped");
        }
    }

    fn send(&self, command: PollerCommand) {
        if self.commands.send(command).is_err() {
            log::debug!("Poller mailbox closed; command ignored");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MessageId;
    use crate::sync::testing::FakeChatApi;

    const INTERVAL: Duration = Duration::from_millis(2000);
    const HALF_TICK: Duration = Duration::from_millis(500);

    fn msg(id: i64) -> ChatMessage {
        ChatMessage::new(id, "ops", &format!("message {id}"))
    }

    fn ids(messages: &[ChatMessage]) -> Vec<MessageId> {
        messages.iter().map(|message| message.id.clone()).collect()
    }

    async fn expect_event(receiver: &mut mpsc::Receiver<SyncEvent>) -> SyncEvent {
        time::timeout(Duration::from_secs(30), receiver.recv())
            .await
            .expect("no notification in time")
            .expect("poller listener closed")
    }

    async fn expect_silence(receiver: &mut mpsc::Receiver<SyncEvent>, window: Duration) {
        if let Ok(Some(event)) = time::timeout(window, receiver.recv()).await {
            panic!("unexpected notification: {event:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_new_ids_and_adopts_fetched_list() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1), msg(2)]));
        let (_handle, mut events) = MessagePoller::start(api.clone(), vec![msg(1)], INTERVAL);

        let SyncEvent::NewMessages { new_only, fetched } = expect_event(&mut events).await;
        assert_eq!(ids(&new_only), vec![MessageId::Number(2)]);
        assert_eq!(ids(&fetched), vec![MessageId::Number(1), MessageId::Number(2)]);

        // Baseline is now [1, 2]: the same list again is not news.
        expect_silence(&mut events, INTERVAL * 3).await;
        assert!(api.fetch_count() >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_list_emits_nothing() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1), msg(2)]));
        let (_handle, mut events) =
            MessagePoller::start(api.clone(), vec![msg(2), msg(1)], INTERVAL);

        expect_silence(&mut events, INTERVAL * 4 + HALF_TICK).await;
        assert_eq!(api.fetch_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_interval() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1)]));
        let (_handle, mut events) = MessagePoller::start(api.clone(), Vec::new(), INTERVAL);

        time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(api.fetch_count(), 0);

        let SyncEvent::NewMessages { new_only, .. } = expect_event(&mut events).await;
        assert_eq!(ids(&new_only), vec![MessageId::Number(1)]);
        assert_eq!(api.fetch_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_drops_overlapping_ticks() {
        let api = Arc::new(
            FakeChatApi::with_messages(vec![msg(1)]).with_fetch_delay(Duration::from_millis(5000)),
        );
        let (_handle, _events) = MessagePoller::start(api.clone(), vec![msg(1)], INTERVAL);

        // Ticks at 2s, 4s, 6s, 8s, 10s, 12s. Fetches start at 2s and 8s; the
        // ticks at 4s and 6s (and 10s, 12s) are dropped. Queued ticks would
        // have started a fetch at 7s.
        time::sleep(Duration::from_millis(12_500)).await;

        assert_eq!(api.fetch_count(), 2);
        assert_eq!(api.max_concurrent_fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_keep_baseline_and_timer() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1), msg(2)]));
        api.fail_with(503);
        let (handle, mut events) = MessagePoller::start(api.clone(), vec![msg(1)], INTERVAL);

        expect_silence(&mut events, INTERVAL * 3 + HALF_TICK).await;
        assert_eq!(api.fetch_count(), 3);
        assert!(handle.is_running());

        api.recover();
        let SyncEvent::NewMessages { new_only, .. } = expect_event(&mut events).await;
        assert_eq!(ids(&new_only), vec![MessageId::Number(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_is_just_another_failed_tick() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1)]));
        api.fail_with(401);
        let (handle, mut events) = MessagePoller::start(api.clone(), Vec::new(), INTERVAL);

        expect_silence(&mut events, INTERVAL * 2).await;
        assert!(handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn set_baseline_suppresses_known_messages() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1)]));
        let (handle, mut events) = MessagePoller::start(api.clone(), vec![msg(1)], INTERVAL);

        api.push(msg(2));
        handle.set_baseline(vec![msg(1), msg(2)]);

        expect_silence(&mut events, INTERVAL * 2 + HALF_TICK).await;
        assert_eq!(api.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn add_message_extends_baseline() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1), msg(2), msg(3)]));
        let (handle, mut events) = MessagePoller::start(api.clone(), vec![msg(1)], INTERVAL);

        handle.add_message(msg(2));

        let SyncEvent::NewMessages { new_only, .. } = expect_event(&mut events).await;
        assert_eq!(ids(&new_only), vec![MessageId::Number(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn message_added_during_fetch_survives_its_result() {
        let api = Arc::new(
            FakeChatApi::with_messages(vec![msg(1), msg(2), msg(1000)])
                .with_fetch_delay(Duration::from_millis(1000)),
        );
        // Snapshot taken before 1000 was written.
        api.serve_stale(vec![msg(1), msg(2)]);
        let (handle, mut events) = MessagePoller::start(api.clone(), vec![msg(1)], INTERVAL);

        // Fetch runs from 2s to 3s; the send lands in between.
        time::sleep(INTERVAL + HALF_TICK).await;
        handle.set_baseline(vec![msg(1), msg(1000)]);

        let SyncEvent::NewMessages { new_only, .. } = expect_event(&mut events).await;
        assert_eq!(ids(&new_only), vec![MessageId::Number(2)]);

        // Next fetch (4s to 5s) sees 1000, which is already known.
        api.serve_live();
        expect_silence(&mut events, INTERVAL + HALF_TICK).await;
        assert_eq!(api.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_baseline_resurfaces_stale_poll() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1), msg(2)]));
        let (handle, mut events) =
            MessagePoller::start(api.clone(), vec![msg(1), msg(2)], INTERVAL);

        handle.clear_baseline();

        let SyncEvent::NewMessages { new_only, .. } = expect_event(&mut events).await;
        assert_eq!(ids(&new_only), vec![MessageId::Number(1), MessageId::Number(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn every_subscriber_gets_the_envelope() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1)]));
        let (handle, mut first) = MessagePoller::start(api.clone(), Vec::new(), INTERVAL);
        let mut second = handle.subscribe();

        let a = expect_event(&mut first).await;
        let b = expect_event(&mut second).await;
        assert_eq!(a, b);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_listener_does_not_stop_the_others() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1)]));
        let (handle, first) = MessagePoller::start(api.clone(), Vec::new(), INTERVAL);
        let mut second = handle.subscribe();
        drop(first);

        let SyncEvent::NewMessages { new_only, .. } = expect_event(&mut second).await;
        assert_eq!(new_only.len(), 1);

        api.push(msg(2));
        let SyncEvent::NewMessages { new_only, .. } = expect_event(&mut second).await;
        assert_eq!(ids(&new_only), vec![MessageId::Number(2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_mid_interval_silences_the_handle() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1)]));
        let (mut handle, mut events) = MessagePoller::start(api.clone(), vec![msg(1)], INTERVAL);

        time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(api.fetch_count(), 1);

        handle.stop();
        handle.stop();
        api.push(msg(2));
        time::sleep(INTERVAL * 5).await;

        assert_eq!(api.fetch_count(), 1);
        assert!(!handle.is_running());
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_polling() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1)]));
        let (handle, mut events) = MessagePoller::start(api.clone(), Vec::new(), INTERVAL);
        drop(handle);

        time::sleep(INTERVAL * 3).await;
        assert_eq!(api.fetch_count(), 0);
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_uses_default() {
        let api = Arc::new(FakeChatApi::with_messages(vec![msg(1)]));
        let (_handle, _events) = MessagePoller::start(api.clone(), vec![msg(1)], Duration::ZERO);

        time::sleep(Duration::from_millis(4100)).await;
        assert_eq!(api.fetch_count(), 2);
    }
}
