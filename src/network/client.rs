use tokio::sync::mpsc;

use crate::common::{ChatCommand, ChatEvent};
use crate::sync::ChatCoordinator;

/// Background task between the UI and the coordinator.
///
/// The UI never awaits network calls: it sends `ChatCommand`s and renders the
/// `ChatEvent`s that come back.
pub struct ChatClient {
    coordinator: ChatCoordinator,
    event_sender: mpsc::Sender<ChatEvent>,
    command_receiver: mpsc::Receiver<ChatCommand>,
}

impl ChatClient {
    pub fn new(
        coordinator: ChatCoordinator,
        event_sender: mpsc::Sender<ChatEvent>,
        command_receiver: mpsc::Receiver<ChatCommand>,
    ) -> Self {
        Self {
            coordinator,
            event_sender,
            command_receiver,
        }
    }

    pub async fn run(mut self) {
        self.emit(ChatEvent::Loading(true)).await;
        if let Err(err) = self.coordinator.initialize().await {
            log::warn!("Chat initialization failed: {err}");
        }
        self.emit(ChatEvent::Loading(false)).await;
        self.publish().await;

        log::info!("Chat event loop started");

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(ChatCommand::Shutdown) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                event = self.coordinator.next_notification() => {
                    if let Some(event) = event {
                        if !self.coordinator.on_notification(event).is_empty() {
                            self.publish_messages().await;
                        }
                    }
                }
            }
        }

        self.coordinator.teardown();
        log::info!("Chat event loop stopped");
    }

    async fn handle_command(&mut self, command: ChatCommand) {
        match command {
            ChatCommand::Refresh => {
                self.emit(ChatEvent::Loading(true)).await;
                if let Err(err) = self.coordinator.refresh().await {
                    log::debug!("Refresh failed: {err}");
                }
                self.emit(ChatEvent::Loading(false)).await;
                self.publish().await;
            }
            ChatCommand::SendMessage(body) => {
                self.emit(ChatEvent::Sending(true)).await;
                let sent = self.coordinator.send_message(&body).await;
                self.emit(ChatEvent::Sending(false)).await;
                if matches!(sent, Ok(Some(_))) {
                    self.emit(ChatEvent::MessageSent).await;
                }
                self.publish().await;
            }
            ChatCommand::ClearAll(confirmation) => {
                if let Err(err) = self.coordinator.clear_all(confirmation).await {
                    log::debug!("Clear failed: {err}");
                }
                self.publish().await;
            }
            ChatCommand::DismissError => {
                self.coordinator.dismiss_error();
                self.publish_error().await;
            }
            ChatCommand::Shutdown => {}
        }
    }

    async fn publish(&mut self) {
        self.publish_messages().await;
        self.publish_error().await;
    }

    async fn publish_messages(&mut self) {
        let messages = self.coordinator.sorted_messages();
        self.emit(ChatEvent::MessagesUpdated(messages)).await;
    }

    async fn publish_error(&mut self) {
        let error = self.coordinator.error().map(ToString::to_string);
        self.emit(ChatEvent::ErrorChanged(error)).await;
    }

    async fn emit(&mut self, event: ChatEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::warn!("Failed to notify UI: {err}");
        }
    }
}
