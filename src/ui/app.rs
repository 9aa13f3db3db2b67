use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{ChatCommand, ChatEvent};
use crate::session::Session;

use super::components::{chat_area, dialogs, header, input_bar};
use super::state::AppState;

/// Relative time labels go stale without input, so repaint at least this often.
const IDLE_REPAINT: Duration = Duration::from_secs(1);

pub struct ChatApp {
    state: AppState,
    command_sender: mpsc::Sender<ChatCommand>,
    event_receiver: mpsc::Receiver<ChatEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        session: Session,
        command_sender: mpsc::Sender<ChatCommand>,
        event_receiver: mpsc::Receiver<ChatEvent>,
    ) -> Self {
        Self {
            state: AppState::new(session),
            command_sender,
            event_receiver,
        }
    }

    fn handle_chat_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.state.apply(event);
        }
    }

    fn send_command(&mut self, command: ChatCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to chat task: {err}");
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_chat_events();

        egui::TopBottomPanel::top("chat_header").show(ctx, |ui| {
            ui.add_space(4.0);
            let actions = header::render(ui, &self.state);
            if actions.refresh {
                self.send_command(ChatCommand::Refresh);
            }
            if actions.clear {
                self.state.confirm_clear_open = true;
            }
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
            ui.add_space(4.0);
            if let Some(body) = input_bar::render(ui, &mut self.state) {
                self.send_command(ChatCommand::SendMessage(body));
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = self.state.error.clone() {
                if header::render_error(ui, &error) {
                    self.state.error = None;
                    self.send_command(ChatCommand::DismissError);
                }
                ui.add_space(4.0);
            }

            chat_area::render(
                ui,
                &self.state.messages,
                &self.state.session,
                self.state.loading,
                chrono::Utc::now(),
            );
        });

        if let Some(answer) = dialogs::confirm_clear(ctx, &mut self.state.confirm_clear_open) {
            self.send_command(ChatCommand::ClearAll(answer));
        }

        ctx.request_repaint_after(IDLE_REPAINT);
    }
}
