use chrono::{DateTime, Utc};
use eframe::egui;

use crate::common::ChatMessage;
use crate::session::Session;
use crate::ui::format::{format_time, initial};

const OWN_FILL: egui::Color32 = egui::Color32::from_rgb(25, 118, 210);
const OTHER_FILL: egui::Color32 = egui::Color32::from_rgb(245, 245, 245);

pub fn render(
    ui: &mut egui::Ui,
    messages: &[ChatMessage],
    session: &Session,
    loading: bool,
    now: DateTime<Utc>,
) {
    if messages.is_empty() {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            if loading {
                ui.spinner();
            } else {
                ui.label("No messages yet");
                ui.label(egui::RichText::new("Start the conversation!").weak());
            }
        });
        return;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for message in messages {
                render_message(ui, message, session.owns(message), now);
                ui.add_space(6.0);
            }
        });
}

fn render_message(ui: &mut egui::Ui, message: &ChatMessage, own: bool, now: DateTime<Utc>) {
    let layout = if own {
        egui::Layout::top_down(egui::Align::Max)
    } else {
        egui::Layout::top_down(egui::Align::Min)
    };
    let time = format_time(message.sent_time(), now);

    ui.with_layout(layout, |ui| {
        ui.horizontal(|ui| {
            if !own {
                ui.label(egui::RichText::new(initial(&message.username)).strong());
            }
            let (fill, text) = if own {
                (OWN_FILL, egui::Color32::WHITE)
            } else {
                (OTHER_FILL, egui::Color32::BLACK)
            };
            egui::Frame::group(ui.style()).fill(fill).show(ui, |ui| {
                ui.colored_label(text, message.message.as_str());
            });
        });

        let caption = if own || message.username.is_empty() {
            time
        } else {
            format!("{time}  {}", message.username)
        };
        ui.label(egui::RichText::new(caption).small().weak());
    });
}
