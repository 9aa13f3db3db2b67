use eframe::egui;

use crate::common::Confirmation;

/// "Clear all messages" prompt. Closes itself once answered.
pub fn confirm_clear(ctx: &egui::Context, open: &mut bool) -> Option<Confirmation> {
    if !*open {
        return None;
    }

    let mut answer = None;
    egui::Window::new("Clear chat")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("Are you sure you want to clear all messages? This cannot be undone.");
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Clear").clicked() {
                    answer = Some(Confirmation::Confirmed);
                }
                if ui.button("Cancel").clicked() {
                    answer = Some(Confirmation::Declined);
                }
            });
        });

    if answer.is_some() {
        *open = false;
    }
    answer
}
