use eframe::egui;

use crate::ui::state::AppState;

#[derive(Default)]
pub struct HeaderActions {
    pub refresh: bool,
    pub clear: bool,
}

pub fn render(ui: &mut egui::Ui, state: &AppState) -> HeaderActions {
    let mut actions = HeaderActions::default();

    ui.horizontal(|ui| {
        ui.colored_label(egui::Color32::GREEN, "●");
        ui.heading("Team Chat");
        if state.loading {
            ui.spinner();
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if state.can_clear()
                && ui
                    .button("🗑")
                    .on_hover_text("Clear all messages")
                    .clicked()
            {
                actions.clear = true;
            }
            if ui
                .add_enabled(!state.loading, egui::Button::new("⟳"))
                .on_hover_text("Refresh")
                .clicked()
            {
                actions.refresh = true;
            }
            ui.label(egui::RichText::new(state.session.label()).weak());
        });
    });

    actions
}

/// Dismissible error banner. Returns true when the user closed it.
pub fn render_error(ui: &mut egui::Ui, error: &str) -> bool {
    let mut dismissed = false;
    egui::Frame::group(ui.style())
        .fill(egui::Color32::from_rgb(253, 236, 234))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(176, 0, 32), error);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✕").clicked() {
                        dismissed = true;
                    }
                });
            });
        });
    dismissed
}
