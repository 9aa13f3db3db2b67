use eframe::egui;

use crate::ui::state::AppState;

/// Returns the trimmed body to send. The text stays in the box until the
/// backend accepts it.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) -> Option<String> {
    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.add_enabled(
            !state.sending,
            egui::TextEdit::singleline(&mut state.input_text).hint_text("Type a message..."),
        );
        let button = if state.sending { "Sending..." } else { "Send" };
        if ui
            .add_enabled(state.pending_input().is_some(), egui::Button::new(button))
            .clicked()
        {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    if send { state.pending_input() } else { None }
}
