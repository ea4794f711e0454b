use egui::Ui;
use shared::PartId;

use crate::capture::CapturePhase;
use crate::state::AppState;

pub fn show(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui| {
        let hovered = state.router.hovered().map_or("-", PartId::as_str);
        ui.weak(format!("Hover: {hovered}"));

        ui.separator();

        let selected = state.store.current_part().map_or("none", PartId::as_str);
        ui.weak(format!("Selected: {selected}"));

        ui.separator();

        match state.capture.phase() {
            CapturePhase::Idle => match &state.last_capture {
                Some(Ok(report)) => {
                    ui.weak(format!("Saved {}", report.path.display()));
                }
                Some(Err(e)) => {
                    ui.colored_label(egui::Color32::from_rgb(200, 60, 60), e);
                }
                None => {}
            },
            CapturePhase::ResettingCamera => {
                ui.weak("Resetting camera...");
            }
            CapturePhase::AwaitingStableFrame | CapturePhase::Capturing => {
                ui.weak("Capturing...");
            }
        }
    });
}
