//! Color picker and actions for the selected part

use std::time::Instant;

use egui::color_picker::{color_picker_color32, Alpha};
use egui::{Color32, Ui};
use shared::Color;

use crate::capture::CaptureError;
use crate::state::settings::SettleMode;
use crate::state::AppState;

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading(format!("Customize your {}", state.model.name));
    ui.separator();

    show_picker(ui, state);
    ui.add_space(8.0);
    show_swatches(ui, state);
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        if ui.button("Reset colors").clicked() {
            state.store.reset_colors();
        }

        let idle = state.capture.is_idle();
        let label = if idle { "Take Snapshot" } else { "Capturing..." };
        if ui.add_enabled(idle, egui::Button::new(label)).clicked() {
            match state.request_capture(Instant::now()) {
                Ok(()) | Err(CaptureError::InFlight) => {}
                Err(e) => tracing::error!("Capture request failed: {e}"),
            }
        }
    });

    ui.add_space(8.0);
    show_settings(ui, state);
}

fn show_picker(ui: &mut Ui, state: &mut AppState) {
    let Some(part) = state.store.current_part().cloned() else {
        ui.add_space(10.0);
        ui.vertical_centered(|ui| {
            ui.weak("Select a part");
            ui.weak("by clicking on the model");
        });
        ui.add_enabled_ui(false, |ui| {
            let mut placeholder = Color32::WHITE;
            color_picker_color32(ui, &mut placeholder, Alpha::Opaque);
        });
        return;
    };

    let [r, g, b] = state.store.current_color().map(Color::rgb).unwrap_or([255; 3]);
    let mut color = Color32::from_rgb(r, g, b);
    if color_picker_color32(ui, &mut color, Alpha::Opaque) {
        let picked = Color::from_rgb([color.r(), color.g(), color.b()]);
        if let Err(e) = state.store.set_color_value(part.as_str(), picked) {
            tracing::warn!("Color change rejected: {e}");
        }
    }

    ui.horizontal(|ui| {
        ui.strong(part.as_str().to_uppercase());
        if let Ok(color) = state.store.get_color(part.as_str()) {
            ui.monospace(color.as_str());
        }
    });
}

/// One swatch per part; clicking selects it
fn show_swatches(ui: &mut Ui, state: &mut AppState) {
    let mut clicked = None;
    egui::Grid::new("part_swatches")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            for part in state.store.parts() {
                let [r, g, b] = state
                    .store
                    .get_color(part.as_str())
                    .map(Color::rgb)
                    .unwrap_or([255; 3]);
                let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(rect, 3.0, Color32::from_rgb(r, g, b));
                let selected = state.store.current_part() == Some(part);
                if ui.selectable_label(selected, part.as_str()).clicked() {
                    clicked = Some(part.clone());
                }
                ui.end_row();
            }
        });

    if let Some(part) = clicked {
        if let Err(e) = state.store.set_current_part(Some(part.as_str())) {
            tracing::warn!("Selection rejected: {e}");
        }
    }
}

fn show_settings(ui: &mut Ui, state: &mut AppState) {
    let mut changed = false;
    egui::CollapsingHeader::new("Settings")
        .id_salt("settings")
        .default_open(false)
        .show(ui, |ui| {
            changed |= ui
                .checkbox(&mut state.settings.viewport.float_animation, "Float animation")
                .changed();

            let capture = &mut state.settings.capture;
            egui::ComboBox::from_label("Camera settle")
                .selected_text(match capture.settle_mode {
                    SettleMode::FixedDelay => "Fixed delay",
                    SettleMode::UntilSettled => "Until settled",
                })
                .show_ui(ui, |ui| {
                    changed |= ui
                        .selectable_value(&mut capture.settle_mode, SettleMode::FixedDelay, "Fixed delay")
                        .changed();
                    changed |= ui
                        .selectable_value(
                            &mut capture.settle_mode,
                            SettleMode::UntilSettled,
                            "Until settled",
                        )
                        .changed();
                });

            changed |= ui
                .add(
                    egui::Slider::new(&mut capture.settle_delay_ms, 0..=5000)
                        .text("Delay (ms)"),
                )
                .changed();

            ui.label(format!(
                "Saving to {}",
                capture.resolved_output_dir().join(&capture.file_name).display()
            ));
        });

    if changed {
        state.capture.set_policy(state.settings.capture.settle_policy());
        state.settings.save();
    }
}
