//! Main application module

mod styles;

use eframe::egui;
use shared::{ModelDescription, ModelError};

use crate::cursor::{neutral_cursor, CursorFeedbackController, CursorStyle};
use crate::state::{AppSettings, AppState};
use crate::ui::{picker_panel, status_bar};
use crate::viewport::{EguiCursorHost, ViewportPanel};

/// Main application
pub struct CustomizerApp {
    state: AppState,
    viewport: ViewportPanel,
    /// Restores the neutral cursor when the app is torn down mid-hover
    cursor: CursorFeedbackController<EguiCursorHost>,
}

impl CustomizerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, model: ModelDescription) -> Result<Self, ModelError> {
        // SVG cursor icons go through the image loaders
        egui_extras::install_image_loaders(&cc.egui_ctx);
        styles::configure_styles(&cc.egui_ctx);

        let settings = AppSettings::load();
        tracing::info!(
            "Snapshots will be written to {}",
            settings.capture.resolved_output_dir().display()
        );

        let state = AppState::new(model, settings)?;
        let cursor = CursorFeedbackController::new(
            EguiCursorHost::new(CursorStyle::Image(neutral_cursor())),
            &state.router,
            &state.store,
        );

        Ok(Self {
            state,
            viewport: ViewportPanel::new(),
            cursor,
        })
    }
}

impl eframe::App for CustomizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Status bar ───────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 2)),
            )
            .show(ctx, |ui| {
                status_bar::show(ui, &self.state);
            });

        // ── Left panel: picker ───────────────────────────────
        egui::SidePanel::left("picker_panel")
            .default_width(260.0)
            .width_range(200.0..=400.0)
            .resizable(true)
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(10)))
            .show(ctx, |ui| {
                picker_panel::show(ui, &mut self.state);
            });

        // ── Central panel: viewport ──────────────────────────
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.viewport.show(ui, &mut self.state, &self.cursor);
            });
    }
}
