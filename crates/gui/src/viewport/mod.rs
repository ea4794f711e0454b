//! 3D viewport panel painted with egui

mod cursor_host;

use std::time::Instant;

use egui::{PointerButton, Pos2, Rect, Sense, Ui};
use glam::Mat4;
use shared::PartId;

use crate::capture::PngFileSink;
use crate::cursor::CursorFeedbackController;
use crate::state::AppState;
pub use cursor_host::EguiCursorHost;

/// Degrees of orbit per dragged pixel
const ORBIT_SPEED: f32 = 0.4;

/// Viewport panel: shaded model, orbit, picking, capture polling
pub struct ViewportPanel {
    start: Instant,
    last_frame: Option<Instant>,
    /// Pointer was over the viewport last frame
    pointer_inside: bool,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_frame: None,
            pointer_inside: false,
        }
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        state: &mut AppState,
        cursor: &CursorFeedbackController<EguiCursorHost>,
    ) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|t| now.duration_since(t).as_secs_f32().min(0.1))
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        let home = state.settings.camera.home_distance(rect.width());
        state.camera.set_home_distance(home);
        state.camera.step(dt);
        let pose = state.model_pose(now.duration_since(self.start).as_secs_f32());

        // ── Orbit ─────────────────────────────────────────────
        if response.dragged_by(PointerButton::Primary) {
            let delta = response.drag_delta();
            state.camera.rotate(-delta.x * ORBIT_SPEED, delta.y * ORBIT_SPEED);
        }

        // ── Picking ───────────────────────────────────────────
        let hover_pos = response.hover_pos();
        self.route_pointer(ui, state, rect, pose, hover_pos);

        // ── Paint ─────────────────────────────────────────────
        let painter = ui.painter_at(rect);
        let [r, g, b] = state.renderer.background;
        painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(r, g, b));

        let triangles = state
            .renderer
            .triangles(&state.meshes, &state.store, &state.camera, pose, rect);
        let mut mesh = egui::Mesh::default();
        for tri in &triangles {
            let base = mesh.vertices.len() as u32;
            for p in tri.points {
                mesh.colored_vertex(p, tri.color);
            }
            mesh.add_triangle(base, base + 1, base + 2);
        }
        painter.add(egui::Shape::mesh(mesh));

        cursor.with_host(|host| host.paint(ui, hover_pos));

        // ── Capture ───────────────────────────────────────────
        if !state.capture.is_idle() {
            let mut sink = PngFileSink::new(
                state.settings.capture.resolved_output_dir(),
                state.settings.capture.file_name.clone(),
            );
            state.poll_capture(now, pose, &mut sink);
        }

        if state.settings.viewport.float_animation
            || state.camera.is_resetting()
            || !state.capture.is_idle()
        {
            ui.ctx().request_repaint();
        }
    }

    fn route_pointer(
        &mut self,
        ui: &Ui,
        state: &mut AppState,
        rect: Rect,
        pose: Mat4,
        hover_pos: Option<Pos2>,
    ) {
        let Some(pos) = hover_pos else {
            if std::mem::take(&mut self.pointer_inside) {
                if let Err(e) = state.pointer_left() {
                    tracing::warn!("Pointer leave failed: {e}");
                }
            }
            return;
        };
        self.pointer_inside = true;

        let ray = state.camera.screen_ray(pos, rect);
        let hits: Vec<PartId> = state
            .meshes
            .pick(&ray, pose)
            .into_iter()
            .map(|hit| hit.part)
            .collect();

        if let Err(e) = state.pointer_moved(&hits) {
            tracing::warn!("Pointer move failed: {e}");
        }
        if ui.input(|i| i.pointer.primary_pressed()) {
            if let Err(e) = state.pointer_down(&hits) {
                tracing::warn!("Pointer down failed: {e}");
            }
        }
    }
}
