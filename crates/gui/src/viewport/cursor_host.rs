use std::cell::RefCell;
use std::hash::{Hash, Hasher};

use egui::{Pos2, Rect, Ui};

use crate::cursor::{CursorHost, CursorImage, CursorStyle, CURSOR_SIZE};

/// Paints the current cursor image at the pointer and hides the system cursor
pub struct EguiCursorHost {
    current: CursorStyle,
    /// Image uri last handed to the loaders
    loaded: RefCell<Option<String>>,
}

impl EguiCursorHost {
    pub fn new(initial: CursorStyle) -> Self {
        Self {
            current: initial,
            loaded: RefCell::new(None),
        }
    }

    /// Draw the cursor if the pointer is inside the viewport
    pub fn paint(&self, ui: &Ui, pointer: Option<Pos2>) {
        let (Some(pos), CursorStyle::Image(image)) = (pointer, &self.current) else {
            return;
        };
        ui.ctx().set_cursor_icon(egui::CursorIcon::None);

        let uri = image_uri(image);
        if let Some(stale) = self.replace_loaded(&uri) {
            ui.ctx().forget_image(&stale);
        }

        let size = CURSOR_SIZE as f32;
        let min = pos - egui::vec2(image.hotspot.0 as f32, image.hotspot.1 as f32);
        let rect = Rect::from_min_size(min, egui::vec2(size, size));
        egui::Image::from_bytes(uri, image.svg.clone().into_bytes())
            .fit_to_exact_size(rect.size())
            .paint_at(ui, rect);
    }

    /// Record `uri` as loaded; returns the previous one if it differs
    fn replace_loaded(&self, uri: &str) -> Option<String> {
        let mut loaded = self.loaded.borrow_mut();
        if loaded.as_deref() == Some(uri) {
            return None;
        }
        loaded.replace(uri.to_owned())
    }
}

/// Same SVG, same uri: the loader caches the rasterized icon once
fn image_uri(image: &CursorImage) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    image.svg.hash(&mut hasher);
    format!("bytes://cursor/{:016x}.svg", hasher.finish())
}

impl CursorHost for EguiCursorHost {
    fn current(&self) -> CursorStyle {
        self.current.clone()
    }

    fn apply(&mut self, style: CursorStyle) {
        self.current = style;
    }
}
