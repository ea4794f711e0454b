// Library crate: exposes testable modules for integration tests and the JSON command interface.
// GUI-specific modules (app, ui, egui painting) remain in the binary crate.

pub mod capture;
pub mod command;
pub mod cursor;
pub mod fixtures;
pub mod harness;
pub mod state;

/// Picking, pointer routing, camera and software rendering.
/// The egui viewport panel itself stays in the binary crate.
pub mod viewport {
    pub mod camera;
    pub mod hit_test;
    pub mod mesh;
    pub mod model;
    pub mod picking;
    pub mod pointer;
    pub mod render;
}
