//! Factory functions for test models and settings.
//!
//! Used by the integration tests and handy when scripting the harness.

use std::path::Path;

use shared::*;

use crate::state::settings::{AppSettings, SettleMode};

// ── Part factories ──────────────────────────────────────────────

/// A part made of a single cube.
pub fn cube_part(name: &str, size: f64, pos: [f64; 3]) -> PartSpec {
    PartSpec {
        name: PartId::new(name),
        default_color: Color::white(),
        shapes: vec![Shape {
            primitive: Primitive::Cube {
                width: size,
                height: size,
                depth: size,
            },
            transform: Transform::at(pos),
        }],
    }
}

/// A part with no preview geometry (still colorable).
pub fn bare_part(name: &str) -> PartSpec {
    PartSpec {
        name: PartId::new(name),
        default_color: Color::white(),
        shapes: Vec::new(),
    }
}

/// Same part with a different default color.
pub fn with_default(mut part: PartSpec, color: &str) -> PartSpec {
    part.default_color = Color::parse(color).unwrap_or_default();
    part
}

// ── Model factories ─────────────────────────────────────────────

pub fn model(name: &str, parts: Vec<PartSpec>) -> ModelDescription {
    ModelDescription {
        name: name.to_string(),
        parts,
    }
}

/// Geometry-less model with the given part names.
pub fn named_parts(names: &[&str]) -> ModelDescription {
    model("named", names.iter().map(|n| bare_part(n)).collect())
}

/// Three cubes stacked along Z: `front` nearest a camera on +Z, then
/// `middle`, then `back`.
pub fn stacked_cubes() -> ModelDescription {
    model(
        "stacked",
        vec![
            cube_part("back", 0.5, [0.0, 0.0, -1.0]),
            cube_part("middle", 0.5, [0.0, 0.0, 0.0]),
            cube_part("front", 0.5, [0.0, 0.0, 1.0]),
        ],
    )
}

// ── Settings factories ──────────────────────────────────────────

/// Defaults with the float animation off, so picks are stable.
pub fn still_settings() -> AppSettings {
    let mut settings = AppSettings::default();
    settings.viewport.float_animation = false;
    settings
}

/// Small capture images written to `dir`, waiting `delay_ms` after reset.
pub fn capture_settings(dir: &Path, delay_ms: u64) -> AppSettings {
    let mut settings = still_settings();
    settings.capture.output_dir = Some(dir.to_path_buf());
    settings.capture.settle_mode = SettleMode::FixedDelay;
    settings.capture.settle_delay_ms = delay_ms;
    settings.capture.width = 64;
    settings.capture.height = 64;
    settings
}
