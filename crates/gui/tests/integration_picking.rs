//! Screen-space picking through the camera, routed into the store.

use customizer_lib::fixtures::*;
use customizer_lib::harness::TestHarness;
use egui::{pos2, Rect};
use glam::Mat4;
use shared::PartId;

fn viewport() -> Rect {
    Rect::from_min_max(pos2(0.0, 0.0), pos2(800.0, 600.0))
}

fn hits_at(h: &TestHarness, x: f32, y: f32) -> Vec<PartId> {
    let ray = h.state.camera.screen_ray(pos2(x, y), viewport());
    h.state
        .meshes
        .pick(&ray, Mat4::IDENTITY)
        .into_iter()
        .map(|hit| hit.part)
        .collect()
}

#[test]
fn test_center_ray_hits_every_layer_in_depth_order() {
    let h = TestHarness::with_parts(stacked_cubes(), still_settings()).unwrap();
    let hits = hits_at(&h, 400.0, 300.0);
    let names: Vec<&str> = hits.iter().map(PartId::as_str).collect();
    assert_eq!(names, ["front", "middle", "back"]);
}

#[test]
fn test_corner_ray_misses() {
    let h = TestHarness::with_parts(stacked_cubes(), still_settings()).unwrap();
    assert!(hits_at(&h, 5.0, 5.0).is_empty());
}

#[test]
fn test_click_selects_visible_layer_only() {
    let mut h = TestHarness::with_parts(stacked_cubes(), still_settings()).unwrap();
    let hits = hits_at(&h, 400.0, 300.0);

    h.state.pointer_moved(&hits).unwrap();
    assert_eq!(h.hovered(), Some("front"));

    h.state.pointer_down(&hits).unwrap();
    assert_eq!(h.current_part(), Some("front"));

    h.set_color("front", "#00ff00").unwrap();
    assert_eq!(h.get_color("middle").unwrap().as_str(), "#ffffff");
    assert_eq!(h.get_color("back").unwrap().as_str(), "#ffffff");
}

#[test]
fn test_click_on_background_clears_selection() {
    let mut h = TestHarness::with_parts(stacked_cubes(), still_settings()).unwrap();
    h.select(Some("back")).unwrap();

    let hits = hits_at(&h, 5.0, 5.0);
    h.state.pointer_down(&hits).unwrap();
    assert_eq!(h.current_part(), None);
}

#[test]
fn test_orbit_changes_nearest_part() {
    let mut h = TestHarness::with_parts(stacked_cubes(), still_settings()).unwrap();
    // Look from behind
    h.state.camera.rotate(180.0, 0.0);
    let hits = hits_at(&h, 400.0, 300.0);
    assert_eq!(hits.first().map(PartId::as_str), Some("back"));
}
