//! Flat-shaded rendering of the model with the store's live colors.
//!
//! Two outputs share the same shading: screen-space triangles for the egui
//! painter (sorted back to front) and a z-buffered RGBA image for captures.

use egui::{Color32, Pos2, Rect};
use glam::{Mat4, Vec2, Vec3};
use image::{Rgba, RgbaImage};
use shared::{Color, PartId};

use super::camera::ArcBallCamera;
use super::model::ModelMeshes;
use crate::capture::{CaptureError, EncodedImage, FrameSource};
use crate::state::customization::CustomizationStore;
use crate::state::settings::{ViewportSettings, MAX_CAPTURE_SIZE};

/// One triangle ready for the painter
#[derive(Clone, Debug)]
pub struct ShadedTriangle {
    pub part: PartId,
    pub points: [Pos2; 3],
    /// Mean NDC depth, larger is farther
    pub depth: f32,
    pub color: Color32,
}

pub struct SceneRenderer {
    pub background: [u8; 3],
    /// Share of the base color lit regardless of orientation
    pub ambient: f32,
    light_dir: Vec3,
}

impl SceneRenderer {
    pub fn new(background: [u8; 3], ambient: f32) -> Self {
        Self {
            background,
            ambient: ambient.clamp(0.0, 1.0),
            light_dir: Vec3::new(10.0, 15.0, 10.0).normalize(),
        }
    }

    pub fn from_settings(settings: &ViewportSettings) -> Self {
        Self::new(settings.background_color, settings.ambient)
    }

    /// Lambert term on top of the ambient floor
    pub fn shade(&self, base: [u8; 3], normal: Vec3) -> [u8; 3] {
        let lambert = normal.normalize_or_zero().dot(self.light_dir).max(0.0);
        let intensity = (self.ambient + (1.0 - self.ambient) * lambert).min(1.0);
        base.map(|c| (c as f32 * intensity).round() as u8)
    }

    /// Screen-space triangles, farthest first
    pub fn triangles(
        &self,
        meshes: &ModelMeshes,
        store: &CustomizationStore,
        camera: &ArcBallCamera,
        pose: Mat4,
        rect: Rect,
    ) -> Vec<ShadedTriangle> {
        let mut out = Vec::with_capacity(meshes.triangle_count());
        self.for_each_triangle(meshes, store, camera, pose, rect, |part, screen, rgb| {
            let [r, g, b] = rgb;
            out.push(ShadedTriangle {
                part: part.clone(),
                points: screen.map(|p| Pos2::new(p.x, p.y)),
                depth: (screen[0].z + screen[1].z + screen[2].z) / 3.0,
                color: Color32::from_rgb(r, g, b),
            });
        });
        out.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        out
    }

    /// Rasterize the scene into a `width` x `height` image
    pub fn render(
        &self,
        meshes: &ModelMeshes,
        store: &CustomizationStore,
        camera: &ArcBallCamera,
        pose: Mat4,
        width: u32,
        height: u32,
    ) -> RgbaImage {
        let [br, bg, bb] = self.background;
        let mut image = RgbaImage::from_pixel(width, height, Rgba([br, bg, bb, 255]));
        let mut depth = vec![f32::INFINITY; (width as usize) * (height as usize)];
        let rect = Rect::from_min_size(Pos2::ZERO, egui::vec2(width as f32, height as f32));

        self.for_each_triangle(meshes, store, camera, pose, rect, |_, screen, rgb| {
            rasterize_triangle(&mut image, &mut depth, screen, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        });
        image
    }

    fn for_each_triangle(
        &self,
        meshes: &ModelMeshes,
        store: &CustomizationStore,
        camera: &ArcBallCamera,
        pose: Mat4,
        rect: Rect,
        mut emit: impl FnMut(&PartId, [Vec3; 3], [u8; 3]),
    ) {
        for part in &meshes.parts {
            let base = store
                .get_color(part.part.as_str())
                .map(Color::rgb)
                .unwrap_or([255, 255, 255]);
            let mesh = &part.mesh;

            for tri in 0..mesh.triangle_count() {
                let idx = [
                    mesh.indices[tri * 3] as usize,
                    mesh.indices[tri * 3 + 1] as usize,
                    mesh.indices[tri * 3 + 2] as usize,
                ];
                let normal = idx.iter().map(|&i| mesh.normal(i)).sum::<Vec3>();
                let rgb = self.shade(base, pose.transform_vector3(normal));

                let mut screen = [Vec3::ZERO; 3];
                let mut visible = true;
                for (slot, &i) in screen.iter_mut().zip(&idx) {
                    match camera.project(pose.transform_point3(mesh.position(i)), rect) {
                        Some(p) => *slot = p,
                        None => visible = false,
                    }
                }
                if visible {
                    emit(&part.part, screen, rgb);
                }
            }
        }
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::from_settings(&ViewportSettings::default())
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn rasterize_triangle(image: &mut RgbaImage, depth: &mut [f32], screen: [Vec3; 3], color: Rgba<u8>) {
    let (w, h) = (image.width(), image.height());
    let [a, b, c] = screen.map(|p| p.truncate());
    let area = edge(a, b, c);
    if area.abs() < 1e-8 {
        return;
    }

    let min = a.min(b).min(c);
    let max = a.max(b).max(c);
    if max.x < 0.0 || max.y < 0.0 || min.x >= w as f32 || min.y >= h as f32 {
        return;
    }
    let x0 = min.x.floor().max(0.0) as u32;
    let y0 = min.y.floor().max(0.0) as u32;
    let x1 = (max.x.ceil() as u32).min(w - 1);
    let y1 = (max.y.ceil() as u32).min(h - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b, c, p) / area;
            let w1 = edge(c, a, p) / area;
            let w2 = edge(a, b, p) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let z = w0 * screen[0].z + w1 * screen[1].z + w2 * screen[2].z;
            if !(-1.0..=1.0).contains(&z) {
                continue;
            }
            let i = y as usize * w as usize + x as usize;
            if z < depth[i] {
                depth[i] = z;
                image.put_pixel(x, y, color);
            }
        }
    }
}

/// Adapter that lets the capture sequencer read the current frame
pub struct SceneFrameSource<'a> {
    pub renderer: &'a SceneRenderer,
    pub meshes: &'a ModelMeshes,
    pub store: &'a CustomizationStore,
    pub camera: &'a ArcBallCamera,
    pub pose: Mat4,
    pub width: u32,
    pub height: u32,
}

impl FrameSource for SceneFrameSource<'_> {
    fn encode_frame(&mut self) -> Result<EncodedImage, CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::RendererUnavailable(format!(
                "empty surface {}x{}",
                self.width, self.height
            )));
        }
        if self.width > MAX_CAPTURE_SIZE || self.height > MAX_CAPTURE_SIZE {
            return Err(CaptureError::RendererUnavailable(format!(
                "surface {}x{} exceeds {MAX_CAPTURE_SIZE}px",
                self.width, self.height
            )));
        }
        if self.meshes.parts.is_empty() {
            return Err(CaptureError::RendererUnavailable("no geometry loaded".into()));
        }
        let image = self.renderer.render(
            self.meshes,
            self.store,
            self.camera,
            self.pose,
            self.width,
            self.height,
        );
        EncodedImage::from_rgba(&image)
    }
}

#[cfg(test)]
mod tests {
    use shared::ModelDescription;

    use super::*;

    fn scene() -> (ModelMeshes, CustomizationStore, ArcBallCamera) {
        let model = ModelDescription::sneaker();
        (
            ModelMeshes::build(&model),
            CustomizationStore::new(&model).unwrap(),
            ArcBallCamera::new(3.25, 45.0),
        )
    }

    fn is_red(p: &Rgba<u8>) -> bool {
        p.0[0] > 150 && p.0[1] < 30 && p.0[2] < 30
    }

    #[test]
    fn test_shade_keeps_ambient_floor() {
        let r = SceneRenderer::new([255, 255, 255], 0.7);
        let lit = r.shade([200, 100, 0], Vec3::new(10.0, 15.0, 10.0));
        let dark = r.shade([200, 100, 0], Vec3::new(-10.0, -15.0, -10.0));
        assert_eq!(lit, [200, 100, 0]);
        assert_eq!(dark, [140, 70, 0]);
    }

    #[test]
    fn test_render_uses_live_colors() {
        let (meshes, mut store, camera) = scene();
        let renderer = SceneRenderer::default();

        let before = renderer.render(&meshes, &store, &camera, Mat4::IDENTITY, 96, 96);
        assert!(!before.pixels().any(is_red));

        store.set_color("sole", "#ff0000").unwrap();
        let after = renderer.render(&meshes, &store, &camera, Mat4::IDENTITY, 96, 96);
        assert!(after.pixels().any(is_red));
    }

    #[test]
    fn test_render_background_at_corners() {
        let (meshes, store, camera) = scene();
        let renderer = SceneRenderer::new([10, 20, 30], 0.7);
        let img = renderer.render(&meshes, &store, &camera, Mat4::IDENTITY, 64, 64);
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(img.get_pixel(63, 63).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_front_part_occludes() {
        let (meshes, mut store, camera) = scene();
        // Stripes wrap the middle of the upper, in front of the mesh
        store.set_color("mesh", "#0000ff").unwrap();
        store.set_color("stripes", "#ff0000").unwrap();
        let renderer = SceneRenderer::default();
        let img = renderer.render(&meshes, &store, &camera, Mat4::IDENTITY, 128, 128);
        let center = img.get_pixel(64, 66);
        assert!(is_red(center), "{center:?}");
    }

    #[test]
    fn test_triangles_sorted_back_to_front() {
        let (meshes, store, camera) = scene();
        let rect = Rect::from_min_size(Pos2::ZERO, egui::vec2(200.0, 200.0));
        let tris = SceneRenderer::default().triangles(&meshes, &store, &camera, Mat4::IDENTITY, rect);
        assert_eq!(tris.len(), meshes.triangle_count());
        assert!(tris.windows(2).all(|w| w[0].depth >= w[1].depth));
    }

    #[test]
    fn test_frame_source_rejects_empty_surface() {
        let (meshes, store, camera) = scene();
        let renderer = SceneRenderer::default();
        let mut source = SceneFrameSource {
            renderer: &renderer,
            meshes: &meshes,
            store: &store,
            camera: &camera,
            pose: Mat4::IDENTITY,
            width: 0,
            height: 10,
        };
        assert!(matches!(
            source.encode_frame(),
            Err(CaptureError::RendererUnavailable(_))
        ));
        source.width = 32;
        assert_eq!(source.encode_frame().unwrap().width, 32);
    }

    #[test]
    fn test_frame_source_rejects_oversized_surface() {
        let (meshes, store, camera) = scene();
        let renderer = SceneRenderer::default();
        let mut source = SceneFrameSource {
            renderer: &renderer,
            meshes: &meshes,
            store: &store,
            camera: &camera,
            pose: Mat4::IDENTITY,
            width: 32,
            height: MAX_CAPTURE_SIZE + 1,
        };
        assert!(matches!(
            source.encode_frame(),
            Err(CaptureError::RendererUnavailable(_))
        ));
    }
}
