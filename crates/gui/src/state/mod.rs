pub mod customization;
pub mod observers;
pub mod settings;

use std::time::Instant;

use glam::Mat4;
use shared::{ModelDescription, ModelError, PartId};

use crate::capture::{CaptureError, CaptureReport, CaptureSequencer, ImageSink};
use crate::viewport::camera::ArcBallCamera;
use crate::viewport::hit_test::{HitTestRouter, RouterError};
use crate::viewport::model::{float_pose, ModelMeshes};
use crate::viewport::pointer::PointerTracker;
use crate::viewport::render::{SceneFrameSource, SceneRenderer};

pub use customization::{CustomizationStore, StoreChange, StoreError, StoreSnapshot};
pub use settings::AppSettings;

/// Everything one customization session owns.
///
/// The store is created here and lent to the router, pointer tracker and
/// renderer on each call; nothing else holds on to it.
pub struct AppState {
    pub model: ModelDescription,
    pub store: CustomizationStore,
    pub router: HitTestRouter,
    pub pointer: PointerTracker,
    pub camera: ArcBallCamera,
    pub meshes: ModelMeshes,
    pub renderer: SceneRenderer,
    pub capture: CaptureSequencer,
    pub settings: AppSettings,
    /// Outcome of the most recent capture, for the status line
    pub last_capture: Option<Result<CaptureReport, String>>,
}

impl AppState {
    pub fn new(model: ModelDescription, settings: AppSettings) -> Result<Self, ModelError> {
        let store = CustomizationStore::new(&model)?;
        let meshes = ModelMeshes::build(&model);
        tracing::info!(
            "Loaded model '{}': {} parts, {} triangles",
            model.name,
            model.parts.len(),
            meshes.triangle_count()
        );

        Ok(Self {
            store,
            router: HitTestRouter::new(),
            pointer: PointerTracker::new(),
            camera: ArcBallCamera::new(settings.camera.distance, settings.camera.fov_degrees),
            meshes,
            renderer: SceneRenderer::from_settings(&settings.viewport),
            capture: CaptureSequencer::new(settings.capture.settle_policy()),
            settings,
            last_capture: None,
            model,
        })
    }

    /// Model placement `elapsed` seconds into the session
    pub fn model_pose(&self, elapsed: f32) -> Mat4 {
        if self.settings.viewport.float_animation {
            float_pose(elapsed)
        } else {
            Mat4::IDENTITY
        }
    }

    pub fn pointer_moved(&mut self, hits: &[PartId]) -> Result<(), RouterError> {
        self.pointer
            .pointer_moved(hits, &mut self.router, &mut self.store)
    }

    pub fn pointer_down(&mut self, hits: &[PartId]) -> Result<(), RouterError> {
        self.pointer
            .pointer_down(hits, &mut self.router, &mut self.store)
    }

    pub fn pointer_left(&mut self) -> Result<(), RouterError> {
        self.pointer.pointer_left(&mut self.router, &mut self.store)
    }

    pub fn request_capture(&mut self, now: Instant) -> Result<(), CaptureError> {
        self.capture.request_capture(now, &mut self.camera)
    }

    /// Advance a pending capture; renders from the live store and camera
    pub fn poll_capture(
        &mut self,
        now: Instant,
        pose: Mat4,
        sink: &mut impl ImageSink,
    ) -> Option<Result<CaptureReport, CaptureError>> {
        let mut frames = SceneFrameSource {
            renderer: &self.renderer,
            meshes: &self.meshes,
            store: &self.store,
            camera: &self.camera,
            pose,
            width: self.settings.capture.width,
            height: self.settings.capture.height,
        };
        let result = self.capture.poll(now, &self.camera, &mut frames, sink)?;
        self.last_capture = Some(
            result
                .as_ref()
                .map(Clone::clone)
                .map_err(ToString::to_string),
        );
        Some(result)
    }
}
