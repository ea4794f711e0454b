//! Headless harness for driving a customization session from tests and
//! the JSON command protocol.
//!
//! Time is simulated: the harness keeps its own clock and every
//! [`TestHarness::advance`] steps the camera and polls the capture
//! sequencer exactly once.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use shared::{Color, ModelDescription, ModelError, PartId};

use crate::capture::{
    CaptureError, CapturePhase, CaptureReport, EncodedImage, ImageSink, MemorySink, PngFileSink,
};
use crate::cursor::{CursorFeedbackController, CursorHost, CursorStyle, RecordingCursorHost};
use crate::state::customization::{StoreError, StoreSnapshot};
use crate::state::settings::AppSettings;
use crate::state::AppState;
use crate::viewport::hit_test::RouterError;

/// Where finished captures go
enum HarnessSink {
    Memory(MemorySink),
    Files(PngFileSink),
}

impl ImageSink for HarnessSink {
    fn save(&mut self, image: &EncodedImage) -> Result<PathBuf, CaptureError> {
        match self {
            Self::Memory(sink) => sink.save(image),
            Self::Files(sink) => sink.save(image),
        }
    }
}

/// Headless session: state, cursor controller, clock and capture sink
pub struct TestHarness {
    pub state: AppState,
    pub cursor: CursorFeedbackController<RecordingCursorHost>,
    start: Instant,
    now: Instant,
    sink: HarnessSink,
    captures: Vec<Result<CaptureReport, String>>,
}

impl TestHarness {
    /// Sneaker model, default settings, captures kept in memory.
    pub fn new() -> Self {
        Self::with_parts(ModelDescription::sneaker(), AppSettings::default())
            .unwrap_or_else(|e| unreachable!("built-in model is valid: {e}"))
    }

    pub fn with_parts(model: ModelDescription, settings: AppSettings) -> Result<Self, ModelError> {
        let state = AppState::new(model, settings)?;
        let cursor = CursorFeedbackController::new(
            RecordingCursorHost::default(),
            &state.router,
            &state.store,
        );
        let now = Instant::now();
        Ok(Self {
            state,
            cursor,
            start: now,
            now,
            sink: HarnessSink::Memory(MemorySink::default()),
            captures: Vec::new(),
        })
    }

    /// Write captures as PNG files into `dir` instead of memory
    pub fn capture_to_dir(&mut self, dir: &Path) {
        let file_name = self.state.settings.capture.file_name.clone();
        self.sink = HarnessSink::Files(PngFileSink::new(dir, file_name));
    }

    // ── Store ─────────────────────────────────────────────────

    pub fn set_color(&mut self, part: &str, color: &str) -> Result<(), StoreError> {
        self.state.store.set_color(part, color)
    }

    pub fn get_color(&self, part: &str) -> Result<Color, StoreError> {
        self.state.store.get_color(part).cloned()
    }

    pub fn select(&mut self, part: Option<&str>) -> Result<(), StoreError> {
        self.state.store.set_current_part(part)
    }

    pub fn current_part(&self) -> Option<&str> {
        self.state.store.current_part().map(PartId::as_str)
    }

    pub fn reset_colors(&mut self) {
        self.state.store.reset_colors();
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.store.snapshot()
    }

    // ── Pointer ───────────────────────────────────────────────

    /// Move the pointer over `hits` (nearest first); empty means over nothing
    pub fn pointer_move(&mut self, hits: &[&str]) -> Result<(), RouterError> {
        self.state.pointer_moved(&part_ids(hits))
    }

    pub fn pointer_down(&mut self, hits: &[&str]) -> Result<(), RouterError> {
        self.state.pointer_down(&part_ids(hits))
    }

    pub fn pointer_leave(&mut self) -> Result<(), RouterError> {
        self.state.pointer_left()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.state.router.hovered().map(PartId::as_str)
    }

    pub fn cursor_style(&self) -> CursorStyle {
        self.cursor.with_host(|host| host.current())
    }

    // ── Capture and time ──────────────────────────────────────

    pub fn request_capture(&mut self) -> Result<(), CaptureError> {
        self.state.request_capture(self.now)
    }

    pub fn capture_phase(&self) -> CapturePhase {
        self.state.capture.phase()
    }

    /// Simulated time since the harness was created
    pub fn elapsed(&self) -> Duration {
        self.now - self.start
    }

    /// Advance the clock by `dt` and run one frame.
    ///
    /// Returns the capture outcome if this frame finished one.
    pub fn advance(&mut self, dt: Duration) -> Option<Result<CaptureReport, CaptureError>> {
        self.now += dt;
        self.state.camera.step(dt.as_secs_f32());

        let pose = self.state.model_pose(self.elapsed().as_secs_f32());
        let result = self.state.poll_capture(self.now, pose, &mut self.sink)?;
        self.captures.push(
            result
                .as_ref()
                .map(Clone::clone)
                .map_err(ToString::to_string),
        );
        Some(result)
    }

    /// Advance in 16 ms frames until the sequencer is idle or `limit` passes
    pub fn run_capture(&mut self, limit: Duration) -> Option<Result<CaptureReport, CaptureError>> {
        let frame = Duration::from_millis(16);
        let deadline = self.now + limit;
        while self.now < deadline {
            if let Some(result) = self.advance(frame) {
                return Some(result);
            }
            if self.state.capture.is_idle() {
                return None;
            }
        }
        None
    }

    /// Outcomes of every finished capture, oldest first
    pub fn captures(&self) -> &[Result<CaptureReport, String>] {
        &self.captures
    }

    /// Most recent image kept by the in-memory sink
    pub fn last_image(&self) -> Option<&EncodedImage> {
        match &self.sink {
            HarnessSink::Memory(sink) => sink.last(),
            HarnessSink::Files(_) => None,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn part_ids(names: &[&str]) -> Vec<PartId> {
    names.iter().map(|n| PartId::new(*n)).collect()
}
