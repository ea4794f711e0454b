//! Snapshot export from a canonical camera pose.
//!
//! A capture walks `Idle -> ResettingCamera -> AwaitingStableFrame ->
//! Capturing -> Idle`. The sequencer is polled once per rendered frame and
//! never blocks: pointer input and color edits keep flowing while the
//! camera glides home, and whatever the store holds when the frame is
//! encoded ends up in the image.
//!
//! The renderer gives no completion signal for the camera reset in
//! fixed-delay mode, so the default policy waits a fixed grace period
//! that must exceed the camera's settle time. `UntilSettled` instead asks
//! the camera and only falls back to the timeout.

mod sink;

use std::io::Cursor;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use base64::Engine as _;
use image::RgbaImage;

use crate::state::observers::{Observers, Subscription};

pub use sink::{MemorySink, PngFileSink};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("a capture is already in progress")]
    InFlight,
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
    #[error("failed to save image to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Camera handle the sequencer resets before capturing
pub trait CameraRig {
    /// Start returning to the canonical pose; may animate over many frames
    fn reset(&mut self);

    /// Whether the reset animation has finished. Cameras that cannot tell
    /// report `true`, which leaves the decision to the settle timeout.
    fn is_settled(&self) -> bool {
        true
    }
}

/// Produces an encoded image of the current frame
pub trait FrameSource {
    fn encode_frame(&mut self) -> Result<EncodedImage, CaptureError>;
}

/// Destination for finished captures
pub trait ImageSink {
    fn save(&mut self, image: &EncodedImage) -> Result<PathBuf, CaptureError>;
}

/// PNG-encoded frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl EncodedImage {
    pub fn from_rgba(image: &RgbaImage) -> Result<Self, CaptureError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            png,
        })
    }

    /// `data:image/png;base64,...`
    pub fn data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }

    pub fn decode(&self) -> Result<RgbaImage, CaptureError> {
        image::load_from_memory_with_format(&self.png, image::ImageFormat::Png)
            .map(|img| img.to_rgba8())
            .map_err(|e| CaptureError::Encode(e.to_string()))
    }
}

/// How long to wait after the camera reset before reading pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlePolicy {
    FixedDelay(Duration),
    /// Proceed when the camera reports settled, or after `max_wait`
    UntilSettled { max_wait: Duration },
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self::FixedDelay(Duration::from_millis(1500))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    ResettingCamera,
    AwaitingStableFrame,
    Capturing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: CapturePhase,
    pub to: CapturePhase,
}

/// Outcome of a finished capture
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureReport {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

pub struct CaptureSequencer {
    phase: CapturePhase,
    reset_at: Option<Instant>,
    policy: SettlePolicy,
    /// Policy captured at request time; settings edits mid-capture don't apply
    active_policy: SettlePolicy,
    transitions: Observers<PhaseTransition>,
}

impl CaptureSequencer {
    pub fn new(policy: SettlePolicy) -> Self {
        Self {
            phase: CapturePhase::Idle,
            reset_at: None,
            policy,
            active_policy: policy,
            transitions: Observers::new(),
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == CapturePhase::Idle
    }

    pub fn policy(&self) -> SettlePolicy {
        self.policy
    }

    /// Takes effect from the next capture request
    pub fn set_policy(&mut self, policy: SettlePolicy) {
        self.policy = policy;
    }

    pub fn on_transition(&self, callback: impl FnMut(&PhaseTransition) + 'static) -> Subscription {
        self.transitions.subscribe(callback)
    }

    /// Start a capture: reset the camera now and begin the settle wait.
    ///
    /// Only one capture runs at a time; requests made while one is in
    /// progress are rejected with [`CaptureError::InFlight`] and change
    /// nothing.
    pub fn request_capture(
        &mut self,
        now: Instant,
        camera: &mut impl CameraRig,
    ) -> Result<(), CaptureError> {
        if !self.is_idle() {
            tracing::debug!("Capture request ignored: {:?} in progress", self.phase);
            return Err(CaptureError::InFlight);
        }

        camera.reset();
        self.reset_at = Some(now);
        self.active_policy = self.policy;
        self.transition(CapturePhase::ResettingCamera);
        tracing::info!("Capture requested, waiting for camera ({:?})", self.policy);
        Ok(())
    }

    /// Advance the capture by one frame.
    ///
    /// Returns `Some` exactly once per capture, on the poll that encoded
    /// and saved the frame (or failed to). The sequencer is `Idle` again
    /// whenever `Some` is returned.
    pub fn poll(
        &mut self,
        now: Instant,
        camera: &impl CameraRig,
        frames: &mut impl FrameSource,
        sink: &mut impl ImageSink,
    ) -> Option<Result<CaptureReport, CaptureError>> {
        match self.phase {
            CapturePhase::Idle | CapturePhase::Capturing => None,
            CapturePhase::ResettingCamera => {
                let started = self.reset_at.unwrap_or(now);
                let elapsed = now.saturating_duration_since(started);
                let ready = match self.active_policy {
                    SettlePolicy::FixedDelay(delay) => elapsed >= delay,
                    SettlePolicy::UntilSettled { max_wait } => {
                        camera.is_settled() || elapsed >= max_wait
                    }
                };
                if ready {
                    if !camera.is_settled() {
                        tracing::warn!(
                            "Camera still moving after {} ms; capturing anyway",
                            elapsed.as_millis()
                        );
                    }
                    self.transition(CapturePhase::AwaitingStableFrame);
                }
                None
            }
            // One more frame has been presented from the settled pose
            CapturePhase::AwaitingStableFrame => {
                self.transition(CapturePhase::Capturing);
                let result = Self::capture(frames, sink);
                self.reset_at = None;
                self.transition(CapturePhase::Idle);

                match &result {
                    Ok(report) => tracing::info!(
                        "Snapshot saved to {} ({}x{})",
                        report.path.display(),
                        report.width,
                        report.height
                    ),
                    Err(e) => tracing::error!("Snapshot failed: {e}"),
                }
                Some(result)
            }
        }
    }

    fn capture(
        frames: &mut impl FrameSource,
        sink: &mut impl ImageSink,
    ) -> Result<CaptureReport, CaptureError> {
        let image = frames.encode_frame()?;
        let path = sink.save(&image)?;
        Ok(CaptureReport {
            path,
            width: image.width,
            height: image.height,
        })
    }

    fn transition(&mut self, to: CapturePhase) {
        let from = std::mem::replace(&mut self.phase, to);
        tracing::debug!("Capture {from:?} -> {to:?}");
        self.transitions.notify(&PhaseTransition { from, to });
    }
}

impl Default for CaptureSequencer {
    fn default() -> Self {
        Self::new(SettlePolicy::default())
    }
}
