use glam::{Mat4, Vec3, Vec4};

use super::picking::Ray;
use crate::capture::CameraRig;

/// Approach rate of the reset glide (1/s); higher settles faster
const RESET_RATE: f32 = 7.0;
/// Remaining offset below which the glide snaps to the home pose
const SETTLE_EPSILON: f32 = 1e-3;
/// Pitch limit keeps the camera above the floor plane, like an orbit control
/// with a polar limit of 90 degrees
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.05;
const MIN_PITCH: f32 = 0.0;

/// Orbit pose around a target point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    /// Horizontal rotation angle (radians)
    pub yaw: f32,
    /// Vertical rotation angle (radians)
    pub pitch: f32,
    /// Distance from target
    pub distance: f32,
    pub target: Vec3,
}

impl CameraPose {
    pub fn front(distance: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance,
            target: Vec3::ZERO,
        }
    }
}

/// Arc-ball camera with an animated return to its home pose
pub struct ArcBallCamera {
    pub pose: CameraPose,
    home: CameraPose,
    /// Vertical field of view (radians)
    pub fov: f32,
    resetting: bool,
}

impl ArcBallCamera {
    pub fn new(distance: f32, fov_degrees: f32) -> Self {
        let home = CameraPose::front(distance);
        Self {
            pose: home,
            home,
            fov: fov_degrees.to_radians(),
            resetting: false,
        }
    }

    pub fn home(&self) -> CameraPose {
        self.home
    }

    /// Change the home pose distance (window resized across the narrow breakpoint)
    pub fn set_home_distance(&mut self, distance: f32) {
        if (self.home.distance - distance).abs() > f32::EPSILON {
            self.home.distance = distance;
            if !self.resetting {
                self.pose.distance = distance;
            }
        }
    }

    /// Drag rotation in degrees; ignored while gliding home
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if self.resetting {
            return;
        }
        self.pose.yaw += dx.to_radians();
        self.pose.pitch = (self.pose.pitch + dy.to_radians()).clamp(MIN_PITCH, MAX_PITCH);
    }

    /// Start gliding back to the home pose
    pub fn start_reset(&mut self) {
        // Unwind full turns so the glide takes the short way round
        let turns = ((self.pose.yaw - self.home.yaw) / std::f32::consts::TAU).round();
        self.pose.yaw -= turns * std::f32::consts::TAU;
        self.resetting = true;
    }

    pub fn is_resetting(&self) -> bool {
        self.resetting
    }

    /// Advance the reset glide by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if !self.resetting {
            return;
        }
        let k = 1.0 - (-dt * RESET_RATE).exp();
        let p = &mut self.pose;
        let h = &self.home;
        p.yaw += (h.yaw - p.yaw) * k;
        p.pitch += (h.pitch - p.pitch) * k;
        p.distance += (h.distance - p.distance) * k;
        p.target += (h.target - p.target) * k;

        let remaining = (h.yaw - p.yaw)
            .abs()
            .max((h.pitch - p.pitch).abs())
            .max((h.distance - p.distance).abs())
            .max((h.target - p.target).length());
        if remaining < SETTLE_EPSILON {
            self.pose = self.home;
            self.resetting = false;
            tracing::debug!("Camera settled at home pose");
        }
    }

    /// Camera position in world space
    pub fn eye_position(&self) -> Vec3 {
        let CameraPose {
            yaw,
            pitch,
            distance,
            target,
        } = self.pose;
        target
            + Vec3::new(
                distance * pitch.cos() * yaw.sin(),
                distance * pitch.sin(),
                distance * pitch.cos() * yaw.cos(),
            )
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.pose.target, Vec3::Y)
    }

    /// Projection matrix (camera -> clip)
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, aspect, 0.1, 200.0)
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Project a 3D point to 2D screen coords; `z` is NDC depth
    pub fn project(&self, point: Vec3, rect: egui::Rect) -> Option<Vec3> {
        let aspect = rect.width() / rect.height();
        let p = self.view_projection(aspect) * point.extend(1.0);
        if p.w <= 0.0 {
            return None;
        }
        let ndc = p.truncate() / p.w;
        Some(Vec3::new(
            rect.center().x + ndc.x * rect.width() * 0.5,
            rect.center().y - ndc.y * rect.height() * 0.5,
            ndc.z,
        ))
    }

    /// Cast a ray from a screen position into the 3D scene
    pub fn screen_ray(&self, screen_pos: egui::Pos2, rect: egui::Rect) -> Ray {
        let aspect = rect.width() / rect.height();

        // Screen → NDC
        let ndc_x = (screen_pos.x - rect.center().x) / (rect.width() * 0.5);
        let ndc_y = -(screen_pos.y - rect.center().y) / (rect.height() * 0.5);

        let vp_inv = self.view_projection(aspect).inverse();

        let near_world = vp_inv * Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
        let far_world = vp_inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near = near_world.truncate() / near_world.w;
        let far = far_world.truncate() / far_world.w;

        Ray {
            origin: self.eye_position(),
            direction: (far - near).normalize_or_zero(),
        }
    }
}

impl CameraRig for ArcBallCamera {
    fn reset(&mut self) {
        self.start_reset();
    }

    fn is_settled(&self) -> bool {
        !self.resetting
    }
}
