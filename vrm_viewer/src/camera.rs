//! Orbit camera rig and surface sizing rules. The rig eases yaw, pitch,
//! distance, and target toward goal values every frame, which gives the same
//! damped feel as the interactive controls the original rooms used. Surface
//! sizing caps the device pixel ratio and floors the height so narrow
//! windows keep a sane aspect ratio.

use glam::{Mat4, Vec3};
use winit::dpi::PhysicalSize;

use crate::framing::Framing;

pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 1200.0;

/// Device pixel ratio cap; high-density displays render at most 1.5x.
pub const MAX_PIXEL_RATIO: f64 = 1.5;
/// Smallest surface height the viewer will configure.
pub const MIN_SURFACE_HEIGHT: u32 = 320;

const PITCH_LIMIT: f32 = 1.45;
const DISTANCE_MIN: f32 = 0.6;
const DISTANCE_MAX: f32 = 60.0;
/// Exponential damping rate; roughly the OrbitControls damping feel.
const DAMPING_RATE: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct OrbitRig {
    pub fov_y: f32,
    yaw: f32,
    pitch: f32,
    distance: f32,
    target: Vec3,
    yaw_goal: f32,
    pitch_goal: f32,
    distance_goal: f32,
    target_goal: Vec3,
}

impl OrbitRig {
    pub fn new(fov_y: f32) -> Self {
        // The default perch the original rooms boot with.
        let target = Vec3::new(0.0, 1.5, 0.0);
        Self {
            fov_y,
            yaw: 0.0,
            pitch: 0.05,
            distance: 3.8,
            target,
            yaw_goal: 0.0,
            pitch_goal: 0.05,
            distance_goal: 3.8,
            target_goal: target,
        }
    }

    /// Snap the goals onto a framing result. The vertical lift in the
    /// framing's eye becomes a gentle downward pitch.
    pub fn apply_framing(&mut self, framing: &Framing) {
        self.target_goal = framing.target;
        self.distance_goal = framing.distance.clamp(DISTANCE_MIN, DISTANCE_MAX);
        let lift = framing.eye.y - framing.target.y;
        self.pitch_goal = (lift / framing.distance.max(1e-3)).atan();
    }

    pub fn orbit(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw_goal += yaw_delta;
        self.pitch_goal = (self.pitch_goal + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.distance_goal = (self.distance_goal * factor).clamp(DISTANCE_MIN, DISTANCE_MAX);
    }

    /// Advance the damped state toward the goals.
    pub fn update(&mut self, dt: f32) {
        let blend = 1.0 - (-DAMPING_RATE * dt.max(0.0)).exp();
        self.yaw += (self.yaw_goal - self.yaw) * blend;
        self.pitch += (self.pitch_goal - self.pitch) * blend;
        self.distance += (self.distance_goal - self.distance) * blend;
        self.target += (self.target_goal - self.target) * blend;
    }

    pub fn eye(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        ) * self.distance;
        self.target + offset
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), NEAR_PLANE, FAR_PLANE)
            * self.view_matrix()
    }
}

/// Render-surface dimensions for a window: physical size scaled down when
/// the display's pixel ratio exceeds [`MAX_PIXEL_RATIO`], height floored at
/// [`MIN_SURFACE_HEIGHT`].
pub fn capped_surface_size(physical: PhysicalSize<u32>, scale_factor: f64) -> PhysicalSize<u32> {
    let ratio = if scale_factor > MAX_PIXEL_RATIO && scale_factor > 0.0 {
        MAX_PIXEL_RATIO / scale_factor
    } else {
        1.0
    };
    let width = ((physical.width as f64 * ratio) as u32).max(1);
    let height = ((physical.height as f64 * ratio) as u32).max(MIN_SURFACE_HEIGHT);
    PhysicalSize::new(width, height)
}

pub fn aspect_ratio(size: PhysicalSize<u32>) -> f32 {
    size.width as f32 / size.height.max(1) as f32
}
