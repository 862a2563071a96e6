//! Camera framing: pure math that keeps a whole avatar in view. Given the
//! avatar's bounds this derives a uniform normalization scale toward a
//! reference height, then the minimal camera distance at which the largest
//! dimension fits the vertical field of view, padded by a margin.

use glam::Vec3;
use vrm_formats::Aabb;

/// Reference avatar height in world units; models are rescaled toward this.
pub const TARGET_HEIGHT: f32 = 1.7;
pub const SCALE_MIN: f32 = 0.2;
pub const SCALE_MAX: f32 = 3.0;
/// Vertical field of view used by the room camera, in radians.
pub const DEFAULT_FOV_Y: f32 = 42.0 * std::f32::consts::PI / 180.0;
pub const DEFAULT_MARGIN: f32 = 1.32;

/// Fraction of the avatar height the eye is lifted above the box center, so
/// the view is not a straight-on eye-level shot.
const VERTICAL_LIFT: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    /// Uniform scale applied to the avatar before framing.
    pub scale: f32,
    /// Camera position.
    pub eye: Vec3,
    /// Look target: the center of the scaled bounds.
    pub target: Vec3,
    /// Camera distance along the forward axis.
    pub distance: f32,
}

/// Uniform scale that brings the bounds height toward [`TARGET_HEIGHT`],
/// clamped so degenerate tiny or huge models stay usable. A zero-height box
/// keeps its original size.
pub fn normalization_scale(bounds: &Aabb) -> f32 {
    let height = bounds.size().y;
    if height > 0.0 {
        (TARGET_HEIGHT / height).clamp(SCALE_MIN, SCALE_MAX)
    } else {
        1.0
    }
}

pub fn fit_avatar(bounds: &Aabb, fov_y: f32, margin: f32) -> Framing {
    let scale = normalization_scale(bounds);
    let scaled = Aabb {
        min: bounds.min * scale,
        max: bounds.max * scale,
    };
    let size = scaled.size();
    let center = scaled.center();

    let max_dim = size.x.max(size.y).max(size.z);
    let max_dim = if max_dim > 0.0 { max_dim } else { 1.0 };
    let distance = (max_dim / (fov_y * 0.5).tan()) * margin;

    Framing {
        scale,
        eye: Vec3::new(center.x, center.y + size.y * VERTICAL_LIFT, center.z + distance),
        target: center,
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(height: f32) -> Aabb {
        Aabb {
            min: Vec3::new(-0.3, 0.0, -0.2),
            max: Vec3::new(0.3, height, 0.2),
        }
    }

    #[test]
    fn scale_stays_inside_clamp_range() {
        for height in [0.01, 0.1, 0.5, 1.7, 2.0, 10.0, 500.0] {
            let scale = normalization_scale(&bounds(height));
            assert!(
                (SCALE_MIN..=SCALE_MAX).contains(&scale),
                "height {height} gave scale {scale}"
            );
        }
    }

    #[test]
    fn two_unit_avatar_scales_to_085() {
        let framing = fit_avatar(&bounds(2.0), DEFAULT_FOV_Y, DEFAULT_MARGIN);
        assert!((framing.scale - 0.85).abs() < 1e-6);
    }

    #[test]
    fn tiny_and_huge_models_hit_the_clamps() {
        assert_eq!(normalization_scale(&bounds(0.1)), SCALE_MAX);
        assert_eq!(normalization_scale(&bounds(20.0)), SCALE_MIN);
    }

    #[test]
    fn zero_height_box_keeps_scale_and_finite_distance() {
        let flat = Aabb {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        };
        let framing = fit_avatar(&flat, DEFAULT_FOV_Y, DEFAULT_MARGIN);
        assert_eq!(framing.scale, 1.0);
        assert!(framing.distance.is_finite());
        assert!(framing.distance > 0.0);
        assert!(framing.eye.is_finite());
    }

    #[test]
    fn eye_sits_behind_and_above_the_target() {
        let framing = fit_avatar(&bounds(1.7), DEFAULT_FOV_Y, DEFAULT_MARGIN);
        assert!(framing.eye.z > framing.target.z);
        assert!(framing.eye.y > framing.target.y);
        assert!((framing.eye.z - framing.target.z - framing.distance).abs() < 1e-5);
    }

    #[test]
    fn larger_margin_pushes_the_camera_back() {
        let near = fit_avatar(&bounds(1.7), DEFAULT_FOV_Y, 1.1);
        let far = fit_avatar(&bounds(1.7), DEFAULT_FOV_Y, 1.5);
        assert!(far.distance > near.distance);
    }
}
