//! Math Helpers
//!
//! Thin helpers over `glam` used by the controller, the level container
//! and the completion check. The world is Y-up; "horizontal" means the XZ plane.

use serde::{Serialize, Deserialize};

pub use glam::{Quat, Vec2, Vec3};

/// World axis used by kinematic platform motion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Left/right
    X,
    /// Up/down
    Y,
    /// Forward/backward
    Z,
}

impl Axis {
    /// Unit vector along this axis.
    #[inline]
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Parse `"x"`, `"y"` or `"z"` (case-insensitive).
    pub fn parse(s: &str) -> Option<Axis> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Distance between two points projected onto the XZ plane.
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x, a.z).distance(Vec2::new(b.x, b.z))
}

/// Absolute height difference between two points.
#[inline]
pub fn vertical_distance(a: Vec3, b: Vec3) -> f32 {
    (a.y - b.y).abs()
}

/// Move `value` toward zero by `step` without crossing it.
///
/// Returns exactly `0.0` once `|value| - step <= 0`.
#[inline]
pub fn approach_zero(value: f32, step: f32) -> f32 {
    if value == 0.0 {
        return 0.0;
    }
    if value.abs() - step > 0.0 {
        value - value.signum() * step
    } else {
        0.0
    }
}

/// Clamp the XZ magnitude of a velocity to `max`, leaving Y untouched.
#[inline]
pub fn clamp_horizontal(velocity: Vec3, max: f32) -> Vec3 {
    let flat = Vec2::new(velocity.x, velocity.z);
    let len = flat.length();
    if len > max && len > 0.0 {
        let scaled = flat * (max / len);
        Vec3::new(scaled.x, velocity.y, scaled.y)
    } else {
        velocity
    }
}

/// Format seconds as `MM:SS` (whole seconds, minutes not capped).
pub fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
