//! Level Entities
//!
//! Platforms and enemies owned by the level container, and the tags that give
//! their bodies meaning to the collision router.

use serde::{Serialize, Deserialize};

use crate::core::math::{Axis, Vec3};
use crate::physics::BodyHandle;
use crate::render::VisualHandle;

/// Index of a platform within its level, in descriptor order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// What touching a body means to the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyTag {
    /// Landing surface
    Ground,
    /// Landing surface that completes the level when close enough
    Goal,
    /// Kills the player on contact
    Hazard,
    /// Landing surface that wakes the enemy linked to this platform
    EnemyTrigger(EntityId),
    /// Tracked but inert
    None,
}

impl BodyTag {
    /// Whether the player can stand on this body.
    #[inline]
    pub fn is_surface(self) -> bool {
        !matches!(self, BodyTag::Hazard | BodyTag::None)
    }
}

/// Sinusoidal kinematic motion along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Axis of travel
    pub axis: Axis,
    /// Peak offset from the origin
    pub amplitude: f32,
    /// Angular speed (rad/s)
    pub speed: f32,
}

impl Motion {
    /// Offset from the origin after `elapsed` seconds.
    #[inline]
    pub fn offset(&self, elapsed: f32) -> Vec3 {
        self.axis.unit() * (self.amplitude * (elapsed * self.speed).sin())
    }
}

/// A platform: physics body, visual and what it means.
#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
    /// Position in the level
    pub id: EntityId,
    /// Physics body
    pub body: BodyHandle,
    /// Visual
    pub visual: VisualHandle,
    /// Rest position
    pub origin: Vec3,
    /// Full size
    pub size: Vec3,
    /// Router tag
    pub tag: BodyTag,
    /// Kinematic motion, if any
    pub motion: Option<Motion>,
}

impl Platform {
    /// Position after `elapsed` seconds of level time.
    pub fn position_at(&self, elapsed: f32) -> Vec3 {
        match self.motion {
            Some(motion) => self.origin + motion.offset(elapsed),
            None => self.origin,
        }
    }

    /// Whether this platform moves.
    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }
}

/// An enemy that chases the player once its trigger platform is touched.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyAgent {
    /// Platform that wakes it
    pub trigger: EntityId,
    /// Physics body (only simulated while active)
    pub body: BodyHandle,
    /// Visual (only attached while active)
    pub visual: VisualHandle,
    /// Where it appears on activation
    pub spawn: Vec3,
    /// Whether it is hunting
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_offset() {
        let motion = Motion { axis: Axis::Y, amplitude: 2.0, speed: 1.0 };
        assert_eq!(motion.offset(0.0), Vec3::ZERO);
        let peak = motion.offset(std::f32::consts::FRAC_PI_2);
        assert!((peak.y - 2.0).abs() < 1e-6);
        assert_eq!(peak.x, 0.0);
        assert_eq!(peak.z, 0.0);
    }

    #[test]
    fn test_zero_amplitude_stays_put() {
        let motion = Motion { axis: Axis::X, amplitude: 0.0, speed: 3.0 };
        assert_eq!(motion.offset(1.7), Vec3::ZERO);
    }

    #[test]
    fn test_surface_tags() {
        assert!(BodyTag::Ground.is_surface());
        assert!(BodyTag::Goal.is_surface());
        assert!(BodyTag::EnemyTrigger(EntityId(3)).is_surface());
        assert!(!BodyTag::Hazard.is_surface());
        assert!(!BodyTag::None.is_surface());
    }
}
