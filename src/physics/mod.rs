//! Physics Engine Seam
//!
//! The game logic never integrates bodies itself. It talks to whatever engine
//! implements [`PhysicsWorld`]: create a body, add it to or remove it from the
//! simulation, step, and drain the contacts reported by that step.
//!
//! Collision groups here are purely a broad-phase filter. What a body *means*
//! to the game (ground, goal, hazard...) lives in the level container's tag
//! map, keyed by [`BodyHandle`].

pub mod arcade;

use serde::{Serialize, Deserialize};

use crate::core::math::{Quat, Vec3};

pub use arcade::ArcadeWorld;

/// Opaque identity of a body owned by a physics world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// How the engine treats a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Immovable solid.
    Static,
    /// Moved by game logic (velocity or teleport), ignores gravity and contacts.
    Kinematic,
    /// Fully simulated: gravity, forces, contact resolution.
    Dynamic,
}

/// Collision shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Box given by half extents.
    Box {
        /// Half size along each axis
        half_extents: Vec3,
    },
    /// Sphere given by radius.
    Sphere {
        /// Radius
        radius: f32,
    },
}

impl Shape {
    /// Box from full width, height and depth.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Shape::Box {
            half_extents: Vec3::new(width, height, depth) * 0.5,
        }
    }

    /// Half extents of the axis-aligned bounding box.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            Shape::Box { half_extents } => half_extents,
            Shape::Sphere { radius } => Vec3::splat(radius),
        }
    }
}

/// Broad-phase filter: two bodies interact only if each one's membership
/// intersects the other's filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGroups {
    /// Groups this body belongs to
    pub membership: u32,
    /// Groups this body collides with
    pub filter: u32,
}

impl CollisionGroups {
    /// Player group bit
    pub const PLAYER: u32 = 1 << 0;
    /// Platform group bit
    pub const PLATFORM: u32 = 1 << 1;
    /// Enemy group bit
    pub const ENEMY: u32 = 1 << 2;
    /// Every group
    pub const ALL: u32 = u32::MAX;

    /// Create groups from raw bits.
    pub const fn new(membership: u32, filter: u32) -> Self {
        Self { membership, filter }
    }

    /// The player collides with everything.
    pub const fn player() -> Self {
        Self::new(Self::PLAYER, Self::ALL)
    }

    /// Platforms collide with players only.
    pub const fn platform() -> Self {
        Self::new(Self::PLATFORM, Self::PLAYER)
    }

    /// Enemies pass through platforms and only meet the player.
    pub const fn enemy() -> Self {
        Self::new(Self::ENEMY, Self::PLAYER)
    }

    /// Check whether two bodies should be tested against each other.
    #[inline]
    pub fn interacts(self, other: CollisionGroups) -> bool {
        (self.membership & other.filter) != 0 && (other.membership & self.filter) != 0
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::new(Self::ALL, Self::ALL)
    }
}

/// Everything needed to create a body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    /// Simulation kind
    pub kind: BodyKind,
    /// Mass (ignored unless dynamic)
    pub mass: f32,
    /// Initial center position
    pub position: Vec3,
    /// Collision shape
    pub shape: Shape,
    /// Broad-phase groups
    pub groups: CollisionGroups,
}

impl BodyDesc {
    /// Immovable body.
    pub fn fixed(position: Vec3, shape: Shape) -> Self {
        Self {
            kind: BodyKind::Static,
            mass: 0.0,
            position,
            shape,
            groups: CollisionGroups::default(),
        }
    }

    /// Body moved by game logic.
    pub fn kinematic(mass: f32, position: Vec3, shape: Shape) -> Self {
        Self {
            kind: BodyKind::Kinematic,
            mass,
            position,
            shape,
            groups: CollisionGroups::default(),
        }
    }

    /// Fully simulated body.
    pub fn dynamic(mass: f32, position: Vec3, shape: Shape) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            mass,
            position,
            shape,
            groups: CollisionGroups::default(),
        }
    }

    /// Replace the collision groups.
    pub fn with_groups(mut self, groups: CollisionGroups) -> Self {
        self.groups = groups;
        self
    }
}

/// A contact reported by a step. Engines may report a persisting contact
/// again on every step, so consumers must be idempotent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    /// First body
    pub a: BodyHandle,
    /// Second body
    pub b: BodyHandle,
}

impl ContactEvent {
    /// Create a contact between two bodies.
    pub const fn new(a: BodyHandle, b: BodyHandle) -> Self {
        Self { a, b }
    }

    /// Whether `body` is one side of this contact.
    #[inline]
    pub fn involves(&self, body: BodyHandle) -> bool {
        self.a == body || self.b == body
    }

    /// The side that is not `body`, if `body` is involved.
    #[inline]
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.a == body {
            Some(self.b)
        } else if self.b == body {
            Some(self.a)
        } else {
            None
        }
    }
}

/// The physics engine as seen by the game.
///
/// A body exists from `create_body` until `destroy_body`; it only takes part
/// in the simulation between `add_body` and `remove_body`. Accessors return
/// `None` and setters do nothing for unknown handles.
pub trait PhysicsWorld {
    /// Create a body. It is not simulated until added.
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;

    /// Add a body to the simulation. Returns `false` if unknown or already added.
    fn add_body(&mut self, body: BodyHandle) -> bool;

    /// Remove a body from the simulation, keeping it for a later `add_body`.
    /// Returns `false` if unknown or not simulated.
    fn remove_body(&mut self, body: BodyHandle) -> bool;

    /// Remove a body from the simulation and free it. Returns `false` if unknown.
    fn destroy_body(&mut self, body: BodyHandle) -> bool;

    /// Whether the body is currently simulated.
    fn is_simulated(&self, body: BodyHandle) -> bool;

    /// Advance the simulation.
    fn step(&mut self, dt: f32);

    /// Take the contacts reported since the last drain, in report order.
    fn drain_contacts(&mut self) -> Vec<ContactEvent>;

    /// Gravity vector.
    fn gravity(&self) -> Vec3;

    /// Body center.
    fn position(&self, body: BodyHandle) -> Option<Vec3>;

    /// Teleport a body.
    fn set_position(&mut self, body: BodyHandle, position: Vec3);

    /// Linear velocity.
    fn velocity(&self, body: BodyHandle) -> Option<Vec3>;

    /// Set linear velocity.
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3);

    /// Angular velocity.
    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3>;

    /// Set angular velocity.
    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: Vec3);

    /// Orientation.
    fn orientation(&self, body: BodyHandle) -> Option<Quat>;

    /// Set orientation.
    fn set_orientation(&mut self, body: BodyHandle, orientation: Quat);

    /// Accumulate a force applied on the next step.
    fn apply_force(&mut self, body: BodyHandle, force: Vec3);

    /// Accumulate a torque applied on the next step.
    fn apply_torque(&mut self, body: BodyHandle, torque: Vec3);

    /// Drop accumulated force and torque.
    fn clear_forces(&mut self, body: BodyHandle);

    /// Number of bodies that exist (simulated or not).
    fn body_count(&self) -> usize;

    /// Number of bodies currently simulated.
    fn simulated_count(&self) -> usize;
}
