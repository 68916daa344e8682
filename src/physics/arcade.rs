//! Arcade Reference Engine
//!
//! Small deterministic engine behind [`PhysicsWorld`]: axis-aligned boxes,
//! semi-implicit Euler, and push-out along the axis of least penetration.
//! Spheres are approximated by their bounding cube.
//!
//! Bodies live in a `BTreeMap` so integration, resolution and contact
//! reporting always run in handle order.

use std::collections::BTreeMap;

use crate::core::math::{Quat, Vec3};
use super::{BodyDesc, BodyHandle, BodyKind, CollisionGroups, ContactEvent, PhysicsWorld};

/// Gap (in world units) at which two boxes still count as touching.
pub const CONTACT_SLOP: f32 = 1e-3;

/// Standard gravity used by the reference levels (m/s²).
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.82, 0.0);

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Box centered on `center` with `half` extents.
    #[inline]
    pub fn from_center(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Per-axis overlap depth. Negative components are gaps.
    #[inline]
    pub fn overlap(&self, other: &Aabb) -> Vec3 {
        self.max.min(other.max) - self.min.max(other.min)
    }

    /// Strictly interpenetrating on every axis.
    #[inline]
    pub fn penetrates(&self, other: &Aabb) -> bool {
        let o = self.overlap(other);
        o.x > 0.0 && o.y > 0.0 && o.z > 0.0
    }

    /// Overlapping or within [`CONTACT_SLOP`] on every axis.
    #[inline]
    pub fn touches(&self, other: &Aabb) -> bool {
        let o = self.overlap(other);
        o.x >= -CONTACT_SLOP && o.y >= -CONTACT_SLOP && o.z >= -CONTACT_SLOP
    }
}

#[derive(Clone, Debug)]
struct ArcadeBody {
    kind: BodyKind,
    mass: f32,
    half_extents: Vec3,
    groups: CollisionGroups,
    position: Vec3,
    velocity: Vec3,
    angular_velocity: Vec3,
    orientation: Quat,
    force: Vec3,
    torque: Vec3,
    simulated: bool,
}

impl ArcadeBody {
    fn new(desc: BodyDesc) -> Self {
        Self {
            kind: desc.kind,
            mass: desc.mass,
            half_extents: desc.shape.half_extents(),
            groups: desc.groups,
            position: desc.position,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            simulated: false,
        }
    }

    #[inline]
    fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    #[inline]
    fn inverse_mass(&self) -> f32 {
        if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 }
    }
}

/// Deterministic axis-aligned physics world.
#[derive(Clone, Debug)]
pub struct ArcadeWorld {
    gravity: Vec3,
    bodies: BTreeMap<BodyHandle, ArcadeBody>,
    next_handle: u32,
    contacts: Vec<ContactEvent>,
}

impl Default for ArcadeWorld {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

impl ArcadeWorld {
    /// Create an empty world.
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            bodies: BTreeMap::new(),
            next_handle: 0,
            contacts: Vec::new(),
        }
    }

    /// World bounding box of a body.
    pub fn aabb(&self, body: BodyHandle) -> Option<Aabb> {
        self.bodies.get(&body).map(ArcadeBody::aabb)
    }

    /// Kind of a body.
    pub fn kind(&self, body: BodyHandle) -> Option<BodyKind> {
        self.bodies.get(&body).map(|b| b.kind)
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut().filter(|b| b.simulated) {
            match body.kind {
                BodyKind::Static => {}
                BodyKind::Kinematic => {
                    body.position += body.velocity * dt;
                }
                BodyKind::Dynamic => {
                    let accel = gravity + body.force * body.inverse_mass();
                    body.velocity += accel * dt;
                    body.position += body.velocity * dt;

                    body.angular_velocity += body.torque * body.inverse_mass() * dt;
                    let spin = body.angular_velocity * dt;
                    if spin != Vec3::ZERO {
                        body.orientation = (Quat::from_scaled_axis(spin) * body.orientation).normalize();
                    }
                }
            }
            body.force = Vec3::ZERO;
            body.torque = Vec3::ZERO;
        }
    }

    fn resolve(&mut self) {
        let solids: Vec<(Aabb, CollisionGroups)> = self
            .bodies
            .values()
            .filter(|b| b.simulated && b.kind != BodyKind::Dynamic)
            .map(|b| (b.aabb(), b.groups))
            .collect();

        for body in self.bodies.values_mut() {
            if !body.simulated || body.kind != BodyKind::Dynamic {
                continue;
            }
            for (solid, groups) in &solids {
                if !body.groups.interacts(*groups) {
                    continue;
                }
                let mine = body.aabb();
                if !mine.penetrates(solid) {
                    continue;
                }
                push_out(body, solid, mine.overlap(solid));
            }
        }
    }

    fn collect_contacts(&mut self) {
        let live: Vec<(BodyHandle, BodyKind, Aabb, CollisionGroups)> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.simulated)
            .map(|(h, b)| (*h, b.kind, b.aabb(), b.groups))
            .collect();

        for i in 0..live.len() {
            for j in (i + 1)..live.len() {
                let (ha, ka, box_a, ga) = live[i];
                let (hb, kb, box_b, gb) = live[j];
                if ka != BodyKind::Dynamic && kb != BodyKind::Dynamic {
                    continue;
                }
                if ga.interacts(gb) && box_a.touches(&box_b) {
                    self.contacts.push(ContactEvent::new(ha, hb));
                }
            }
        }
    }
}

/// Push a dynamic body out of a solid along the shallowest axis and cancel
/// the velocity component driving it inward.
fn push_out(body: &mut ArcadeBody, solid: &Aabb, depth: Vec3) {
    let solid_center = (solid.min + solid.max) * 0.5;
    let half = body.half_extents;

    if depth.y <= depth.x && depth.y <= depth.z {
        if body.position.y >= solid_center.y {
            body.position.y = solid.max.y + half.y;
            body.velocity.y = body.velocity.y.max(0.0);
        } else {
            body.position.y = solid.min.y - half.y;
            body.velocity.y = body.velocity.y.min(0.0);
        }
    } else if depth.x <= depth.z {
        if body.position.x >= solid_center.x {
            body.position.x = solid.max.x + half.x;
            body.velocity.x = body.velocity.x.max(0.0);
        } else {
            body.position.x = solid.min.x - half.x;
            body.velocity.x = body.velocity.x.min(0.0);
        }
    } else if body.position.z >= solid_center.z {
        body.position.z = solid.max.z + half.z;
        body.velocity.z = body.velocity.z.max(0.0);
    } else {
        body.position.z = solid.min.z - half.z;
        body.velocity.z = body.velocity.z.min(0.0);
    }
}

impl PhysicsWorld for ArcadeWorld {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, ArcadeBody::new(desc));
        handle
    }

    fn add_body(&mut self, body: BodyHandle) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) if !b.simulated => {
                b.simulated = true;
                true
            }
            _ => false,
        }
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) if b.simulated => {
                b.simulated = false;
                true
            }
            _ => false,
        }
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        self.bodies.remove(&body).is_some()
    }

    fn is_simulated(&self, body: BodyHandle) -> bool {
        self.bodies.get(&body).is_some_and(|b| b.simulated)
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integrate(dt);
        self.resolve();
        self.collect_contacts();
    }

    fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn position(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.position = position;
        }
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.velocity = velocity;
        }
    }

    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.angular_velocity)
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.angular_velocity = angular_velocity;
        }
    }

    fn orientation(&self, body: BodyHandle) -> Option<Quat> {
        self.bodies.get(&body).map(|b| b.orientation)
    }

    fn set_orientation(&mut self, body: BodyHandle, orientation: Quat) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.orientation = orientation;
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.force += force;
        }
    }

    fn apply_torque(&mut self, body: BodyHandle, torque: Vec3) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.torque += torque;
        }
    }

    fn clear_forces(&mut self, body: BodyHandle) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.force = Vec3::ZERO;
            b.torque = Vec3::ZERO;
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn simulated_count(&self) -> usize {
        self.bodies.values().filter(|b| b.simulated).count()
    }
}
