//! Character Controller
//!
//! Turns the per-tick [`InputIntent`] into horizontal acceleration with
//! deceleration and a speed cap, plus a variable-height hold jump. The
//! controller owns the player body; the engine does the integration.
//!
//! ## Jump Model
//!
//! ```text
//! press (grounded)   v_y = sqrt(2 * jump_speed * |g|)
//! hold, t < T        v_y += boost * (T - t) / T * dt
//! any jumping tick   v_y <= sqrt(2 * |g| * (max_height - rise))
//! release / t >= T   boost phase ends
//! ```

use serde::{Serialize, Deserialize};

use crate::core::math::{approach_zero, clamp_horizontal, Quat, Vec3};
use crate::error::ConfigurationError;
use crate::game::config::ControllerConfig;
use crate::game::input::InputIntent;
use crate::physics::{BodyHandle, PhysicsWorld};

/// Snapshot of the player after a controller update.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerPose {
    /// Body center
    pub position: Vec3,
    /// Body orientation
    pub orientation: Quat,
    /// Linear velocity
    pub velocity: Vec3,
    /// Standing on something
    pub is_on_ground: bool,
    /// Inside the boosted phase of a jump
    pub is_jumping: bool,
}

/// Drives the player body.
#[derive(Clone, Debug)]
pub struct CharacterController {
    body: BodyHandle,
    config: ControllerConfig,
    gravity: f32,
    on_ground: bool,
    jumping: bool,
    jump_held_time: f32,
    jump_origin_y: f32,
    jump_was_held: bool,
}

impl CharacterController {
    /// Create a controller for `body`. `gravity` is the world gravity vector;
    /// only its magnitude is used.
    pub fn new(body: BodyHandle, config: ControllerConfig, gravity: Vec3) -> Self {
        Self {
            body,
            config,
            gravity: gravity.length(),
            on_ground: true,
            jumping: false,
            jump_held_time: 0.0,
            jump_origin_y: 0.0,
            jump_was_held: false,
        }
    }

    /// The player body.
    #[inline]
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Tuning in use.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Whether the player may jump.
    #[inline]
    pub fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    /// Whether a jump is in its boosted phase.
    #[inline]
    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    /// Time jump has been held in the current jump.
    pub fn jump_held_time(&self) -> f32 {
        self.jump_held_time
    }

    /// Initial vertical speed of a jump.
    pub fn takeoff_speed(&self) -> f32 {
        (2.0 * self.config.jump_speed * self.gravity).sqrt()
    }

    /// Apply one tick of input. `dt <= 0` changes nothing.
    pub fn update<W: PhysicsWorld>(&mut self, world: &mut W, dt: f32, intent: &InputIntent) -> PlayerPose {
        if dt <= 0.0 {
            return self.pose(world);
        }
        let Some(mut velocity) = world.velocity(self.body) else {
            return self.pose(world);
        };

        let x = intent.x_axis();
        let z = intent.z_axis();
        if x.engaged {
            velocity.x += self.config.acceleration * x.drive * dt;
        }
        if z.engaged {
            velocity.z += self.config.acceleration * z.drive * dt;
        }
        velocity = clamp_horizontal(velocity, self.config.max_speed);
        let brake = self.config.deceleration * dt;
        if !x.engaged {
            velocity.x = approach_zero(velocity.x, brake);
        }
        if !z.engaged {
            velocity.z = approach_zero(velocity.z, brake);
        }

        let pressed = intent.jump_held && !self.jump_was_held;
        self.jump_was_held = intent.jump_held;

        if pressed && self.on_ground {
            self.on_ground = false;
            self.jumping = true;
            self.jump_held_time = 0.0;
            self.jump_origin_y = world.position(self.body).map_or(0.0, |p| p.y);
            velocity.y = self.takeoff_speed();
        } else if self.jumping {
            let window = self.config.max_jump_hold_time;
            if intent.jump_held && !self.on_ground && self.jump_held_time < window {
                let fade = (window - self.jump_held_time) / window;
                velocity.y += self.config.jump_hold_boost * fade * dt;
                self.jump_held_time += dt;
            } else {
                self.jumping = false;
            }
        }

        if self.jumping {
            velocity.y = velocity.y.min(self.apex_cap(world));
        }

        world.set_velocity(self.body, velocity);
        self.pose(world)
    }

    /// Highest vertical speed that still keeps the apex under the cap.
    fn apex_cap<W: PhysicsWorld>(&self, world: &W) -> f32 {
        let y = world.position(self.body).map_or(self.jump_origin_y, |p| p.y);
        let headroom = self.config.max_jump_height - (y - self.jump_origin_y);
        (2.0 * self.gravity * headroom).max(0.0).sqrt()
    }

    /// Landed on a surface. Ends any jump.
    pub fn ground(&mut self) {
        self.on_ground = true;
        self.jumping = false;
    }

    /// Put the player back at `spawn` at rest.
    pub fn reset<W: PhysicsWorld>(&mut self, world: &mut W, spawn: Option<Vec3>) -> Result<(), ConfigurationError> {
        let spawn = spawn.ok_or(ConfigurationError::MissingSpawnPoint)?;

        world.set_velocity(self.body, Vec3::ZERO);
        world.set_angular_velocity(self.body, Vec3::ZERO);
        world.clear_forces(self.body);
        world.set_position(self.body, spawn);
        world.set_orientation(self.body, Quat::IDENTITY);

        self.on_ground = true;
        self.jumping = false;
        self.jump_held_time = 0.0;
        self.jump_origin_y = spawn.y;
        self.jump_was_held = false;
        Ok(())
    }

    /// Current pose read back from the body.
    pub fn pose<W: PhysicsWorld>(&self, world: &W) -> PlayerPose {
        PlayerPose {
            position: world.position(self.body).unwrap_or(Vec3::ZERO),
            orientation: world.orientation(self.body).unwrap_or(Quat::IDENTITY),
            velocity: world.velocity(self.body).unwrap_or(Vec3::ZERO),
            is_on_ground: self.on_ground,
            is_jumping: self.jumping,
        }
    }
}
