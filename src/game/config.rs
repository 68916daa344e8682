//! Game Configuration
//!
//! Tuning constants for the controller and the state machine. Every field has
//! a default, so a JSON file only needs to name what it overrides.

use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::core::math::Vec3;
use crate::error::ConfigurationError;
use crate::TICK_RATE;

/// Character controller tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Horizontal acceleration while input is held (u/s²)
    pub acceleration: f32,
    /// Horizontal deceleration with no input on an axis (u/s²)
    pub deceleration: f32,
    /// Horizontal speed cap (u/s)
    pub max_speed: f32,
    /// Height reached by a tapped jump. Initial jump velocity is
    /// `sqrt(2 * jump_speed * |gravity|)`.
    pub jump_speed: f32,
    /// Apex cap for a fully held jump, measured from the take-off height
    pub max_jump_height: f32,
    /// Longest time holding jump keeps adding lift (s)
    pub max_jump_hold_time: f32,
    /// Upward acceleration at the start of the hold window, fading linearly to
    /// zero at `max_jump_hold_time` (u/s²)
    pub jump_hold_boost: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            acceleration: 10.0,
            deceleration: 2.0,
            max_speed: 4.0,
            jump_speed: 2.0,
            max_jump_height: 7.0,
            max_jump_hold_time: 0.3,
            jump_hold_boost: 40.0,
        }
    }
}

/// Session-wide configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Controller tuning
    pub controller: ControllerConfig,
    /// World gravity (u/s²)
    pub gravity: Vec3,
    /// Fixed simulation rate used by the headless runner (Hz)
    pub tick_rate: u32,
    /// How far below the first platform the player may fall before dying
    pub fall_margin: f32,
    /// Player cube edge length
    pub player_size: f32,
    /// Player body mass
    pub player_mass: f32,
    /// Player color (0xRRGGBB)
    pub player_color: u32,
    /// Goal completes within this XZ distance of the goal platform center
    pub completion_horizontal_threshold: f32,
    /// Goal completes within this height difference; `None` uses the player height
    pub completion_vertical_threshold: Option<f32>,
    /// Enemy pursuit speed (u/s)
    pub enemy_speed: f32,
    /// Enemy spawn height above its trigger platform
    pub enemy_spawn_lift: f32,
    /// Enemy sphere radius
    pub enemy_radius: f32,
    /// Enemy mass
    pub enemy_mass: f32,
    /// Enemy color (0xRRGGBB)
    pub enemy_color: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            gravity: Vec3::new(0.0, -9.82, 0.0),
            tick_rate: TICK_RATE,
            fall_margin: 20.0,
            player_size: 1.0,
            player_mass: 1.0,
            player_color: 0xff0000,
            completion_horizontal_threshold: 5.0,
            completion_vertical_threshold: None,
            enemy_speed: 4.0,
            enemy_spawn_lift: 2.0,
            enemy_radius: 0.5,
            enemy_mass: 5.0,
            enemy_color: 0xff0000,
        }
    }
}

impl GameConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Fixed tick length derived from `tick_rate`.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Player height (the player is a cube).
    pub fn player_height(&self) -> f32 {
        self.player_size
    }

    /// Vertical completion threshold, defaulting to the player height.
    pub fn vertical_threshold(&self) -> f32 {
        self.completion_vertical_threshold.unwrap_or(self.player_size)
    }
}
