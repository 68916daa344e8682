//! Level Descriptors
//!
//! The JSON schema consumed from the level-data collaborator:
//!
//! ```json
//! { "name": "Level 1", "platformColor": "8DF9C1", "background": "F98D8D",
//!   "platforms": [ { "x": 0, "y": 0, "z": 0, "width": 6, "depth": 6, "isFirst": true },
//!                  { "x": 0, "y": 2, "z": -10, "width": 4, "depth": 4,
//!                    "moveAxis": "x", "moveRange": 3, "moveSpeed": 1.5 },
//!                  { "x": 0, "y": 4, "z": -20, "width": 6, "depth": 6, "isFinal": true } ] }
//! ```

use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::core::math::{Axis, Vec3};
use crate::error::{ConfigurationError, LevelFormatError};
use crate::game::entity::Motion;

/// Platform height when the descriptor omits it.
pub const DEFAULT_PLATFORM_HEIGHT: f32 = 1.0;

/// Oscillation speed when a moving platform omits `moveSpeed`.
pub const DEFAULT_MOVE_SPEED: f32 = 1.0;

/// One platform entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDesc {
    /// Center X
    pub x: f32,
    /// Center Y
    pub y: f32,
    /// Center Z
    pub z: f32,
    /// Size along X
    pub width: f32,
    /// Size along Z
    pub depth: f32,
    /// Size along Y
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// Spawn platform
    #[serde(default)]
    pub is_first: bool,
    /// Goal platform
    #[serde(default)]
    pub is_final: bool,
    /// Landing here activates a linked enemy
    #[serde(default)]
    pub has_enemy: bool,
    /// Touching this platform kills the player
    #[serde(default)]
    pub is_hazard: bool,
    /// Oscillation axis: "x", "y" or "z"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_axis: Option<String>,
    /// Oscillation amplitude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_range: Option<f32>,
    /// Oscillation angular speed (rad/s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_speed: Option<f32>,
}

impl PlatformDesc {
    /// Static ground platform at a position.
    pub fn at(x: f32, y: f32, z: f32, width: f32, depth: f32) -> Self {
        Self {
            x,
            y,
            z,
            width,
            depth,
            height: None,
            is_first: false,
            is_final: false,
            has_enemy: false,
            is_hazard: false,
            move_axis: None,
            move_range: None,
            move_speed: None,
        }
    }

    /// Center position.
    pub fn origin(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Full size along each axis.
    pub fn size(&self) -> Vec3 {
        Vec3::new(self.width, self.height.unwrap_or(DEFAULT_PLATFORM_HEIGHT), self.depth)
    }

    /// Kinematic motion, if `moveAxis` is set.
    pub fn motion(&self, index: usize) -> Result<Option<Motion>, LevelFormatError> {
        let Some(axis) = self.move_axis.as_deref() else {
            return Ok(None);
        };
        let axis = Axis::parse(axis).ok_or_else(|| LevelFormatError::InvalidMoveAxis {
            index,
            axis: axis.to_string(),
        })?;
        Ok(Some(Motion {
            axis,
            amplitude: self.move_range.unwrap_or(0.0),
            speed: self.move_speed.unwrap_or(DEFAULT_MOVE_SPEED),
        }))
    }

    fn check_dimensions(&self, index: usize) -> Result<(), LevelFormatError> {
        let size = self.size();
        let origin = self.origin();
        let valid = size.is_finite()
            && size.cmpgt(Vec3::ZERO).all()
            && origin.is_finite()
            && self.move_range.map_or(true, f32::is_finite)
            && self.move_speed.map_or(true, f32::is_finite);
        if valid {
            Ok(())
        } else {
            Err(LevelFormatError::InvalidDimensions { index })
        }
    }
}

/// A whole level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    /// Display name
    pub name: String,
    /// Hex color shared by every platform
    pub platform_color: String,
    /// Optional hex clear color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Platforms in descriptor order
    pub platforms: Vec<PlatformDesc>,
}

impl LevelData {
    /// Parse from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, LevelFormatError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_json_str(&json)?)
    }

    /// Index of the spawn platform, if exactly one is marked.
    pub fn first_index(&self) -> Option<usize> {
        self.platforms.iter().position(|p| p.is_first)
    }

    /// Index of the goal platform, if any.
    pub fn goal_index(&self) -> Option<usize> {
        self.platforms.iter().position(|p| p.is_final)
    }

    /// Parsed platform color.
    pub fn platform_rgb(&self) -> Result<u32, LevelFormatError> {
        parse_hex_color(&self.platform_color)
    }

    /// Parsed background color.
    pub fn background_rgb(&self) -> Result<Option<u32>, LevelFormatError> {
        self.background.as_deref().map(parse_hex_color).transpose()
    }

    /// Check everything a load relies on.
    pub fn validate(&self) -> Result<(), LevelFormatError> {
        let firsts = self.platforms.iter().filter(|p| p.is_first).count();
        match firsts {
            0 => return Err(LevelFormatError::MissingFirstPlatform),
            1 => {}
            count => return Err(LevelFormatError::MultipleFirstPlatforms { count }),
        }

        let goals = self.platforms.iter().filter(|p| p.is_final).count();
        if goals > 1 {
            return Err(LevelFormatError::MultipleGoalPlatforms { count: goals });
        }

        self.platform_rgb()?;
        self.background_rgb()?;

        for (index, platform) in self.platforms.iter().enumerate() {
            platform.check_dimensions(index)?;
            platform.motion(index)?;
            if platform.has_enemy && (platform.is_final || platform.is_hazard) {
                return Err(LevelFormatError::UnreachableEnemy { index });
            }
        }
        Ok(())
    }
}

/// Parse `"F98D8D"`, `"#F98D8D"` or `"0xF98D8D"` into 0xRRGGBB.
pub fn parse_hex_color(value: &str) -> Result<u32, LevelFormatError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || digits.len() > 6 {
        return Err(LevelFormatError::InvalidColor { value: value.to_string() });
    }
    u32::from_str_radix(digits, 16).map_err(|_| LevelFormatError::InvalidColor {
        value: value.to_string(),
    })
}
