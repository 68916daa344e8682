//! Error Taxonomy
//!
//! Only configuration problems are errors. Deaths, rejected overlapping
//! level loads and collisions against untracked bodies are absorbed by the
//! state machine and surface as events or `Outcome::None`.

use std::path::PathBuf;

/// A level descriptor that cannot be turned into a playable level.
#[derive(Debug, thiserror::Error)]
pub enum LevelFormatError {
    /// Descriptor is not valid JSON for the level schema.
    #[error("malformed level descriptor: {0}")]
    Json(#[from] serde_json::Error),

    /// No platform is marked `isFirst`, so there is no spawn point.
    #[error("level has no platform marked isFirst")]
    MissingFirstPlatform,

    /// More than one platform is marked `isFirst`.
    #[error("level has {count} platforms marked isFirst, expected exactly one")]
    MultipleFirstPlatforms {
        /// Number of flagged platforms
        count: usize,
    },

    /// More than one platform is marked `isFinal`.
    #[error("level has {count} platforms marked isFinal, expected at most one")]
    MultipleGoalPlatforms {
        /// Number of flagged platforms
        count: usize,
    },

    /// A color string is not a hex RGB value.
    #[error("invalid hex color: {value:?}")]
    InvalidColor {
        /// Offending value
        value: String,
    },

    /// A platform has a non-positive or non-finite dimension.
    #[error("platform {index} has invalid dimensions")]
    InvalidDimensions {
        /// Platform index in the descriptor
        index: usize,
    },

    /// A platform names a movement axis other than x, y or z.
    #[error("platform {index} has unknown moveAxis {axis:?}")]
    InvalidMoveAxis {
        /// Platform index in the descriptor
        index: usize,
        /// Offending axis string
        axis: String,
    },

    /// A platform links an enemy but is also the goal or a hazard, so the
    /// enemy could never be triggered.
    #[error("platform {index} has hasEnemy together with isFinal or isHazard")]
    UnreachableEnemy {
        /// Platform index in the descriptor
        index: usize,
    },
}

/// Fatal configuration problem. Halts progression for the affected level.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A level descriptor failed validation.
    #[error("level {index} is malformed: {source}")]
    Level {
        /// Index of the level in the session's level list
        index: usize,
        /// Underlying format error
        #[source]
        source: LevelFormatError,
    },

    /// A level descriptor failed validation outside of a session.
    #[error(transparent)]
    LevelFormat(#[from] LevelFormatError),

    /// The controller was asked to respawn without a spawn point.
    #[error("no spawn point available: level has no first platform")]
    MissingSpawnPoint,

    /// The session was constructed with an empty level list.
    #[error("session has no levels")]
    NoLevels,

    /// A configuration or level file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Game configuration is not valid JSON.
    #[error("malformed game configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to encode or decode an input recording.
#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    /// Binary encoding failed.
    #[error("recording codec error: {0}")]
    Codec(#[from] bincode::Error),
}
