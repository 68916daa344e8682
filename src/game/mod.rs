//! Game Logic Module
//!
//! Everything between the input intent and the physics/render seams.
//!
//! ## Module Structure
//!
//! - `input`: Input intent, key mapping, recordings
//! - `config`: Controller and session tuning
//! - `level`: Level descriptor schema and validation
//! - `entity`: Platforms, enemies and body tags
//! - `container`: Level load, update and teardown
//! - `controller`: Character controller
//! - `collision`: Contact classification
//! - `state`: Session record and summary
//! - `tick`: Progression state machine and replay
//! - `events`: Game events for the UI and replay comparison

pub mod input;
pub mod config;
pub mod level;
pub mod entity;
pub mod container;
pub mod controller;
pub mod collision;
pub mod state;
pub mod tick;
pub mod events;

// Re-export key types
pub use input::{InputIntent, InputRecording, Key};
pub use config::{ControllerConfig, GameConfig};
pub use level::{LevelData, PlatformDesc};
pub use entity::{BodyTag, EntityId};
pub use container::LevelContainer;
pub use controller::{CharacterController, PlayerPose};
pub use collision::{CollisionRouter, Outcome};
pub use state::{GameSession, GameState, SessionSummary};
pub use tick::{GameStateMachine, TickReport, replay_session};
pub use events::{GameEvent, GameEventData, DeathCause};
