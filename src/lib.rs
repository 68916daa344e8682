//! # Skyhop
//!
//! Character controller and level progression core for a 3D platformer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         SKYHOP CORE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Shared primitives                         │
//! │  ├── math.rs     - glam re-exports, axis, distances          │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  physics/        - Physics engine seam                       │
//! │  ├── mod.rs      - PhysicsWorld trait, bodies, groups        │
//! │  └── arcade.rs   - Deterministic AABB reference engine       │
//! │                                                              │
//! │  render/         - Scene seam + headless scene               │
//! │                                                              │
//! │  game/           - Game logic                                │
//! │  ├── input.rs    - Input intent and recordings               │
//! │  ├── level.rs    - Level descriptor schema                   │
//! │  ├── container.rs- Level load / update / teardown            │
//! │  ├── controller.rs- Character controller                     │
//! │  ├── collision.rs- Contact classification                    │
//! │  ├── state.rs    - Session record                            │
//! │  └── tick.rs     - Progression state machine                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tick Flow
//!
//! input → controller → level update → physics step → contacts →
//! router → state machine → respawn / level change → visuals
//!
//! Game logic never integrates bodies and never draws. It talks to a
//! [`physics::PhysicsWorld`] and a [`render::Scene`]; the crate ships
//! [`physics::ArcadeWorld`] and [`render::HeadlessScene`] so sessions can run
//! and be replayed without a host.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod physics;
pub mod render;
pub mod game;

// Re-export commonly used types
pub use crate::core::math::{Quat, Vec2, Vec3};
pub use error::{ConfigurationError, LevelFormatError, RecordingError};
pub use game::config::{ControllerConfig, GameConfig};
pub use game::input::{InputIntent, InputRecording};
pub use game::level::LevelData;
pub use game::state::{GameState, SessionSummary};
pub use game::tick::{GameStateMachine, TickReport};
pub use physics::{ArcadeWorld, PhysicsWorld};
pub use render::{HeadlessScene, Scene};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
