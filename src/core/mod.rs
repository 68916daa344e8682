//! Core primitives shared by the physics seam and the game logic.
//!
//! Math is plain `f32` over `glam` types. Everything here is pure and
//! allocation free so it can be called from inside a tick.

pub mod math;
pub mod hash;

// Re-export core types
pub use math::{Vec2, Vec3, Quat, Axis, horizontal_distance, vertical_distance, approach_zero};
pub use hash::{StateHash, StateHasher};
