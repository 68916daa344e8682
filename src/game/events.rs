//! Game Events
//!
//! Events emitted by the state machine for the UI collaborator, logging and
//! replay comparison.

use serde::{Serialize, Deserialize};

use crate::core::math::Vec3;
use crate::game::entity::EntityId;
use crate::game::state::GameState;

/// Why the player died.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Touched a hazard platform or an enemy
    Hazard,
    /// Fell below the kill height
    Fall,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Session left STARTING
    SessionStarted {
        /// Number of levels in the session
        level_count: usize,
    },

    /// State machine changed state
    StateChanged {
        /// Previous state
        from: GameState,
        /// New state
        to: GameState,
    },

    /// A level finished loading
    LevelLoaded {
        /// Index in the level list
        index: usize,
        /// Level display name
        name: String,
    },

    /// The player died and was respawned
    PlayerDied {
        /// What killed the player
        cause: DeathCause,
        /// Where it happened
        position: Vec3,
        /// Death count after this one
        deaths: u32,
    },

    /// The player reached the goal of a level
    LevelCompleted {
        /// Index of the completed level
        index: usize,
        /// Session time when it happened (s)
        elapsed_time: f32,
    },

    /// An enemy started chasing the player
    EnemyActivated {
        /// Trigger platform
        trigger: EntityId,
    },

    /// A level load was requested while another was in progress
    LoadRejected {
        /// Level that was requested
        requested_index: usize,
    },

    /// The last level was completed
    SessionWon {
        /// Total deaths
        deaths: u32,
        /// Total time (s)
        elapsed_time: f32,
    },
}

/// A game event with its tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when the event occurred
    pub tick: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, data: GameEventData) -> Self {
        Self { tick, data }
    }

    /// Create state changed event.
    pub fn state_changed(tick: u64, from: GameState, to: GameState) -> Self {
        Self::new(tick, GameEventData::StateChanged { from, to })
    }

    /// Create player died event.
    pub fn player_died(tick: u64, cause: DeathCause, position: Vec3, deaths: u32) -> Self {
        Self::new(tick, GameEventData::PlayerDied { cause, position, deaths })
    }

    /// Create level loaded event.
    pub fn level_loaded(tick: u64, index: usize, name: impl Into<String>) -> Self {
        Self::new(
            tick,
            GameEventData::LevelLoaded {
                index,
                name: name.into(),
            },
        )
    }

    /// Whether this event ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, GameEventData::SessionWon { .. })
    }
}
