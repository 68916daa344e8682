//! Session State Definitions
//!
//! The session record owned by the state machine: current state, level
//! progress, death count and the clock.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::math::format_clock;
use crate::game::events::GameEvent;

// =============================================================================
// GAME STATE
// =============================================================================

/// State of the progression machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum GameState {
    /// Waiting for the begin-session signal
    #[default]
    Starting,
    /// Active gameplay
    Playing,
    /// Player died; respawn in progress
    GameOver,
    /// Goal reached; level transition in progress
    LevelComplete,
    /// Every level completed (terminal)
    Win,
}

impl GameState {
    /// Stable discriminant for hashing.
    pub fn as_u8(self) -> u8 {
        match self {
            GameState::Starting => 0,
            GameState::Playing => 1,
            GameState::GameOver => 2,
            GameState::LevelComplete => 3,
            GameState::Win => 4,
        }
    }

    /// Whether tick logic runs in this state.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, GameState::Playing)
    }
}

// =============================================================================
// SESSION SUMMARY
// =============================================================================

/// Stats for the UI collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Deaths so far
    pub deaths: u32,
    /// Session time (s)
    pub elapsed_time: f32,
    /// One-based level number, capped at the level count
    pub current_level_display: usize,
}

impl SessionSummary {
    /// Elapsed time as `MM:SS`.
    pub fn formatted_time(&self) -> String {
        format_clock(self.elapsed_time)
    }
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// One play session.
///
/// `deaths` and `elapsed_time` carry across level transitions;
/// `current_level_index` only grows until it reaches `level_count`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GameSession {
    /// Current state
    pub state: GameState,

    /// Index of the active level
    pub current_level_index: usize,

    /// Number of levels in the session
    pub level_count: usize,

    /// Deaths so far
    pub deaths: u32,

    /// Session time (s), stopped on WIN
    pub elapsed_time: f32,

    /// Ticks processed while PLAYING
    pub tick: u64,

    /// Events generated since the last take
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl GameSession {
    /// Fresh session over `level_count` levels.
    pub fn new(level_count: usize) -> Self {
        Self {
            level_count,
            ..Self::default()
        }
    }

    /// Current stats.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            deaths: self.deaths,
            elapsed_time: self.elapsed_time,
            current_level_display: (self.current_level_index + 1).min(self.level_count),
        }
    }

    /// Whether every level has been completed.
    pub fn is_won(&self) -> bool {
        matches!(self.state, GameState::Win)
    }

    /// Whether the index has run past the last level.
    pub fn levels_exhausted(&self) -> bool {
        self.current_level_index >= self.level_count
    }

    /// Feed session fields into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.state.as_u8());
        hasher.update_u64(self.current_level_index as u64);
        hasher.update_u32(self.deaths);
        hasher.update_f32(self.elapsed_time);
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_starting() {
        let session = GameSession::new(3);
        assert_eq!(session.state, GameState::Starting);
        assert_eq!(session.deaths, 0);
        assert_eq!(session.summary().current_level_display, 1);
        assert!(!session.levels_exhausted());
    }

    #[test]
    fn test_level_display_is_capped() {
        let mut session = GameSession::new(2);
        session.current_level_index = 2;
        assert!(session.levels_exhausted());
        assert_eq!(session.summary().current_level_display, 2);
    }

    #[test]
    fn test_formatted_time() {
        let summary = SessionSummary {
            deaths: 0,
            elapsed_time: 125.9,
            current_level_display: 1,
        };
        assert_eq!(summary.formatted_time(), "02:05");
    }

    #[test]
    fn test_only_playing_is_active() {
        assert!(GameState::Playing.is_active());
        assert!(!GameState::Starting.is_active());
        assert!(!GameState::LevelComplete.is_active());
        assert!(!GameState::Win.is_active());
    }
}
