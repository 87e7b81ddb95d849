//! Game data model — session, players, guesses, and the phase table.
//!
//! DESIGN
//! ======
//! A `Game` is one session from lobby to finished, identified by a short
//! code and persisted as a single JSON document. The phase machine is an
//! explicit enum with its transition table centralized in `Phase::next`;
//! every phase-dependent rule (timers, guess numbers, clue word counts,
//! who may advance) is a lookup here rather than a conditional scattered
//! through the operations. "Not yet applicable" state (target, deadline,
//! clue-giver before start) is `Option`, never a sentinel.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::color::{Complexity, GridCell, GridDims, PLAYER_COLORS};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Minimum participants required to start a game.
pub const MIN_PLAYERS: usize = 2;

/// Hard cap on participants per game.
pub const MAX_PLAYERS: usize = 24;

/// Maximum display-name length after trimming.
pub const MAX_NAME_LENGTH: usize = 16;

/// Current time as milliseconds since Unix epoch.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// PHASE
// =============================================================================

/// Lifecycle phase of a game. One game is in exactly one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "lobby")]
    Lobby,
    #[serde(rename = "clue-1")]
    Clue1,
    #[serde(rename = "guess-1")]
    Guess1,
    #[serde(rename = "clue-2")]
    Clue2,
    #[serde(rename = "guess-2")]
    Guess2,
    #[serde(rename = "reveal")]
    Reveal,
    #[serde(rename = "leaderboard")]
    Leaderboard,
    #[serde(rename = "finished")]
    Finished,
}

impl Phase {
    /// The authoritative forward transition table. `Leaderboard → Clue1`
    /// is the round-robin edge into the next round; `Lobby` and
    /// `Finished` have no forward edge.
    #[must_use]
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Lobby | Phase::Finished => None,
            Phase::Clue1 => Some(Phase::Guess1),
            Phase::Guess1 => Some(Phase::Clue2),
            Phase::Clue2 => Some(Phase::Guess2),
            Phase::Guess2 => Some(Phase::Reveal),
            Phase::Reveal => Some(Phase::Leaderboard),
            Phase::Leaderboard => Some(Phase::Clue1),
        }
    }

    /// Phases that run on a deadline when the lobby timer is enabled.
    #[must_use]
    pub fn is_timed(self) -> bool {
        matches!(self, Phase::Clue1 | Phase::Guess1 | Phase::Clue2 | Phase::Guess2)
    }

    /// The guess slot (1 or 2) accepted during this phase.
    #[must_use]
    pub fn guess_number(self) -> Option<u8> {
        match self {
            Phase::Guess1 => Some(1),
            Phase::Guess2 => Some(2),
            _ => None,
        }
    }

    /// Exact word count a typed clue must have during this phase.
    #[must_use]
    pub fn clue_word_count(self) -> Option<usize> {
        match self {
            Phase::Clue1 => Some(1),
            Phase::Clue2 => Some(2),
            _ => None,
        }
    }

    /// Phases the clue-giver moves forward voluntarily. Guess phases are
    /// excluded: they conclude by full lock-in or timer expiry only.
    #[must_use]
    pub fn clue_giver_advances(self) -> bool {
        matches!(self, Phase::Clue1 | Phase::Clue2 | Phase::Reveal | Phase::Leaderboard)
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

/// How clues are delivered: spoken in the same room, or typed for
/// remote groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Together,
    Remote,
}

/// Lobby settings. Mutable by the host, only before the game starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub mode: GameMode,
    pub complexity: Complexity,
    pub timer_enabled: bool,
}

impl GameSettings {
    #[must_use]
    pub fn lobby_default() -> Self {
        Self { mode: GameMode::Together, complexity: Complexity::Normal, timer_enabled: true }
    }
}

/// Partial settings payload for host updates; absent fields are unchanged.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub mode: Option<GameMode>,
    pub complexity: Option<Complexity>,
    pub timer_enabled: Option<bool>,
}

// =============================================================================
// PLAYER / GUESS / SCORE
// =============================================================================

/// One participant's per-game identity. The id is supplied by the caller
/// and stable across reconnects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Index into the marker palette; `join order mod palette size`.
    pub color_index: usize,
    /// Cumulative points across rounds. Lower is better.
    pub total_score: u32,
    pub connected: bool,
    pub joined_at: i64,
    pub last_seen: i64,
}

/// One placement on the grid, keyed by (player, round, slot).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guess {
    pub player_id: String,
    pub round_number: u32,
    pub guess_number: u8,
    pub hue: u32,
    pub chroma: u32,
    pub locked_in: bool,
    /// Filled in at scoring time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
}

/// One row of the per-round score table, computed at the guess-2 exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundScore {
    pub player_id: String,
    pub distance: u32,
    pub points: u32,
    #[serde(default)]
    pub is_clue_giver: bool,
}

// =============================================================================
// GAME
// =============================================================================

/// One game session. Serialized whole into the store under its code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub code: String,
    pub phase: Phase,
    pub host_id: String,
    pub clue_giver_id: Option<String>,
    pub round_number: u32,
    pub target: Option<GridCell>,
    pub created_at: i64,
    /// Absolute ms timestamp when the current timed phase auto-advances.
    pub phase_deadline: Option<i64>,
    pub settings: GameSettings,
    /// Join-ordered. Never reordered once the game has started.
    pub players: Vec<Player>,
    /// Append/update log across the game; consumers filter by round.
    pub guesses: Vec<Guess>,
    pub round_scores: Vec<RoundScore>,
    pub current_clue: Option<String>,
}

impl Game {
    /// Fresh game in the lobby. The creator becomes host but is not a
    /// participant until they join.
    #[must_use]
    pub fn new(code: String, host_id: String, now: i64) -> Self {
        Self {
            code,
            phase: Phase::Lobby,
            host_id,
            clue_giver_id: None,
            round_number: 0,
            target: None,
            created_at: now,
            phase_deadline: None,
            settings: GameSettings::lobby_default(),
            players: Vec::new(),
            guesses: Vec::new(),
            round_scores: Vec::new(),
            current_clue: None,
        }
    }

    /// Active grid dimensions for this game's complexity.
    #[must_use]
    pub fn grid(&self) -> GridDims {
        self.settings.complexity.grid()
    }

    #[must_use]
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Case-insensitive display-name collision check.
    #[must_use]
    pub fn name_taken(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Append a new player at the end of the join order.
    pub fn push_player(&mut self, id: String, name: String, now: i64) {
        let color_index = self.players.len() % PLAYER_COLORS.len();
        self.players.push(Player {
            id,
            name,
            color_index,
            total_score: 0,
            connected: true,
            joined_at: now,
            last_seen: now,
        });
    }

    /// Everyone except the current clue-giver.
    pub fn guessers(&self) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .filter(|p| Some(p.id.as_str()) != self.clue_giver_id.as_deref())
    }

    /// Next clue-giver in join order, wrapping. `None` before the game
    /// starts or with an empty roster.
    #[must_use]
    pub fn next_clue_giver(&self) -> Option<String> {
        if self.players.is_empty() {
            return None;
        }
        let current = self.clue_giver_id.as_deref()?;
        // Players are stored in join order, so position is rotation order.
        let index = self.players.iter().position(|p| p.id == current).unwrap_or(0);
        let next = (index + 1) % self.players.len();
        Some(self.players[next].id.clone())
    }

    /// Find this player's guess for the given slot in the current round.
    pub fn guess_mut(&mut self, player_id: &str, guess_number: u8) -> Option<&mut Guess> {
        let round = self.round_number;
        self.guesses
            .iter_mut()
            .find(|g| g.player_id == player_id && g.round_number == round && g.guess_number == guess_number)
    }
}

#[cfg(test)]
#[path = "game_test.rs"]
mod tests;
