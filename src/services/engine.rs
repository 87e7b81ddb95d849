//! Session engine — every lifecycle operation on a game.
//!
//! DESIGN
//! ======
//! Each operation is a read-validate-mutate-write cycle against the
//! store, executed under the game's session lock so concurrent callers
//! serialize (two guessers locking in at once, a poll racing a lifecycle
//! call). Validation happens before any mutation: an operation either
//! persists its full effect or fails with a typed error and changes
//! nothing.
//!
//! ERROR HANDLING
//! ==============
//! Business outcomes (wrong actor, wrong phase, bad input, state
//! conflicts) are `GameError` variants returned to the caller, never
//! panics. Only `Store` and `CodeSpaceExhausted` are infrastructure
//! faults; the route layer logs those and reports a generic internal
//! error.

use tracing::info;

use crate::color::random_game_code;
use crate::game::{
    Game, GameMode, MAX_NAME_LENGTH, MAX_PLAYERS, MIN_PLAYERS, Phase, SettingsPatch, now_ms,
};
use crate::services::round;
use crate::state::AppState;
use crate::store::StoreError;

/// Attempts at drawing an unused game code before giving up.
const CODE_ATTEMPTS: usize = 32;

// =============================================================================
// ERRORS
// =============================================================================

/// Caller-facing outcomes of engine operations. All variants except the
/// internal pair are expected, recoverable business results.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Game not found")]
    NotFound,
    #[error("Game has already started")]
    AlreadyStarted,
    #[error("Game is full")]
    GameFull,
    #[error("Name is required")]
    NameRequired,
    #[error("Name must be {MAX_NAME_LENGTH} characters or less")]
    NameTooLong,
    #[error("Name already taken")]
    NameTaken,
    #[error("Only the host can start the game")]
    OnlyHostCanStart,
    #[error("Only the host can change settings")]
    OnlyHostCanChangeSettings,
    #[error("Settings can only be changed in the lobby")]
    SettingsLockedAfterLobby,
    #[error("Need at least {MIN_PLAYERS} players to start")]
    NotEnoughPlayers,
    #[error("Only the clue-giver can advance")]
    OnlyClueGiverCanAdvance,
    #[error("Cannot advance from this state")]
    CannotAdvance,
    #[error("Player not in game")]
    PlayerNotInGame,
    #[error("Clue-giver cannot guess")]
    ClueGiverCannotGuess,
    #[error("Not in a guess phase")]
    NotInGuessPhase,
    #[error("Guess is outside the color grid")]
    GuessOutOfRange,
    #[error("Guess already locked in")]
    AlreadyLockedIn,
    #[error("Clues are only typed in remote mode")]
    ClueRequiresRemoteMode,
    #[error("Only the clue-giver can submit a clue")]
    OnlyClueGiverCanSubmitClue,
    #[error("Not in a clue phase")]
    NotInCluePhase,
    #[error("Clue must be exactly {0} word(s)")]
    ClueWordCount(usize),
    #[error("Only the current clue-giver can end the game")]
    OnlyClueGiverCanEnd,
    #[error("Can only end game from leaderboard")]
    EndOnlyFromLeaderboard,
    #[error("Game is not finished")]
    NotFinished,
    #[error("could not allocate a unique game code")]
    CodeSpaceExhausted,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GameError {
    /// Grepable error code for logs and structured responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "E_GAME_NOT_FOUND",
            Self::AlreadyStarted => "E_ALREADY_STARTED",
            Self::GameFull => "E_GAME_FULL",
            Self::NameRequired => "E_NAME_REQUIRED",
            Self::NameTooLong => "E_NAME_TOO_LONG",
            Self::NameTaken => "E_NAME_TAKEN",
            Self::OnlyHostCanStart => "E_NOT_HOST",
            Self::OnlyHostCanChangeSettings => "E_NOT_HOST",
            Self::SettingsLockedAfterLobby => "E_SETTINGS_LOCKED",
            Self::NotEnoughPlayers => "E_NOT_ENOUGH_PLAYERS",
            Self::OnlyClueGiverCanAdvance => "E_NOT_CLUE_GIVER",
            Self::CannotAdvance => "E_CANNOT_ADVANCE",
            Self::PlayerNotInGame => "E_PLAYER_NOT_IN_GAME",
            Self::ClueGiverCannotGuess => "E_CLUE_GIVER_CANNOT_GUESS",
            Self::NotInGuessPhase => "E_NOT_IN_GUESS_PHASE",
            Self::GuessOutOfRange => "E_GUESS_OUT_OF_RANGE",
            Self::AlreadyLockedIn => "E_ALREADY_LOCKED_IN",
            Self::ClueRequiresRemoteMode => "E_CLUE_REQUIRES_REMOTE",
            Self::OnlyClueGiverCanSubmitClue => "E_NOT_CLUE_GIVER",
            Self::NotInCluePhase => "E_NOT_IN_CLUE_PHASE",
            Self::ClueWordCount(_) => "E_CLUE_WORD_COUNT",
            Self::OnlyClueGiverCanEnd => "E_NOT_CLUE_GIVER",
            Self::EndOnlyFromLeaderboard => "E_END_ONLY_FROM_LEADERBOARD",
            Self::NotFinished => "E_NOT_FINISHED",
            Self::CodeSpaceExhausted => "E_CODE_SPACE_EXHAUSTED",
            Self::Store(_) => "E_STORE",
        }
    }

    /// Infrastructure faults get logged in full but reported generically.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::CodeSpaceExhausted)
    }
}

/// Fetch a game or map its absence to `NotFound`. Callers hold the
/// session lock.
async fn fetch(state: &AppState, code: &str) -> Result<Game, GameError> {
    match state.store.get(code).await? {
        Some(game) => Ok(game),
        None => {
            // Drop the lock entry too: polls for bad or expired codes
            // would otherwise grow the table for the process lifetime.
            state.locks.remove(code).await;
            Err(GameError::NotFound)
        }
    }
}

// =============================================================================
// CREATE / JOIN / LEAVE
// =============================================================================

/// Create a game in the lobby with the creator as host. The creator is
/// not a participant until they join.
///
/// # Errors
///
/// Returns `CodeSpaceExhausted` if no unused code is found after a
/// bounded number of draws, or a store error.
pub async fn create_game(state: &AppState, creator_id: &str) -> Result<Game, GameError> {
    for _ in 0..CODE_ATTEMPTS {
        let code = random_game_code();
        let _guard = state.locks.acquire(&code).await;
        if state.store.get(&code).await?.is_some() {
            continue;
        }
        let game = Game::new(code, creator_id.to_string(), now_ms());
        state.store.put(&game).await?;
        info!(code = %game.code, host = %creator_id, "game created");
        return Ok(game);
    }
    Err(GameError::CodeSpaceExhausted)
}

/// Join a lobby, or reconnect an existing participant (idempotent).
///
/// # Errors
///
/// `NotFound`, `AlreadyStarted`, or a name/capacity validation error.
pub async fn join_game(
    state: &AppState,
    code: &str,
    player_id: &str,
    name: &str,
) -> Result<Game, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;

    if game.phase != Phase::Lobby {
        return Err(GameError::AlreadyStarted);
    }

    // Known participant: reconnect without touching the name.
    if let Some(player) = game.player_mut(player_id) {
        player.connected = true;
        player.last_seen = now_ms();
        state.store.put(&game).await?;
        return Ok(game);
    }

    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GameError::NameRequired);
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(GameError::NameTooLong);
    }
    if game.name_taken(trimmed) {
        return Err(GameError::NameTaken);
    }
    if game.players.len() >= MAX_PLAYERS {
        return Err(GameError::GameFull);
    }

    game.push_player(player_id.to_string(), trimmed.to_string(), now_ms());
    state.store.put(&game).await?;
    info!(code = %game.code, player = %player_id, players = game.players.len(), "player joined");
    Ok(game)
}

/// Leave a game. In the lobby the player is removed outright (host
/// reassigned, empty games deleted); once started they are only marked
/// disconnected so round history and colors stay stable. If the
/// departure leaves every connected guesser locked in, the active guess
/// phase concludes.
///
/// # Errors
///
/// `NotFound` or a store error. Leaving is otherwise idempotent.
pub async fn leave_game(
    state: &AppState,
    code: &str,
    player_id: &str,
) -> Result<Option<Game>, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;

    if game.phase == Phase::Lobby {
        game.players.retain(|p| p.id != player_id);

        if game.players.is_empty() {
            state.store.delete(code).await?;
            state.locks.remove(code).await;
            info!(code = %game.code, "empty lobby deleted");
            return Ok(None);
        }

        if game.host_id == player_id {
            // Earliest remaining joiner inherits the lobby.
            if let Some(successor) = game.players.iter().min_by_key(|p| p.joined_at) {
                game.host_id = successor.id.clone();
            }
        }
    } else {
        if let Some(player) = game.player_mut(player_id) {
            player.connected = false;
        }
        // The departing player may have been the last unlocked guesser;
        // with the timer off nothing else re-checks the exit condition,
        // so the phase would strand here.
        if let Some(guess_number) = game.phase.guess_number() {
            if round::all_guessers_locked(&game, guess_number) {
                round::conclude_guess_phase(&mut game, guess_number, now_ms());
            }
        }
    }

    state.store.put(&game).await?;
    info!(code = %game.code, player = %player_id, "player left");
    Ok(Some(game))
}

// =============================================================================
// START / SETTINGS
// =============================================================================

/// Start the game: host-only, lobby-only, needs a quorum. The host gives
/// the first clue.
///
/// # Errors
///
/// `OnlyHostCanStart`, `AlreadyStarted`, or `NotEnoughPlayers`.
pub async fn start_game(state: &AppState, code: &str, player_id: &str) -> Result<Game, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;

    if game.host_id != player_id {
        return Err(GameError::OnlyHostCanStart);
    }
    if game.phase != Phase::Lobby {
        return Err(GameError::AlreadyStarted);
    }
    if game.players.len() < MIN_PLAYERS {
        return Err(GameError::NotEnoughPlayers);
    }

    game.clue_giver_id = Some(game.host_id.clone());
    round::start_round(&mut game, now_ms());
    state.store.put(&game).await?;
    info!(code = %game.code, players = game.players.len(), "game started");
    Ok(game)
}

/// Merge a partial settings payload. Host-only, lobby-only.
///
/// # Errors
///
/// `OnlyHostCanChangeSettings` or `SettingsLockedAfterLobby`.
pub async fn update_settings(
    state: &AppState,
    code: &str,
    player_id: &str,
    patch: SettingsPatch,
) -> Result<Game, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;

    if game.host_id != player_id {
        return Err(GameError::OnlyHostCanChangeSettings);
    }
    if game.phase != Phase::Lobby {
        return Err(GameError::SettingsLockedAfterLobby);
    }

    if let Some(mode) = patch.mode {
        game.settings.mode = mode;
    }
    if let Some(complexity) = patch.complexity {
        game.settings.complexity = complexity;
    }
    if let Some(timer_enabled) = patch.timer_enabled {
        game.settings.timer_enabled = timer_enabled;
    }

    state.store.put(&game).await?;
    Ok(game)
}

// =============================================================================
// PHASE ADVANCE
// =============================================================================

/// Voluntary phase advance by the clue-giver (clue phases, reveal, and
/// the leaderboard, which rolls into the next round). Guess phases
/// conclude on their own and cannot be advanced from here.
///
/// # Errors
///
/// `OnlyClueGiverCanAdvance` for the wrong actor, `CannotAdvance` from
/// any phase without a voluntary edge.
pub async fn advance_phase(state: &AppState, code: &str, player_id: &str) -> Result<Game, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;
    let now = now_ms();

    if !game.phase.clue_giver_advances() {
        return Err(GameError::CannotAdvance);
    }
    if game.clue_giver_id.as_deref() != Some(player_id) {
        return Err(GameError::OnlyClueGiverCanAdvance);
    }

    if game.phase == Phase::Leaderboard {
        round::start_round(&mut game, now);
    } else {
        let Some(next) = game.phase.next() else {
            return Err(GameError::CannotAdvance);
        };
        game.phase = next;
        game.phase_deadline = round::deadline_for(next, &game.settings, now);
    }

    state.store.put(&game).await?;
    info!(code = %game.code, phase = ?game.phase, "phase advanced");
    Ok(game)
}

// =============================================================================
// GUESS / CLUE INTAKE
// =============================================================================

/// Place or update a guess for the active slot, optionally locking it.
/// If this lock-in is the last one outstanding among connected guessers,
/// the guess phase concludes in the same call.
///
/// # Errors
///
/// `PlayerNotInGame`, `ClueGiverCannotGuess`, `NotInGuessPhase`,
/// `GuessOutOfRange`, or `AlreadyLockedIn`.
pub async fn submit_guess(
    state: &AppState,
    code: &str,
    player_id: &str,
    hue: i64,
    chroma: i64,
    lock_in: bool,
) -> Result<Game, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;

    if game.player(player_id).is_none() {
        return Err(GameError::PlayerNotInGame);
    }
    if game.clue_giver_id.as_deref() == Some(player_id) {
        return Err(GameError::ClueGiverCannotGuess);
    }
    let Some(guess_number) = game.phase.guess_number() else {
        return Err(GameError::NotInGuessPhase);
    };

    let dims = game.grid();
    let hue = u32::try_from(hue).map_err(|_| GameError::GuessOutOfRange)?;
    let chroma = u32::try_from(chroma).map_err(|_| GameError::GuessOutOfRange)?;
    if hue >= dims.hue_segments || chroma >= dims.chroma_levels {
        return Err(GameError::GuessOutOfRange);
    }

    match game.guess_mut(player_id, guess_number) {
        Some(guess) if guess.locked_in => return Err(GameError::AlreadyLockedIn),
        Some(guess) => {
            guess.hue = hue;
            guess.chroma = chroma;
            guess.locked_in |= lock_in;
        }
        None => {
            let round_number = game.round_number;
            game.guesses.push(crate::game::Guess {
                player_id: player_id.to_string(),
                round_number,
                guess_number,
                hue,
                chroma,
                locked_in: lock_in,
                distance: None,
            });
        }
    }

    // Last connected guesser locking in concludes the phase atomically
    // with this write; the timer path can no longer double-fire because
    // both run under the session lock and the check is phase-guarded.
    if lock_in && round::all_guessers_locked(&game, guess_number) {
        round::conclude_guess_phase(&mut game, guess_number, now_ms());
    }

    state.store.put(&game).await?;
    Ok(game)
}

/// Record the typed clue in remote mode. Does not advance the phase; the
/// clue-giver still advances voluntarily (or the timer does).
///
/// # Errors
///
/// `ClueRequiresRemoteMode`, `OnlyClueGiverCanSubmitClue`,
/// `NotInCluePhase`, or `ClueWordCount` when the word count does not
/// match the phase (one word in `clue-1`, two in `clue-2`).
pub async fn submit_clue(
    state: &AppState,
    code: &str,
    player_id: &str,
    clue: &str,
) -> Result<Game, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;

    if game.settings.mode != GameMode::Remote {
        return Err(GameError::ClueRequiresRemoteMode);
    }
    if game.clue_giver_id.as_deref() != Some(player_id) {
        return Err(GameError::OnlyClueGiverCanSubmitClue);
    }
    let Some(expected_words) = game.phase.clue_word_count() else {
        return Err(GameError::NotInCluePhase);
    };

    let trimmed = clue.trim();
    if trimmed.split_whitespace().count() != expected_words {
        return Err(GameError::ClueWordCount(expected_words));
    }

    game.current_clue = Some(trimmed.to_string());
    state.store.put(&game).await?;
    Ok(game)
}

// =============================================================================
// END / PLAY AGAIN
// =============================================================================

/// Finish the game. Clue-giver-only, from the leaderboard only.
///
/// # Errors
///
/// `OnlyClueGiverCanEnd` or `EndOnlyFromLeaderboard`.
pub async fn end_game(state: &AppState, code: &str, player_id: &str) -> Result<Game, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;

    if game.clue_giver_id.as_deref() != Some(player_id) {
        return Err(GameError::OnlyClueGiverCanEnd);
    }
    if game.phase != Phase::Leaderboard {
        return Err(GameError::EndOnlyFromLeaderboard);
    }

    game.phase = Phase::Finished;
    game.phase_deadline = None;
    state.store.put(&game).await?;
    info!(code = %game.code, "game finished");
    Ok(game)
}

/// Reset a finished game back to the lobby with the same roster: scores
/// zeroed, rounds cleared, host returned to the earliest original
/// joiner. Any participant may trigger it.
///
/// # Errors
///
/// `NotFinished` outside the finished phase, `PlayerNotInGame` for
/// strangers.
pub async fn play_again(state: &AppState, code: &str, player_id: &str) -> Result<Game, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;

    if game.phase != Phase::Finished {
        return Err(GameError::NotFinished);
    }
    if game.player(player_id).is_none() {
        return Err(GameError::PlayerNotInGame);
    }

    for player in &mut game.players {
        player.total_score = 0;
    }
    if let Some(original_host) = game.players.iter().min_by_key(|p| p.joined_at) {
        game.host_id = original_host.id.clone();
    }
    game.clue_giver_id = None;
    game.round_number = 0;
    game.target = None;
    game.guesses.clear();
    game.round_scores.clear();
    game.current_clue = None;
    game.phase = Phase::Lobby;
    game.phase_deadline = None;

    state.store.put(&game).await?;
    info!(code = %game.code, "lobby reopened for another game");
    Ok(game)
}

// =============================================================================
// POLL
// =============================================================================

/// Read the current snapshot, applying any overdue timer transition
/// first and refreshing the polling player's presence.
///
/// # Errors
///
/// `NotFound` or a store error.
pub async fn poll_game(
    state: &AppState,
    code: &str,
    player_id: Option<&str>,
) -> Result<Game, GameError> {
    let _guard = state.locks.acquire(code).await;
    let mut game = fetch(state, code).await?;
    let now = now_ms();

    let mut changed = round::check_timer(&mut game, now);

    if let Some(player_id) = player_id {
        if let Some(player) = game.player_mut(player_id) {
            player.connected = true;
            player.last_seen = now;
            changed = true;
        }
    }

    if changed {
        state.store.put(&game).await?;
    }
    Ok(game)
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
