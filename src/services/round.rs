//! Round progression — start, guess-phase conclusion, timers, scoring.
//!
//! DESIGN
//! ======
//! A guess phase can end two ways: the last connected guesser locks in,
//! or the deadline passes. Both triggers funnel into one routine,
//! `conclude_guess_phase`, so the exit (straggler lock-in, scoring,
//! clue-giver rotation, next deadline) happens exactly once no matter
//! which fires first. The caller holds the game's session lock, which is
//! what makes "exactly once" hold under concurrent polls and lock-ins.
//!
//! Timer expiry is detected lazily: there is no background scheduler,
//! the check runs on every poll and is idempotent. A game whose deadline
//! passes while nobody is watching simply advances on the next touch.

use tracing::info;

use crate::color::{self, GridCell};
use crate::game::{Game, GameSettings, Phase};
use crate::store::env_parse;

/// Default length of each timed phase.
const DEFAULT_PHASE_DURATION_MS: i64 = 30_000;

/// Timed-phase length, overridable via `PHASE_DURATION_MS`.
pub(crate) fn phase_duration_ms() -> i64 {
    env_parse("PHASE_DURATION_MS", DEFAULT_PHASE_DURATION_MS)
}

/// Deadline for entering `phase` at `now`: set only for timed phases
/// when the lobby enabled the timer.
pub(crate) fn deadline_for(phase: Phase, settings: &GameSettings, now: i64) -> Option<i64> {
    (phase.is_timed() && settings.timer_enabled).then(|| now + phase_duration_ms())
}

// =============================================================================
// ROUND START
// =============================================================================

/// Begin a new round: bump the round counter, draw a fresh target for
/// the active grid, enter `clue-1`, and reset per-round state. Used by
/// both game start and the leaderboard → next-round edge.
pub(crate) fn start_round(game: &mut Game, now: i64) {
    game.round_number += 1;
    game.target = Some(color::random_target(game.grid()));
    game.phase = Phase::Clue1;
    game.phase_deadline = deadline_for(Phase::Clue1, &game.settings, now);
    game.round_scores.clear();
    game.current_clue = None;
    // Defensive: no guesses should carry the new round number yet.
    let round = game.round_number;
    game.guesses.retain(|g| g.round_number != round);
    info!(code = %game.code, round, "round started");
}

// =============================================================================
// GUESS-PHASE CONCLUSION
// =============================================================================

/// Whether every connected guesser has locked the given slot for the
/// current round. Disconnected players are not waited on.
pub(crate) fn all_guessers_locked(game: &Game, guess_number: u8) -> bool {
    let locked = |player_id: &str| {
        game.guesses.iter().any(|g| {
            g.player_id == player_id
                && g.round_number == game.round_number
                && g.guess_number == guess_number
                && g.locked_in
        })
    };
    game.guessers().filter(|p| p.connected).all(|p| locked(&p.id))
}

/// The single exit path for a guess phase.
///
/// Locks any placed-but-unlocked guesses for the slot, then transitions:
/// slot 1 moves to `clue-2` with a fresh deadline; slot 2 scores the
/// round, rotates the clue-giver, and enters the untimed `reveal`.
pub(crate) fn conclude_guess_phase(game: &mut Game, guess_number: u8, now: i64) {
    for guess in &mut game.guesses {
        if guess.round_number == game.round_number && guess.guess_number == guess_number {
            guess.locked_in = true;
        }
    }

    if guess_number == 1 {
        game.phase = Phase::Clue2;
        game.phase_deadline = deadline_for(Phase::Clue2, &game.settings, now);
    } else {
        // Scoring first: it runs against the round's clue-giver.
        score_round(game);
        game.clue_giver_id = game.next_clue_giver();
        game.phase = Phase::Reveal;
        game.phase_deadline = None;
    }
    info!(code = %game.code, phase = ?game.phase, guess_number, "guess phase concluded");
}

// =============================================================================
// TIMER CHECK
// =============================================================================

/// Apply the phase transition owed by an expired deadline, if any.
/// Returns whether the game changed. Idempotent: a game with no deadline
/// or an unexpired one is left untouched.
pub(crate) fn check_timer(game: &mut Game, now: i64) -> bool {
    let Some(deadline) = game.phase_deadline else {
        return false;
    };
    if now < deadline {
        return false;
    }

    match game.phase {
        Phase::Clue1 | Phase::Clue2 => {
            // A missing clue is not blocking; the guessers just get less help.
            if let Some(next) = game.phase.next() {
                game.phase = next;
                game.phase_deadline = deadline_for(next, &game.settings, now);
                info!(code = %game.code, phase = ?game.phase, "clue phase timed out");
            }
            true
        }
        Phase::Guess1 => {
            conclude_guess_phase(game, 1, now);
            true
        }
        Phase::Guess2 => {
            conclude_guess_phase(game, 2, now);
            true
        }
        _ => {
            // Untimed phases never carry a deadline; clear a stale one.
            game.phase_deadline = None;
            true
        }
    }
}

// =============================================================================
// SCORING
// =============================================================================

/// Compute the round's score table at the guess-2 exit.
///
/// Each guesser scores the best (minimum) distance across their recorded
/// guesses, or 100 with none recorded. With three or more participants
/// the clue-giver scores the rounded mean of the guessers' points. The
/// table is sorted ascending by distance, stable on ties, and totals are
/// accumulated onto the players.
pub(crate) fn score_round(game: &mut Game) {
    let Some(target) = game.target else {
        return;
    };
    let dims = game.grid();
    let round = game.round_number;
    let clue_giver_id = game.clue_giver_id.clone();
    let guesser_ids: Vec<String> = game.guessers().map(|p| p.id.clone()).collect();

    let mut scores = Vec::with_capacity(guesser_ids.len() + 1);
    for player_id in &guesser_ids {
        let mut best: Option<u32> = None;
        for guess in game
            .guesses
            .iter_mut()
            .filter(|g| g.player_id == *player_id && g.round_number == round)
        {
            let d = color::distance(target, GridCell { hue: guess.hue, chroma: guess.chroma }, dims);
            guess.distance = Some(d);
            best = Some(best.map_or(d, |b| b.min(d)));
        }
        // No guesses at all scores as the worst possible placement.
        let points = best.unwrap_or(100);
        scores.push(crate::game::RoundScore {
            player_id: player_id.clone(),
            distance: points,
            points,
            is_clue_giver: false,
        });
        if let Some(player) = game.player_mut(player_id) {
            player.total_score += points;
        }
    }

    // The clue-giver is scored on the table's quality, but only when the
    // round had a real audience; head-to-head games score guessers only.
    if game.players.len() > 2 {
        if let Some(clue_giver) = clue_giver_id {
            if !scores.is_empty() {
                let total: u32 = scores.iter().map(|s| s.points).sum();
                let count = u32::try_from(scores.len()).unwrap_or(1);
                let mean = (total + count / 2) / count;
                scores.push(crate::game::RoundScore {
                    player_id: clue_giver.clone(),
                    distance: mean,
                    points: mean,
                    is_clue_giver: true,
                });
                if let Some(player) = game.player_mut(&clue_giver) {
                    player.total_score += mean;
                }
            }
        }
    }

    // Stable sort keeps encounter order for equal distances.
    scores.sort_by_key(|s| s.distance);
    game.round_scores = scores;
}

#[cfg(test)]
#[path = "round_test.rs"]
mod tests;
