//! Color model — grid geometry, perceptual distance, and random draws.
//!
//! DESIGN
//! ======
//! The play surface is a discrete (hue, chroma) grid whose resolution is
//! fixed by the lobby's complexity setting. Everything here is a pure
//! function over that grid: cell-to-CSS-color mapping, a bounded
//! symmetric distance used for scoring, and the random draws for round
//! targets and game codes. Nothing in this module touches game state.

use rand::Rng;
use serde::{Deserialize, Serialize};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Game-code alphabet. Uppercase + digits with `I`, `O`, `0`, `1` removed
/// so codes survive being read aloud or typed from a phone.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a game code.
pub const CODE_LENGTH: usize = 6;

/// Marker colors for player avatars, assigned by join order (wrapping).
pub const PLAYER_COLORS: [&str; 12] = [
    "#FF6B6B", // red
    "#4ECDC4", // teal
    "#45B7D1", // sky blue
    "#96CEB4", // sage
    "#FFEAA7", // yellow
    "#DDA0DD", // plum
    "#98D8C8", // mint
    "#F7DC6F", // gold
    "#BB8FCE", // purple
    "#85C1E9", // light blue
    "#F8B500", // orange
    "#58D68D", // green
];

/// Fixed OKLCH lightness for every grid cell.
const CELL_LIGHTNESS: f64 = 0.65;

/// OKLCH chroma floor; keeps even the inner ring vivid.
const CHROMA_MIN: f64 = 0.13;

/// OKLCH chroma span from the inner ring to the rim.
const CHROMA_SPAN: f64 = 0.12;

// =============================================================================
// GRID TYPES
// =============================================================================

/// Grid resolution chosen in the lobby.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Normal,
    Complex,
}

/// Dimensions of the active color grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDims {
    /// Number of hue segments around the wheel.
    pub hue_segments: u32,
    /// Number of chroma rings from center to rim.
    pub chroma_levels: u32,
}

impl Complexity {
    /// Fixed complexity → resolution lookup.
    #[must_use]
    pub fn grid(self) -> GridDims {
        match self {
            Complexity::Simple => GridDims { hue_segments: 12, chroma_levels: 10 },
            Complexity::Normal => GridDims { hue_segments: 24, chroma_levels: 20 },
            Complexity::Complex => GridDims { hue_segments: 36, chroma_levels: 28 },
        }
    }
}

/// One cell on the color grid. Indices are always interpreted against a
/// specific [`GridDims`]; the type itself carries no resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub hue: u32,
    pub chroma: u32,
}

// =============================================================================
// COLOR MAPPING
// =============================================================================

/// Map a grid cell to an OKLCH CSS color string.
///
/// Hue is spread evenly over 360°, chroma over `[0.13, 0.25]`, lightness
/// fixed for uniform perceived brightness. Deterministic.
#[must_use]
pub fn cell_to_color(cell: GridCell, dims: GridDims) -> String {
    let hue = f64::from(cell.hue) / f64::from(dims.hue_segments) * 360.0;
    let chroma = CHROMA_MIN + f64::from(cell.chroma) / f64::from(dims.chroma_levels - 1) * CHROMA_SPAN;
    format!("oklch({CELL_LIGHTNESS} {chroma:.4} {hue})")
}

// =============================================================================
// DISTANCE
// =============================================================================

/// Score a guess against the target: `0` for an exact hit, `100` at the
/// opposite hue with maximum chroma delta.
///
/// Hue difference takes the shorter arc around the wheel and is normalized
/// by half the segment count; chroma difference is normalized by the ring
/// count. The two are combined as a Euclidean norm in normalized space and
/// scaled so the worst corner lands exactly on 100. Symmetric by
/// construction.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn distance(target: GridCell, guess: GridCell, dims: GridDims) -> u32 {
    let hue_diff = target.hue.abs_diff(guess.hue);
    let hue_diff = hue_diff.min(dims.hue_segments - hue_diff);
    let hue_norm = f64::from(hue_diff) / (f64::from(dims.hue_segments) / 2.0);

    let chroma_diff = target.chroma.abs_diff(guess.chroma);
    let chroma_norm = f64::from(chroma_diff) / f64::from(dims.chroma_levels - 1);

    let euclidean = hue_norm.hypot(chroma_norm);
    let score = (euclidean / std::f64::consts::SQRT_2 * 100.0).round();
    score.min(100.0) as u32
}

// =============================================================================
// RANDOM DRAWS
// =============================================================================

/// Draw a uniform random target cell for a new round.
#[must_use]
pub fn random_target(dims: GridDims) -> GridCell {
    let mut rng = rand::rng();
    GridCell {
        hue: rng.random_range(0..dims.hue_segments),
        chroma: rng.random_range(0..dims.chroma_levels),
    }
}

/// Draw a 6-character game code from the reduced alphabet.
///
/// Uniqueness is not guaranteed here; the engine checks the store for
/// collisions before committing a new game.
#[must_use]
pub fn random_game_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
#[path = "color_test.rs"]
mod tests;
