//! Viewer-local card layout.
//!
//! # Responsibility
//! - Resolve the position and tilt used to draw each note.
//! - Own the random placement, tilt and shuffle rules shared by both variants.
//!
//! # Invariants
//! - A resolved layout is reused until drag, shuffle or clear replaces it.
//! - Random placement stays within `[pad, max(pad, board - card - pad)]`.

use crate::model::geometry::{BoardSize, Position, ViewProps, CARD_HEIGHT, CARD_WIDTH};
use crate::model::note::{Note, NoteId};
use crate::store::StoreResult;
use rand::rngs::StdRng;
use rand::Rng;

pub mod embedded;
pub mod view_cache;

pub use embedded::EmbeddedLayout;
pub use view_cache::{ViewStateCache, VIEW_STATE_KEY};

/// Inset used when placing a card at random.
pub const PLACEMENT_PADDING: f64 = 28.0;
/// Degrees drawn for an automatic tilt.
pub const TILT_CHOICES: [f64; 8] = [-7.0, -5.0, -3.0, -2.0, 2.0, 3.0, 5.0, 7.0];
/// Chance that a shuffle also nudges a card's tilt.
pub const SHUFFLE_TILT_PROBABILITY: f64 = 0.6;
/// Largest tilt nudge applied by a shuffle, in degrees.
pub const SHUFFLE_TILT_JITTER: f64 = 2.0;

/// Storage of resolved card layouts.
pub trait ViewLayout: Send {
    /// Returns the layout for `note`, creating and persisting one if absent.
    fn resolve(&mut self, note: &Note, board: BoardSize, rng: &mut StdRng)
        -> StoreResult<ViewProps>;

    /// Overwrites one card layout.
    fn store(&mut self, id: &str, props: ViewProps) -> StoreResult<()>;

    /// Overwrites several card layouts in one persisted write.
    fn store_batch(&mut self, updates: &[(NoteId, ViewProps)]) -> StoreResult<()>;

    /// Drops every cached layout.
    fn clear(&mut self) -> StoreResult<()>;
}

/// Uniform random position inside the padded board interior.
///
/// Draws x then y. A board smaller than a card, or with a non-finite
/// dimension, collapses to `(pad, pad)` on that axis without drawing.
pub fn random_position<R: Rng + ?Sized>(board: BoardSize, rng: &mut R) -> Position {
    let x = sample_axis(board.width - CARD_WIDTH - PLACEMENT_PADDING, rng);
    let y = sample_axis(board.height - CARD_HEIGHT - PLACEMENT_PADDING, rng);
    Position { x, y }
}

/// One of [`TILT_CHOICES`], uniformly.
pub fn random_tilt<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    TILT_CHOICES[rng.gen_range(0..TILT_CHOICES.len())]
}

/// Fresh position and tilt for an uncached card.
pub fn random_view_props<R: Rng + ?Sized>(board: BoardSize, rng: &mut R) -> ViewProps {
    let position = random_position(board, rng);
    ViewProps {
        x: position.x,
        y: position.y,
        tilt: random_tilt(rng),
    }
}

/// Shuffled layout for one card.
///
/// Draw order: x, y, tilt coin, then the tilt nudge when the coin hits.
pub fn shuffle_view_props<R: Rng + ?Sized>(
    current: ViewProps,
    board: BoardSize,
    rng: &mut R,
) -> ViewProps {
    let position = random_position(board, rng);
    let mut tilt = current.tilt;
    if rng.gen::<f64>() < SHUFFLE_TILT_PROBABILITY {
        tilt += rng.gen_range(-SHUFFLE_TILT_JITTER..=SHUFFLE_TILT_JITTER);
    }
    ViewProps {
        x: position.x,
        y: position.y,
        tilt,
    }
}

fn sample_axis<R: Rng + ?Sized>(upper: f64, rng: &mut R) -> f64 {
    if !upper.is_finite() || upper <= PLACEMENT_PADDING {
        return PLACEMENT_PADDING;
    }
    rng.gen_range(PLACEMENT_PADDING..=upper)
}

#[cfg(test)]
mod tests {
    use super::{
        random_position, random_tilt, shuffle_view_props, PLACEMENT_PADDING, TILT_CHOICES,
    };
    use crate::model::geometry::{BoardSize, ViewProps};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_position_stays_inside_padded_interior() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = BoardSize::new(900.0, 600.0);
        for _ in 0..500 {
            let position = random_position(board, &mut rng);
            assert!(position.x >= PLACEMENT_PADDING && position.x <= 900.0 - 240.0 - 28.0);
            assert!(position.y >= PLACEMENT_PADDING && position.y <= 600.0 - 170.0 - 28.0);
        }
    }

    #[test]
    fn tiny_board_collapses_to_padded_corner() {
        let mut rng = StdRng::seed_from_u64(1);
        let position = random_position(BoardSize::new(100.0, 50.0), &mut rng);
        assert_eq!(position.x, PLACEMENT_PADDING);
        assert_eq!(position.y, PLACEMENT_PADDING);
    }

    #[test]
    fn non_finite_board_collapses_to_padded_corner() {
        let mut rng = StdRng::seed_from_u64(1);
        let position = random_position(BoardSize::new(f64::INFINITY, f64::NAN), &mut rng);
        assert_eq!(position.x, PLACEMENT_PADDING);
        assert_eq!(position.y, PLACEMENT_PADDING);
    }

    #[test]
    fn random_tilt_draws_from_discrete_set() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(TILT_CHOICES.contains(&random_tilt(&mut rng)));
        }
    }

    #[test]
    fn shuffle_nudges_tilt_by_at_most_jitter() {
        let mut rng = StdRng::seed_from_u64(11);
        let current = ViewProps {
            x: 0.0,
            y: 0.0,
            tilt: 5.0,
        };
        for _ in 0..200 {
            let next = shuffle_view_props(current, BoardSize::new(800.0, 500.0), &mut rng);
            assert!((next.tilt - current.tilt).abs() <= 2.0);
        }
    }
}
