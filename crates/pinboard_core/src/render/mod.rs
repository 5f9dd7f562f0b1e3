//! Card rendering.
//!
//! # Responsibility
//! - Turn the note list plus a text filter into the ordered set of cards to
//!   draw, with each card's resolved layout applied.
//! - Define the surface trait through which the host draws cards, moves
//!   them during drags and shows notices.
//!
//! # Invariants
//! - Rendering is a full rebuild: the surface is cleared before cards are
//!   appended.
//! - Cards keep note-list order.
//! - Rendering twice with the same notes and filter yields identical cards.

use crate::layout::ViewLayout;
use crate::model::geometry::{BoardSize, Position};
use crate::model::note::{Note, NoteId};
use crate::store::StoreResult;
use rand::rngs::StdRng;
use std::collections::HashMap;

pub mod date;

pub use date::format_created_at;

/// One drawable card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub id: NoteId,
    /// Author, or the anonymous placeholder.
    pub author_label: String,
    pub date_label: String,
    pub text: String,
    /// Style variant, e.g. `paper-lemon`.
    pub css_class: String,
    pub left: f64,
    pub top: f64,
    /// Rotation in degrees.
    pub rotation_deg: f64,
}

impl CardView {
    pub fn position(&self) -> Position {
        Position {
            x: self.left,
            y: self.top,
        }
    }

    /// CSS transform value for the card rotation.
    pub fn transform(&self) -> String {
        format!("rotate({}deg)", self.rotation_deg)
    }
}

/// Host-side drawing surface.
pub trait BoardSurface: Send {
    /// Removes every drawn card.
    fn clear_cards(&mut self);
    /// Appends one card with delete and drag affordances wired.
    fn append_card(&mut self, card: &CardView);
    /// Moves an already drawn card.
    fn move_card(&mut self, id: &str, position: Position);
    /// Brings a card to the top of the stacking order.
    fn raise_card(&mut self, id: &str);
    /// Routes further events of `pointer_id` to the card.
    fn capture_pointer(&mut self, id: &str, pointer_id: i64);
    /// Shows a blocking, non-fatal notice to the acting user.
    fn notify(&mut self, message: &str);
    /// Clears the message field after a successful submit.
    fn reset_composer(&mut self);
    /// Moves input focus to the message field.
    fn focus_composer(&mut self);
}

/// Normalizes filter input for [`Note::matches`].
pub fn normalize_filter(filter: &str) -> String {
    filter.trim().to_lowercase()
}

/// Builds the cards for every note matching `filter`, in list order.
///
/// Notes without a cached layout get one created through `layout`.
pub fn build_cards(
    notes: &[Note],
    filter: &str,
    layout: &mut dyn ViewLayout,
    board: BoardSize,
    rng: &mut StdRng,
) -> StoreResult<Vec<CardView>> {
    let needle = normalize_filter(filter);
    let mut cards = Vec::new();
    for note in notes.iter().filter(|note| note.matches(&needle)) {
        let props = layout.resolve(note, board, rng)?;
        cards.push(CardView {
            id: note.id.clone(),
            author_label: note.author_label().to_string(),
            date_label: format_created_at(note.created_at),
            text: note.text.clone(),
            css_class: note.color.css_class(),
            left: props.x,
            top: props.y,
            rotation_deg: props.tilt,
        });
    }
    Ok(cards)
}

/// Clears `surface` and appends `cards` in order.
pub fn paint(surface: &mut dyn BoardSurface, cards: &[CardView]) {
    surface.clear_cards();
    for card in cards {
        surface.append_card(card);
    }
}

/// In-memory surface recording what a host would draw.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    cards: Vec<CardView>,
    stacking: HashMap<NoteId, u64>,
    next_layer: u64,
    captured: HashMap<NoteId, i64>,
    notices: Vec<String>,
    composer_resets: usize,
    composer_focus_requests: usize,
    paint_count: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[CardView] {
        &self.cards
    }

    pub fn card(&self, id: &str) -> Option<&CardView> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Stacking layer of a raised card; higher draws on top.
    pub fn layer(&self, id: &str) -> Option<u64> {
        self.stacking.get(id).copied()
    }

    pub fn captured_pointer(&self, id: &str) -> Option<i64> {
        self.captured.get(id).copied()
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Takes pending notices, leaving none behind.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn composer_resets(&self) -> usize {
        self.composer_resets
    }

    pub fn composer_focus_requests(&self) -> usize {
        self.composer_focus_requests
    }

    /// Number of full rebuilds performed.
    pub fn paint_count(&self) -> usize {
        self.paint_count
    }
}

impl BoardSurface for RecordingSurface {
    fn clear_cards(&mut self) {
        self.cards.clear();
        self.captured.clear();
        self.paint_count += 1;
    }

    fn append_card(&mut self, card: &CardView) {
        self.cards.push(card.clone());
    }

    fn move_card(&mut self, id: &str, position: Position) {
        if let Some(card) = self.cards.iter_mut().find(|card| card.id == id) {
            card.left = position.x;
            card.top = position.y;
        }
    }

    fn raise_card(&mut self, id: &str) {
        self.next_layer += 1;
        self.stacking.insert(id.to_string(), self.next_layer);
    }

    fn capture_pointer(&mut self, id: &str, pointer_id: i64) {
        self.captured.insert(id.to_string(), pointer_id);
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }

    fn reset_composer(&mut self) {
        self.composer_resets += 1;
    }

    fn focus_composer(&mut self) {
        self.composer_focus_requests += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{build_cards, paint, BoardSurface, RecordingSurface};
    use crate::layout::ViewStateCache;
    use crate::model::geometry::BoardSize;
    use crate::model::note::{Note, NoteColor};
    use crate::store::kv::MemoryKvStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn note(id: &str, author: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            author: author.to_string(),
            text: text.to_string(),
            color: NoteColor::Peach,
            created_at: 1_700_000_000_000,
            ..Note::default()
        }
    }

    fn visible_ids(filter: &str) -> Vec<String> {
        let notes = vec![note("1", "Ann", "hello"), note("2", "Bob", "world")];
        let mut cache = ViewStateCache::load(Arc::new(MemoryKvStore::new())).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        build_cards(&notes, filter, &mut cache, BoardSize::new(800.0, 600.0), &mut rng)
            .unwrap()
            .into_iter()
            .map(|card| card.id)
            .collect()
    }

    #[test]
    fn filter_is_case_insensitive_over_author_and_text() {
        assert_eq!(visible_ids("ann"), vec!["1"]);
        assert_eq!(visible_ids("  WORLD "), vec!["2"]);
        assert_eq!(visible_ids(""), vec!["1", "2"]);
        assert!(visible_ids("xyz").is_empty());
    }

    #[test]
    fn cards_carry_labels_style_and_rotation() {
        let notes = vec![note("1", "", "hello")];
        let mut cache = ViewStateCache::load(Arc::new(MemoryKvStore::new())).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let cards =
            build_cards(&notes, "", &mut cache, BoardSize::new(800.0, 600.0), &mut rng).unwrap();

        let card = &cards[0];
        assert_eq!(card.author_label, "Anonymous");
        assert_eq!(card.css_class, "paper-peach");
        assert!(!card.date_label.is_empty());
        assert_eq!(card.transform(), format!("rotate({}deg)", card.rotation_deg));
    }

    #[test]
    fn paint_rebuilds_surface_from_scratch() {
        let notes = vec![note("1", "Ann", "hello"), note("2", "Bob", "world")];
        let mut cache = ViewStateCache::load(Arc::new(MemoryKvStore::new())).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let board = BoardSize::new(800.0, 600.0);
        let mut surface = RecordingSurface::new();

        let first = build_cards(&notes, "", &mut cache, board, &mut rng).unwrap();
        paint(&mut surface, &first);
        let second = build_cards(&notes, "", &mut cache, board, &mut rng).unwrap();
        paint(&mut surface, &second);

        assert_eq!(first, second);
        assert_eq!(surface.cards(), second.as_slice());
        assert_eq!(surface.paint_count(), 2);

        surface.notify("boom");
        assert_eq!(surface.take_notices(), vec!["boom".to_string()]);
        assert!(surface.notices().is_empty());
    }
}
