//! Pointer-driven card dragging.
//!
//! # Responsibility
//! - Run one `Idle → Dragging → Idle` machine per card.
//! - Translate pointer displacement into clamped card positions.
//!
//! # Invariants
//! - Presses on the delete affordance never start a drag.
//! - Moves are clamped to `[DRAG_PADDING, board - card - DRAG_PADDING]` per
//!   axis, the lower bound winning on boards smaller than a card.
//! - Only the pointer that started a drag moves the card.
//! - Machines of different cards never affect each other.

use crate::model::geometry::{clamp_axis, BoardSize, CardSize, Position};
use crate::model::note::NoteId;
use std::collections::HashMap;

/// Inset kept between a dragged card and the board edge.
pub const DRAG_PADDING: f64 = 10.0;

/// Element under the pointer on press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Card,
    DeleteButton,
}

/// Pointer event payload in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: i64,
    pub x: f64,
    pub y: f64,
}

impl PointerSample {
    pub fn new(pointer_id: i64, x: f64, y: f64) -> Self {
        Self { pointer_id, x, y }
    }
}

/// Side effect requested by a drag transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEffect {
    CapturePointer { id: NoteId, pointer_id: i64 },
    Raise { id: NoteId },
    Moved { id: NoteId, position: Position },
    Released { id: NoteId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging {
        pointer_id: i64,
        press: Position,
        origin: Position,
    },
}

/// Drag machines keyed by card id; absent means idle.
#[derive(Debug, Default)]
pub struct DragController {
    states: HashMap<NoteId, DragState>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self, id: &str) -> bool {
        matches!(self.state(id), DragState::Dragging { .. })
    }

    /// Number of cards currently being dragged.
    pub fn active_count(&self) -> usize {
        self.states
            .values()
            .filter(|state| matches!(state, DragState::Dragging { .. }))
            .count()
    }

    /// Pointer pressed on card `id` whose current position is `origin`.
    pub fn press(
        &mut self,
        id: &str,
        origin: Position,
        sample: PointerSample,
        target: PointerTarget,
    ) -> Vec<DragEffect> {
        if target == PointerTarget::DeleteButton {
            return Vec::new();
        }
        self.states.insert(
            id.to_string(),
            DragState::Dragging {
                pointer_id: sample.pointer_id,
                press: Position {
                    x: sample.x,
                    y: sample.y,
                },
                origin,
            },
        );
        vec![
            DragEffect::CapturePointer {
                id: id.to_string(),
                pointer_id: sample.pointer_id,
            },
            DragEffect::Raise { id: id.to_string() },
        ]
    }

    /// Pointer moved over card `id`; yields the new clamped position.
    pub fn motion(
        &mut self,
        id: &str,
        sample: PointerSample,
        board: BoardSize,
        card: CardSize,
    ) -> Option<DragEffect> {
        let DragState::Dragging {
            pointer_id,
            press,
            origin,
        } = self.state(id)
        else {
            return None;
        };
        if pointer_id != sample.pointer_id {
            return None;
        }
        let dx = sample.x - press.x;
        let dy = sample.y - press.y;
        let position = Position {
            x: clamp_axis(
                origin.x + dx,
                DRAG_PADDING,
                board.width - card.width - DRAG_PADDING,
            ),
            y: clamp_axis(
                origin.y + dy,
                DRAG_PADDING,
                board.height - card.height - DRAG_PADDING,
            ),
        };
        Some(DragEffect::Moved {
            id: id.to_string(),
            position,
        })
    }

    /// Pointer released or cancelled on card `id`.
    pub fn release(&mut self, id: &str) -> Option<DragEffect> {
        match self.states.remove(id) {
            Some(DragState::Dragging { .. }) => Some(DragEffect::Released { id: id.to_string() }),
            _ => None,
        }
    }

    /// Drops every machine, e.g. after the card set was rebuilt.
    pub fn reset(&mut self) {
        self.states.clear();
    }

    fn state(&self, id: &str) -> DragState {
        self.states.get(id).copied().unwrap_or(DragState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::{DragController, DragEffect, PointerSample, PointerTarget};
    use crate::model::geometry::{BoardSize, CardSize, Position};

    const BOARD: BoardSize = BoardSize {
        width: 800.0,
        height: 600.0,
    };

    fn origin() -> Position {
        Position { x: 100.0, y: 100.0 }
    }

    fn moved_to(effect: Option<DragEffect>) -> Position {
        match effect {
            Some(DragEffect::Moved { position, .. }) => position,
            other => panic!("expected a move, got {other:?}"),
        }
    }

    #[test]
    fn press_on_delete_button_stays_idle() {
        let mut drag = DragController::new();
        let effects = drag.press(
            "a",
            origin(),
            PointerSample::new(1, 10.0, 10.0),
            PointerTarget::DeleteButton,
        );
        assert!(effects.is_empty());
        assert!(!drag.is_dragging("a"));
        assert!(drag
            .motion("a", PointerSample::new(1, 50.0, 50.0), BOARD, CardSize::default())
            .is_none());
    }

    #[test]
    fn motion_applies_displacement_from_press_point() {
        let mut drag = DragController::new();
        let effects = drag.press("a", origin(), PointerSample::new(7, 10.0, 20.0), PointerTarget::Card);
        assert_eq!(
            effects[0],
            DragEffect::CapturePointer {
                id: "a".to_string(),
                pointer_id: 7
            }
        );

        let position = moved_to(drag.motion(
            "a",
            PointerSample::new(7, 40.0, 5.0),
            BOARD,
            CardSize::default(),
        ));
        assert_eq!(position, Position { x: 130.0, y: 85.0 });
    }

    #[test]
    fn motion_is_clamped_to_padded_board() {
        let mut drag = DragController::new();
        drag.press("a", origin(), PointerSample::new(1, 0.0, 0.0), PointerTarget::Card);

        let far = moved_to(drag.motion(
            "a",
            PointerSample::new(1, 5_000.0, 5_000.0),
            BOARD,
            CardSize::default(),
        ));
        assert_eq!(far, Position { x: 550.0, y: 420.0 });

        let near = moved_to(drag.motion(
            "a",
            PointerSample::new(1, -5_000.0, -5_000.0),
            BOARD,
            CardSize::default(),
        ));
        assert_eq!(near, Position { x: 10.0, y: 10.0 });
    }

    #[test]
    fn motion_from_another_pointer_is_ignored() {
        let mut drag = DragController::new();
        drag.press("a", origin(), PointerSample::new(1, 0.0, 0.0), PointerTarget::Card);

        assert!(drag
            .motion("a", PointerSample::new(2, 20.0, 30.0), BOARD, CardSize::default())
            .is_none());
        assert!(drag.is_dragging("a"));
        let position = moved_to(drag.motion(
            "a",
            PointerSample::new(1, 20.0, 30.0),
            BOARD,
            CardSize::default(),
        ));
        assert_eq!(position, Position { x: 120.0, y: 130.0 });
    }

    #[test]
    fn small_board_pins_card_to_padding() {
        let mut drag = DragController::new();
        drag.press("a", origin(), PointerSample::new(1, 0.0, 0.0), PointerTarget::Card);
        let position = moved_to(drag.motion(
            "a",
            PointerSample::new(1, 30.0, 30.0),
            BoardSize::new(200.0, 100.0),
            CardSize::default(),
        ));
        assert_eq!(position, Position { x: 10.0, y: 10.0 });
    }

    #[test]
    fn release_returns_to_idle_and_cards_are_independent() {
        let mut drag = DragController::new();
        drag.press("a", origin(), PointerSample::new(1, 0.0, 0.0), PointerTarget::Card);
        drag.press("b", origin(), PointerSample::new(2, 0.0, 0.0), PointerTarget::Card);
        assert_eq!(drag.active_count(), 2);

        assert!(matches!(drag.release("a"), Some(DragEffect::Released { .. })));
        assert!(drag.release("a").is_none());
        assert!(!drag.is_dragging("a"));
        assert!(drag.is_dragging("b"));
        assert!(drag
            .motion("b", PointerSample::new(2, 1.0, 1.0), BOARD, CardSize::default())
            .is_some());
    }
}
