//! Note lifecycle controller.
//!
//! # Responsibility
//! - Create, delete, filter, shuffle and clear notes for one viewer.
//! - Drive per-card drag machines and write their results back.
//! - Apply pushed snapshots with last-write-wins semantics.
//!
//! # Invariants
//! - Blank drafts are dropped without touching storage or the surface.
//! - Shuffle and drag never modify shared note content.
//! - Local clear removes every note; shared clear removes only this
//!   viewer's layout cache.

use crate::config::{BoardConfig, ControlId, OptionalControls};
use crate::drag::{DragController, DragEffect, PointerSample, PointerTarget};
use crate::layout::{
    random_position, random_tilt, shuffle_view_props, EmbeddedLayout, ViewLayout, ViewStateCache,
};
use crate::model::geometry::{BoardSize, CardSize, ViewProps};
use crate::model::note::{Note, NoteDraft, NoteId, TiltChoice};
use crate::render::{build_cards, paint, BoardSurface};
use crate::store::kv::KvStore;
use crate::store::local::LocalNoteStore;
use crate::store::remote::{DocumentStore, IdentityProvider};
use crate::store::shared::SharedNoteStore;
use crate::store::{NoteFeed, NoteStore, StoreError, StoreVariant};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type BoardResult<T> = Result<T, BoardError>;

/// Board-level error.
#[derive(Debug)]
pub enum BoardError {
    /// A required interactive control is absent at startup.
    MissingDependency(ControlId),
    /// Persistence or remote failure.
    Store(StoreError),
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDependency(control) => {
                write!(f, "required control `{}` is missing", control.as_str())
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingDependency(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for BoardError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Application state of one board session.
pub struct Board<S: BoardSurface> {
    store: Arc<dyn NoteStore>,
    layout: Box<dyn ViewLayout>,
    surface: S,
    feed: Option<NoteFeed>,
    rng: StdRng,
    notes: Vec<Note>,
    filter: String,
    board: BoardSize,
    card: CardSize,
    controls: OptionalControls,
    drag: DragController,
}

impl<S: BoardSurface> Board<S> {
    /// Assembles a board from already constructed capabilities.
    ///
    /// Call [`Board::start`] before use.
    pub fn new(
        store: Arc<dyn NoteStore>,
        layout: Box<dyn ViewLayout>,
        surface: S,
        config: &BoardConfig,
        controls: OptionalControls,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            layout,
            surface,
            feed: None,
            rng,
            notes: Vec::new(),
            filter: String::new(),
            board: config.board,
            card: config.card,
            controls,
            drag: DragController::new(),
        }
    }

    /// Opens a started board persisting to the on-device store.
    pub fn open_local(
        kv: Arc<dyn KvStore>,
        surface: S,
        config: &BoardConfig,
        available: &[ControlId],
    ) -> BoardResult<Self> {
        let controls = config.resolve_controls(available)?;
        let store = Arc::new(LocalNoteStore::new(kv));
        let layout = Box::new(EmbeddedLayout::new(Arc::clone(&store)));
        let mut board = Self::new(store, layout, surface, config, controls);
        board.start()?;
        Ok(board)
    }

    /// Opens a started board on a realtime document store.
    ///
    /// `kv` holds only this viewer's layout cache.
    pub fn open_shared(
        kv: Arc<dyn KvStore>,
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        surface: S,
        config: &BoardConfig,
        available: &[ControlId],
    ) -> BoardResult<Self> {
        let controls = config.resolve_controls(available)?;
        let store = Arc::new(SharedNoteStore::new(documents, identity).with_limit(config.feed_limit));
        let layout = Box::new(ViewStateCache::load(kv)?);
        let mut board = Self::new(store, layout, surface, config, controls);
        board.start()?;
        Ok(board)
    }

    /// Connects the store, opens the snapshot feed and draws the first frame.
    ///
    /// A failed sign-in is reported and the board stays readable; writes
    /// then fail until an identity exists.
    pub fn start(&mut self) -> BoardResult<()> {
        if let Err(err) = self.store.connect() {
            warn!(
                "event=board_start module=board status=degraded variant={} error={err}",
                self.variant().as_str()
            );
            self.surface.notify(&err.to_string());
        }
        self.feed = Some(self.store.subscribe()?);
        self.pump()?;
        info!(
            "event=board_start module=board status=ok variant={} notes={}",
            self.variant().as_str(),
            self.notes.len()
        );
        Ok(())
    }

    /// Applies the most recent pending snapshot, if any, and re-renders.
    ///
    /// Returns whether a snapshot was applied.
    pub fn pump(&mut self) -> BoardResult<bool> {
        let Some(snapshot) = self.feed.as_ref().and_then(NoteFeed::latest) else {
            return Ok(false);
        };
        self.notes = snapshot;
        self.render()?;
        Ok(true)
    }

    /// Rebuilds every card from the current notes and filter.
    ///
    /// Returns the number of cards drawn.
    pub fn render(&mut self) -> BoardResult<usize> {
        let cards = build_cards(
            &self.notes,
            &self.filter,
            self.layout.as_mut(),
            self.board,
            &mut self.rng,
        )?;
        self.drag.reset();
        paint(&mut self.surface, &cards);
        debug!(
            "event=render module=board status=ok notes={} cards={}",
            self.notes.len(),
            cards.len()
        );
        Ok(cards.len())
    }

    /// Posts a note from composer input.
    ///
    /// Returns `Ok(None)` when the draft text is blank; nothing is written.
    pub fn create(&mut self, draft: &NoteDraft) -> BoardResult<Option<NoteId>> {
        let draft = match draft.normalize() {
            Ok(draft) => draft,
            Err(err) => {
                debug!("event=note_create module=board status=skipped reason={err}");
                return Ok(None);
            }
        };

        let placement = self.placement_for(&draft);
        let id = match self.store.create(&draft, placement.unwrap_or_default()) {
            Ok(id) => id,
            Err(err) => return Err(self.report(err)),
        };
        // Shared documents carry no tilt; an explicit one seeds this viewer's cache.
        if self.variant() == StoreVariant::Shared {
            if let Some(placement) = placement {
                self.layout.store(&id, placement)?;
            }
        }
        self.surface.reset_composer();
        self.pump()?;
        Ok(Some(id))
    }

    /// Deletes one note. Failures are reported and change nothing.
    pub fn delete(&mut self, id: &str) -> BoardResult<()> {
        if let Err(err) = self.store.remove(id) {
            return Err(self.report(err));
        }
        self.pump()?;
        Ok(())
    }

    /// Replaces the filter text and re-renders.
    pub fn set_filter(&mut self, filter: &str) -> BoardResult<usize> {
        self.filter = filter.to_string();
        self.render()
    }

    /// Re-places every loaded note and nudges some tilts.
    ///
    /// Returns `false` when the shuffle control is not enabled.
    pub fn shuffle(&mut self) -> BoardResult<bool> {
        if !self.controls.shuffle {
            debug!("event=shuffle module=board status=disabled");
            return Ok(false);
        }

        let mut updates = Vec::with_capacity(self.notes.len());
        for note in &self.notes {
            let current = self.layout.resolve(note, self.board, &mut self.rng)?;
            let next = shuffle_view_props(current, self.board, &mut self.rng);
            updates.push((note.id.clone(), next));
        }
        self.layout.store_batch(&updates)?;
        info!(
            "event=shuffle module=board status=ok cards={}",
            updates.len()
        );
        self.render()?;
        Ok(true)
    }

    /// Clears the board.
    ///
    /// Local: every note is removed. Shared: only this viewer's layout cache
    /// is dropped; shared notes stay untouched for everyone.
    pub fn clear(&mut self) -> BoardResult<()> {
        match self.variant() {
            StoreVariant::Local => {
                if let Err(err) = self.store.clear_all() {
                    return Err(self.report(err));
                }
                self.layout.clear()?;
                self.pump()?;
            }
            StoreVariant::Shared => {
                self.layout.clear()?;
                self.render()?;
            }
        }
        info!(
            "event=board_clear module=board status=ok variant={}",
            self.variant().as_str()
        );
        Ok(())
    }

    /// Updates the board interior size and re-renders.
    pub fn resize(&mut self, board: BoardSize) -> BoardResult<usize> {
        self.board = board;
        self.render()
    }

    /// Updates the measured card size used for drag clamping.
    pub fn set_card_size(&mut self, card: CardSize) {
        self.card = card;
    }

    /// Moves focus to the composer when that control is enabled.
    pub fn focus_composer(&mut self) -> bool {
        if !self.controls.focus_composer {
            return false;
        }
        self.surface.focus_composer();
        true
    }

    pub fn pointer_down(
        &mut self,
        id: &str,
        sample: PointerSample,
        target: PointerTarget,
    ) -> BoardResult<()> {
        let Some(note) = self.notes.iter().find(|note| note.id == id) else {
            return Ok(());
        };
        let current = self.layout.resolve(note, self.board, &mut self.rng)?;
        for effect in self.drag.press(id, current.position(), sample, target) {
            self.apply_drag_effect(effect)?;
        }
        Ok(())
    }

    pub fn pointer_move(&mut self, id: &str, sample: PointerSample) -> BoardResult<()> {
        match self.drag.motion(id, sample, self.board, self.card) {
            Some(effect) => self.apply_drag_effect(effect),
            None => Ok(()),
        }
    }

    pub fn pointer_up(&mut self, id: &str) -> BoardResult<()> {
        match self.drag.release(id) {
            Some(effect) => self.apply_drag_effect(effect),
            None => Ok(()),
        }
    }

    pub fn pointer_cancel(&mut self, id: &str) -> BoardResult<()> {
        self.pointer_up(id)
    }

    /// Resolved layout of a loaded note.
    pub fn view_props(&mut self, id: &str) -> BoardResult<Option<ViewProps>> {
        let Some(note) = self.notes.iter().find(|note| note.id == id) else {
            return Ok(None);
        };
        Ok(Some(self.layout.resolve(note, self.board, &mut self.rng)?))
    }

    /// Sets one card's layout directly.
    pub fn set_view_props(&mut self, id: &str, props: ViewProps) -> BoardResult<()> {
        self.layout.store(id, props)?;
        Ok(())
    }

    pub fn variant(&self) -> StoreVariant {
        self.store.variant()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn board_size(&self) -> BoardSize {
        self.board
    }

    pub fn controls(&self) -> OptionalControls {
        self.controls
    }

    pub fn is_dragging(&self, id: &str) -> bool {
        self.drag.is_dragging(id)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Layout for a new note, or `None` when a shared note with an automatic
    /// tilt gets its layout from the view cache at render.
    fn placement_for(&mut self, draft: &NoteDraft) -> Option<ViewProps> {
        if self.variant() == StoreVariant::Shared && draft.tilt == TiltChoice::Auto {
            return None;
        }
        let position = random_position(self.board, &mut self.rng);
        let tilt = match draft.tilt {
            TiltChoice::Fixed(degrees) => degrees,
            TiltChoice::Auto => random_tilt(&mut self.rng),
        };
        Some(ViewProps {
            x: position.x,
            y: position.y,
            tilt,
        })
    }

    fn apply_drag_effect(&mut self, effect: DragEffect) -> BoardResult<()> {
        match effect {
            DragEffect::CapturePointer { id, pointer_id } => {
                self.surface.capture_pointer(&id, pointer_id);
            }
            DragEffect::Raise { id } => self.surface.raise_card(&id),
            DragEffect::Moved { id, position } => {
                let Some(note) = self.notes.iter().find(|note| note.id == id) else {
                    self.drag.release(&id);
                    return Ok(());
                };
                let current = self.layout.resolve(note, self.board, &mut self.rng)?;
                self.layout.store(&id, current.with_position(position))?;
                self.surface.move_card(&id, position);
            }
            DragEffect::Released { id } => {
                debug!("event=drag_end module=board status=ok card={id}");
            }
        }
        Ok(())
    }

    fn report(&mut self, err: StoreError) -> BoardError {
        warn!(
            "event=board_action module=board status=error variant={} error={err}",
            self.variant().as_str()
        );
        self.surface.notify(&err.to_string());
        BoardError::Store(err)
    }
}
