//! Layout embedded in local note records.
//!
//! # Responsibility
//! - Read a card's position and tilt from its own note record.
//! - Write drag and shuffle results back into the note collection.
//!
//! # Invariants
//! - Values written during this session take precedence over the note
//!   snapshot the board is holding, until the next reload.

use crate::layout::{random_position, random_tilt, ViewLayout};
use crate::model::geometry::{BoardSize, ViewProps};
use crate::model::note::{Note, NoteId};
use crate::store::local::LocalNoteStore;
use crate::store::StoreResult;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Arc;

/// Layout strategy of the local variant.
pub struct EmbeddedLayout {
    store: Arc<LocalNoteStore>,
    written: HashMap<NoteId, ViewProps>,
}

impl EmbeddedLayout {
    pub fn new(store: Arc<LocalNoteStore>) -> Self {
        Self {
            store,
            written: HashMap::new(),
        }
    }
}

impl ViewLayout for EmbeddedLayout {
    fn resolve(
        &mut self,
        note: &Note,
        board: BoardSize,
        rng: &mut StdRng,
    ) -> StoreResult<ViewProps> {
        if let Some(props) = self.written.get(&note.id) {
            return Ok(*props);
        }
        if let Some(position) = note.position() {
            return Ok(ViewProps {
                x: position.x,
                y: position.y,
                tilt: note.tilt.unwrap_or(0.0),
            });
        }

        // Records written without a position get one placed once.
        let position = random_position(board, rng);
        let tilt = note.tilt.unwrap_or_else(|| random_tilt(rng));
        let props = ViewProps {
            x: position.x,
            y: position.y,
            tilt,
        };
        self.store(&note.id, props)?;
        Ok(props)
    }

    fn store(&mut self, id: &str, props: ViewProps) -> StoreResult<()> {
        self.store_batch(&[(id.to_string(), props)])
    }

    fn store_batch(&mut self, updates: &[(NoteId, ViewProps)]) -> StoreResult<()> {
        self.store.write_layout(updates)?;
        for (id, props) in updates {
            self.written.insert(id.clone(), *props);
        }
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.written.clear();
        Ok(())
    }
}
