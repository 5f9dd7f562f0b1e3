//! On-device note store.
//!
//! # Responsibility
//! - Keep the whole note collection as one JSON array under [`NOTES_KEY`].
//! - Embed each note's position and tilt directly in its record.
//!
//! # Invariants
//! - Every write is a read-modify-write of the full collection.
//! - New notes are appended, so `load_all` returns creation order.
//! - Layout writes (drag/shuffle) do not notify subscribers.

use crate::model::geometry::ViewProps;
use crate::model::note::{Note, NoteDraft, NoteId};
use crate::store::kv::{read_json, write_json, KvStore};
use crate::store::{FeedHub, NoteFeed, NoteStore, StoreResult, StoreVariant};
use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

/// Storage key holding the serialized note collection.
pub const NOTES_KEY: &str = "pinned_board_notes_v1";

/// Note store persisting to a local key-value store.
pub struct LocalNoteStore {
    kv: Arc<dyn KvStore>,
    feed: FeedHub,
}

impl LocalNoteStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            feed: FeedHub::new(),
        }
    }

    /// Overwrites position and tilt of the listed notes in one write.
    ///
    /// Ids that are no longer stored are ignored.
    pub fn write_layout(&self, updates: &[(NoteId, ViewProps)]) -> StoreResult<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut notes = self.read_notes()?;
        for note in notes.iter_mut() {
            if let Some((_, props)) = updates.iter().find(|(id, _)| *id == note.id) {
                note.set_position(props.position());
                note.tilt = Some(props.tilt);
            }
        }
        self.write_notes(&notes)
    }

    fn read_notes(&self) -> StoreResult<Vec<Note>> {
        read_json(self.kv.as_ref(), NOTES_KEY)
    }

    fn write_notes(&self, notes: &[Note]) -> StoreResult<()> {
        write_json(self.kv.as_ref(), NOTES_KEY, notes)
    }

    fn commit(&self, notes: &[Note]) -> StoreResult<()> {
        self.write_notes(notes)?;
        self.feed.publish(notes);
        Ok(())
    }
}

impl NoteStore for LocalNoteStore {
    fn variant(&self) -> StoreVariant {
        StoreVariant::Local
    }

    fn load_all(&self) -> StoreResult<Vec<Note>> {
        self.read_notes()
    }

    fn create(&self, draft: &NoteDraft, placement: ViewProps) -> StoreResult<NoteId> {
        let draft = draft.normalize()?;
        let mut note = Note {
            id: Uuid::new_v4().to_string(),
            author: draft.author,
            text: draft.text,
            color: draft.color,
            tilt: Some(placement.tilt),
            created_at: chrono::Utc::now().timestamp_millis(),
            ..Note::default()
        };
        note.set_position(placement.position());
        let id = note.id.clone();

        let mut notes = self.read_notes()?;
        notes.push(note);
        self.commit(&notes)?;

        info!(
            "event=note_create module=store variant=local status=ok count={}",
            notes.len()
        );
        Ok(id)
    }

    fn remove(&self, id: &str) -> StoreResult<()> {
        let mut notes = self.read_notes()?;
        let before = notes.len();
        notes.retain(|note| note.id != id);
        self.commit(&notes)?;

        info!(
            "event=note_delete module=store variant=local status=ok removed={}",
            before - notes.len()
        );
        Ok(())
    }

    fn clear_all(&self) -> StoreResult<()> {
        self.kv.remove(NOTES_KEY)?;
        self.feed.publish(&[]);
        info!("event=board_clear module=store variant=local status=ok");
        Ok(())
    }

    fn subscribe(&self) -> StoreResult<NoteFeed> {
        let feed = self.feed.subscribe();
        let notes = self.read_notes()?;
        debug!(
            "event=feed_open module=store variant=local count={}",
            notes.len()
        );
        self.feed.publish(&notes);
        Ok(feed)
    }
}
