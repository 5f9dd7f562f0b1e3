//! Per-viewer layout cache for shared notes.
//!
//! # Invariants
//! - Loaded once at construction; every mutation persists the whole map.
//! - An entry, once created, is returned unchanged until `set` or `clear`.

use crate::layout::{random_view_props, ViewLayout};
use crate::model::geometry::{BoardSize, ViewProps};
use crate::model::note::{Note, NoteId};
use crate::store::kv::{read_json, write_json, KvStore};
use crate::store::StoreResult;
use log::{debug, info};
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Storage key holding the serialized id → layout map.
pub const VIEW_STATE_KEY: &str = "pinned_board_view_v1";

/// Map from note id to the viewer's layout of that card.
pub struct ViewStateCache {
    kv: Arc<dyn KvStore>,
    entries: BTreeMap<NoteId, ViewProps>,
}

impl ViewStateCache {
    /// Loads the cache; corrupt or missing content starts empty.
    pub fn load(kv: Arc<dyn KvStore>) -> StoreResult<Self> {
        let entries: BTreeMap<NoteId, ViewProps> = read_json(kv.as_ref(), VIEW_STATE_KEY)?;
        debug!(
            "event=view_cache_load module=layout status=ok entries={}",
            entries.len()
        );
        Ok(Self { kv, entries })
    }

    /// Cached entry for `id`, or a freshly placed one that is then persisted.
    pub fn get(&mut self, id: &str, board: BoardSize, rng: &mut StdRng) -> StoreResult<ViewProps> {
        if let Some(props) = self.entries.get(id) {
            return Ok(*props);
        }
        let props = random_view_props(board, rng);
        self.entries.insert(id.to_string(), props);
        self.persist()?;
        Ok(props)
    }

    /// Cached entry without creating one.
    pub fn peek(&self, id: &str) -> Option<ViewProps> {
        self.entries.get(id).copied()
    }

    pub fn set(&mut self, id: &str, props: ViewProps) -> StoreResult<()> {
        self.entries.insert(id.to_string(), props);
        self.persist()
    }

    pub fn set_many(&mut self, updates: &[(NoteId, ViewProps)]) -> StoreResult<()> {
        for (id, props) in updates {
            self.entries.insert(id.clone(), *props);
        }
        self.persist()
    }

    /// Drops every entry and erases the persisted map.
    pub fn clear(&mut self) -> StoreResult<()> {
        self.entries.clear();
        self.kv.remove(VIEW_STATE_KEY)?;
        info!("event=view_cache_clear module=layout status=ok");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> StoreResult<()> {
        write_json(self.kv.as_ref(), VIEW_STATE_KEY, &self.entries)
    }
}

impl ViewLayout for ViewStateCache {
    fn resolve(
        &mut self,
        note: &Note,
        board: BoardSize,
        rng: &mut StdRng,
    ) -> StoreResult<ViewProps> {
        self.get(&note.id, board, rng)
    }

    fn store(&mut self, id: &str, props: ViewProps) -> StoreResult<()> {
        self.set(id, props)
    }

    fn store_batch(&mut self, updates: &[(NoteId, ViewProps)]) -> StoreResult<()> {
        self.set_many(updates)
    }

    fn clear(&mut self) -> StoreResult<()> {
        ViewStateCache::clear(self)
    }
}
