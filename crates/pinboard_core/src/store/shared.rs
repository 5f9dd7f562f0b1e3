//! Realtime shared note store.
//!
//! # Responsibility
//! - Map the `NoteStore` contract onto a `DocumentStore` + `IdentityProvider`.
//! - Re-deliver the full recent collection to subscribers on every remote
//!   change.
//!
//! # Invariants
//! - Writes are refused until an anonymous identity has been issued.
//! - Created notes become visible only through a pushed snapshot.
//! - Shared notes are never bulk-deleted.
//! - The change listener is unregistered when the store is dropped.

use crate::model::geometry::ViewProps;
use crate::model::note::{Note, NoteDraft, NoteId};
use crate::store::remote::{
    DocumentStore, Identity, IdentityProvider, NoteFields, RemoteDocument, RemoteError, WatchId,
};
use crate::store::{lock, FeedHub, NoteFeed, NoteStore, StoreError, StoreResult, StoreVariant};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};

/// Default cap on the number of most recent notes delivered.
pub const DEFAULT_FEED_LIMIT: usize = 200;

/// Note store backed by a realtime document store.
pub struct SharedNoteStore {
    documents: Arc<dyn DocumentStore>,
    identity_provider: Arc<dyn IdentityProvider>,
    identity: Mutex<Option<Identity>>,
    feed: Arc<FeedHub>,
    watch: Mutex<Option<WatchId>>,
    limit: usize,
}

impl SharedNoteStore {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            documents,
            identity_provider,
            identity: Mutex::new(None),
            feed: Arc::new(FeedHub::new()),
            watch: Mutex::new(None),
            limit: DEFAULT_FEED_LIMIT,
        }
    }

    /// Overrides the number of most recent notes delivered.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Identity used for writes, once issued.
    pub fn identity(&self) -> Option<Identity> {
        lock(&self.identity).clone()
    }

    fn require_identity(&self) -> StoreResult<Identity> {
        self.identity().ok_or(StoreError::IdentityPending)
    }

    fn ensure_watch(&self) -> StoreResult<()> {
        let mut watch = lock(&self.watch);
        if watch.is_some() {
            return Ok(());
        }

        let documents = Arc::clone(&self.documents);
        let feed = Arc::clone(&self.feed);
        let limit = self.limit;
        let id = self
            .documents
            .watch(Box::new(move || match fetch_notes(documents.as_ref(), limit) {
                Ok(notes) => feed.publish(&notes),
                Err(err) => warn!(
                    "event=feed_push module=store variant=shared status=error error={err}"
                ),
            }))
            .map_err(network_error)?;
        *watch = Some(id);
        Ok(())
    }
}

impl Drop for SharedNoteStore {
    fn drop(&mut self) {
        if let Some(id) = lock(&self.watch).take() {
            self.documents.unwatch(id);
            debug!("event=feed_unwatch module=store variant=shared status=ok");
        }
    }
}

impl NoteStore for SharedNoteStore {
    fn variant(&self) -> StoreVariant {
        StoreVariant::Shared
    }

    fn connect(&self) -> StoreResult<()> {
        if self.identity().is_some() {
            return Ok(());
        }
        match self.identity_provider.sign_in_anonymously() {
            Ok(identity) => {
                info!("event=sign_in module=store variant=shared status=ok");
                *lock(&self.identity) = Some(identity);
                Ok(())
            }
            Err(err) => {
                error!("event=sign_in module=store variant=shared status=error error={err}");
                Err(network_error(err))
            }
        }
    }

    fn load_all(&self) -> StoreResult<Vec<Note>> {
        fetch_notes(self.documents.as_ref(), self.limit).map_err(network_error)
    }

    fn create(&self, draft: &NoteDraft, _placement: ViewProps) -> StoreResult<NoteId> {
        let identity = self.require_identity()?;
        let draft = draft.normalize()?;
        let fields = NoteFields {
            author: draft.author,
            text: draft.text,
            color: draft.color,
        };

        match self.documents.insert(&fields, &identity) {
            Ok(id) => {
                info!("event=note_create module=store variant=shared status=ok");
                Ok(id)
            }
            Err(err) => {
                error!("event=note_create module=store variant=shared status=error error={err}");
                Err(network_error(err))
            }
        }
    }

    fn remove(&self, id: &str) -> StoreResult<()> {
        let identity = self.require_identity()?;
        match self.documents.delete(id, &identity) {
            Ok(()) => {
                info!("event=note_delete module=store variant=shared status=ok");
                Ok(())
            }
            Err(RemoteError::PermissionDenied) => {
                warn!("event=note_delete module=store variant=shared status=denied");
                Err(StoreError::PermissionDenied(id.to_string()))
            }
            Err(err) => {
                error!("event=note_delete module=store variant=shared status=error error={err}");
                Err(network_error(err))
            }
        }
    }

    fn clear_all(&self) -> StoreResult<()> {
        Err(StoreError::Unsupported(
            "shared notes are never bulk-deleted",
        ))
    }

    fn subscribe(&self) -> StoreResult<NoteFeed> {
        self.ensure_watch()?;
        let feed = self.feed.subscribe();
        let notes = self.load_all()?;
        self.feed.publish(&notes);
        Ok(feed)
    }
}

fn fetch_notes(documents: &dyn DocumentStore, limit: usize) -> Result<Vec<Note>, RemoteError> {
    Ok(documents
        .query_recent(limit)?
        .into_iter()
        .map(document_to_note)
        .collect())
}

fn document_to_note(document: RemoteDocument) -> Note {
    Note {
        id: document.id,
        author: document.author,
        text: document.text,
        color: document.color,
        created_at: document
            .created_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        owner_id: Some(document.owner_id),
        ..Note::default()
    }
}

fn network_error(err: RemoteError) -> StoreError {
    StoreError::Network(err.to_string())
}
