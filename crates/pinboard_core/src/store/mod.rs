//! Note persistence adapters.
//!
//! # Responsibility
//! - Define the single `NoteStore` contract shared by both board variants.
//! - Deliver full-collection snapshots to subscribers after every change.
//!
//! # Invariants
//! - `load_all` preserves the source ordering (local: creation order,
//!   shared: creation time descending, capped by the feed limit).
//! - A failed write leaves persisted state unchanged.
//! - Corrupt local content degrades to an empty collection, never an error.

use crate::db::DbError;
use crate::model::geometry::ViewProps;
use crate::model::note::{DraftError, Note, NoteDraft, NoteId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard};

pub mod kv;
pub mod local;
pub mod remote;
pub mod shared;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence-layer error.
#[derive(Debug)]
pub enum StoreError {
    /// Draft text is empty after trimming.
    Validation(DraftError),
    /// Remote ownership rule rejected the delete.
    PermissionDenied(NoteId),
    /// Remote call failed (create/delete/sign-in/query).
    Network(String),
    /// Create/delete attempted before an identity was issued.
    IdentityPending,
    /// Operation not offered by this variant.
    Unsupported(&'static str),
    /// Key-value backend failure.
    Kv(DbError),
    /// Serialization of a persisted value failed.
    Encode(serde_json::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::PermissionDenied(id) => {
                write!(f, "you can only delete notes you posted (note {id})")
            }
            Self::Network(message) => write!(f, "network request failed: {message}"),
            Self::IdentityPending => write!(f, "still signing in; try again in a moment"),
            Self::Unsupported(what) => write!(f, "unsupported operation: {what}"),
            Self::Kv(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode stored value: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Kv(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::PermissionDenied(_)
            | Self::Network(_)
            | Self::IdentityPending
            | Self::Unsupported(_) => None,
        }
    }
}

impl From<DraftError> for StoreError {
    fn from(value: DraftError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Kv(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Kv(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Persistence strategy selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreVariant {
    /// On-device storage, single-user semantics.
    #[default]
    Local,
    /// Realtime document store, multi-user semantics.
    Shared,
}

impl StoreVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Shared => "shared",
        }
    }
}

/// Persistence contract for pinboard notes.
pub trait NoteStore: Send + Sync {
    fn variant(&self) -> StoreVariant;

    /// Acquires whatever identity the store needs before writes.
    fn connect(&self) -> StoreResult<()> {
        Ok(())
    }

    fn load_all(&self) -> StoreResult<Vec<Note>>;

    /// Persists a new note and returns its identifier.
    ///
    /// `placement` seeds the embedded position/tilt where the variant keeps
    /// them in the note record; other variants ignore it.
    fn create(&self, draft: &NoteDraft, placement: ViewProps) -> StoreResult<NoteId>;

    fn remove(&self, id: &str) -> StoreResult<()>;

    /// Removes every note. Only offered by the local variant.
    fn clear_all(&self) -> StoreResult<()>;

    /// Opens a snapshot feed, primed with the current collection.
    fn subscribe(&self) -> StoreResult<NoteFeed>;
}

/// Receiving end of a snapshot subscription.
pub struct NoteFeed {
    receiver: Receiver<Vec<Note>>,
}

impl NoteFeed {
    /// Drains pending snapshots and returns the most recent one.
    ///
    /// Older snapshots are discarded; there is no merge of stale and fresh
    /// collections.
    pub fn latest(&self) -> Option<Vec<Note>> {
        self.receiver.try_iter().last()
    }
}

/// Fan-out of snapshots to every live feed.
#[derive(Default)]
pub struct FeedHub {
    senders: Mutex<Vec<Sender<Vec<Note>>>>,
}

impl FeedHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> NoteFeed {
        let (sender, receiver) = mpsc::channel();
        lock(&self.senders).push(sender);
        NoteFeed { receiver }
    }

    /// Sends one snapshot to every feed, dropping closed ones.
    pub fn publish(&self, snapshot: &[Note]) {
        lock(&self.senders).retain(|sender| sender.send(snapshot.to_vec()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.senders).len()
    }
}

/// Locks a mutex, recovering the data from a poisoned lock.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::FeedHub;
    use crate::model::note::Note;

    fn note(id: &str) -> Note {
        Note {
            id: id.to_string(),
            text: "t".to_string(),
            ..Note::default()
        }
    }

    #[test]
    fn feed_returns_only_most_recent_snapshot() {
        let hub = FeedHub::new();
        let feed = hub.subscribe();
        hub.publish(&[note("a")]);
        hub.publish(&[note("a"), note("b")]);

        let latest = feed.latest().expect("snapshot should be pending");
        assert_eq!(latest.len(), 2);
        assert!(feed.latest().is_none());
    }

    #[test]
    fn publish_drops_closed_feeds() {
        let hub = FeedHub::new();
        let feed = hub.subscribe();
        let _kept = hub.subscribe();
        drop(feed);

        hub.publish(&[]);
        assert_eq!(hub.subscriber_count(), 1);
    }
}
