//! External collaborators of the shared variant.
//!
//! # Responsibility
//! - Describe the realtime document store and the anonymous identity
//!   service as traits the shared note store is written against.
//! - Provide in-process implementations that enforce the same rules
//!   (ordering, server timestamps, owner-only delete, change push).
//!
//! # Invariants
//! - `query_recent` orders by creation time descending, newest insert first
//!   on equal timestamps.
//! - `delete` succeeds only when the caller identity owns the document.
//! - Watchers run after the store lock is released.
//! - An unwatched listener never runs again.

use crate::model::note::{NoteColor, NoteId};
use crate::store::lock;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Error reported by a remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Access rules rejected the request.
    PermissionDenied,
    /// Target document does not exist.
    NotFound,
    /// Service could not be reached or failed.
    Unavailable(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::NotFound => write!(f, "document not found"),
            Self::Unavailable(message) => write!(f, "service unavailable: {message}"),
        }
    }
}

impl Error for RemoteError {}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Identity issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
}

/// Shared note content sent on create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFields {
    pub author: String,
    pub text: String,
    pub color: NoteColor,
}

/// Note document as returned by the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub id: NoteId,
    pub author: String,
    pub text: String,
    pub color: NoteColor,
    /// Server timestamp, epoch milliseconds. `None` while pending.
    pub created_at: Option<i64>,
    pub owner_id: String,
}

/// Change listener registered with [`DocumentStore::watch`].
pub type WatchListener = Box<dyn Fn() + Send + Sync>;

/// Registration handle returned by [`DocumentStore::watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

/// Realtime document store holding note documents.
pub trait DocumentStore: Send + Sync {
    /// Most recent documents, creation time descending.
    fn query_recent(&self, limit: usize) -> RemoteResult<Vec<RemoteDocument>>;
    /// Inserts a document owned by `owner` with a server timestamp.
    fn insert(&self, fields: &NoteFields, owner: &Identity) -> RemoteResult<NoteId>;
    /// Deletes a document; rejected unless `caller` owns it.
    fn delete(&self, id: &str, caller: &Identity) -> RemoteResult<()>;
    /// Registers a listener run after every insert/update/delete.
    fn watch(&self, listener: WatchListener) -> RemoteResult<WatchId>;
    /// Drops a listener; unknown ids are ignored.
    fn unwatch(&self, id: WatchId);
}

/// Anonymous identity issuance.
pub trait IdentityProvider: Send + Sync {
    fn sign_in_anonymously(&self) -> RemoteResult<Identity>;
}

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

struct StoredDocument {
    document: RemoteDocument,
    seq: u64,
}

#[derive(Default)]
struct DocumentTable {
    documents: Vec<StoredDocument>,
    next_seq: u64,
    unavailable: Option<String>,
}

impl DocumentTable {
    fn check_available(&self) -> RemoteResult<()> {
        match &self.unavailable {
            Some(reason) => Err(RemoteError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

/// In-process document store with owner-only delete rules.
pub struct MemoryDocumentStore {
    table: Mutex<DocumentTable>,
    watchers: Mutex<WatcherTable>,
    clock: Clock,
}

#[derive(Default)]
struct WatcherTable {
    listeners: Vec<(WatchId, Arc<WatchListener>)>,
    next_id: u64,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::with_clock(|| chrono::Utc::now().timestamp_millis())
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `clock` for server timestamps.
    pub fn with_clock(clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        Self {
            table: Mutex::new(DocumentTable::default()),
            watchers: Mutex::new(WatcherTable::default()),
            clock: Arc::new(clock),
        }
    }

    /// Makes every call fail with `Unavailable(reason)` until restored.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        lock(&self.table).unavailable = reason.map(str::to_string);
    }

    pub fn len(&self) -> usize {
        lock(&self.table).documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of registered change listeners.
    pub fn watcher_count(&self) -> usize {
        lock(&self.watchers).listeners.len()
    }

    fn notify(&self) {
        let watchers: Vec<Arc<WatchListener>> = lock(&self.watchers)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        debug!(
            "event=remote_push module=store watchers={}",
            watchers.len()
        );
        for watcher in watchers {
            (**watcher)();
        }
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn query_recent(&self, limit: usize) -> RemoteResult<Vec<RemoteDocument>> {
        let table = lock(&self.table);
        table.check_available()?;

        let mut ordered: Vec<&StoredDocument> = table.documents.iter().collect();
        ordered.sort_by(|a, b| {
            b.document
                .created_at
                .cmp(&a.document.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(ordered
            .into_iter()
            .take(limit)
            .map(|stored| stored.document.clone())
            .collect())
    }

    fn insert(&self, fields: &NoteFields, owner: &Identity) -> RemoteResult<NoteId> {
        let id = {
            let mut table = lock(&self.table);
            table.check_available()?;
            let id = Uuid::new_v4().simple().to_string();
            let seq = table.next_seq;
            table.next_seq += 1;
            table.documents.push(StoredDocument {
                document: RemoteDocument {
                    id: id.clone(),
                    author: fields.author.clone(),
                    text: fields.text.clone(),
                    color: fields.color,
                    created_at: Some((self.clock)()),
                    owner_id: owner.uid.clone(),
                },
                seq,
            });
            id
        };
        self.notify();
        Ok(id)
    }

    fn delete(&self, id: &str, caller: &Identity) -> RemoteResult<()> {
        {
            let mut table = lock(&self.table);
            table.check_available()?;
            let index = table
                .documents
                .iter()
                .position(|stored| stored.document.id == id)
                .ok_or(RemoteError::NotFound)?;
            if table.documents[index].document.owner_id != caller.uid {
                return Err(RemoteError::PermissionDenied);
            }
            table.documents.remove(index);
        }
        self.notify();
        Ok(())
    }

    fn watch(&self, listener: WatchListener) -> RemoteResult<WatchId> {
        lock(&self.table).check_available()?;
        let mut watchers = lock(&self.watchers);
        let id = WatchId(watchers.next_id);
        watchers.next_id += 1;
        watchers.listeners.push((id, Arc::new(listener)));
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        lock(&self.watchers)
            .listeners
            .retain(|(registered, _)| *registered != id);
    }
}

/// Identity service issuing a fresh anonymous uid per sign-in.
#[derive(Debug, Default)]
pub struct AnonymousIdentity {
    fixed_uid: Option<String>,
}

impl AnonymousIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always issues `uid`; used to act as a known viewer.
    pub fn fixed(uid: impl Into<String>) -> Self {
        Self {
            fixed_uid: Some(uid.into()),
        }
    }
}

impl IdentityProvider for AnonymousIdentity {
    fn sign_in_anonymously(&self) -> RemoteResult<Identity> {
        let uid = self
            .fixed_uid
            .clone()
            .unwrap_or_else(|| format!("anon-{}", Uuid::new_v4().simple()));
        Ok(Identity { uid })
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentStore, Identity, MemoryDocumentStore, NoteFields, RemoteError};
    use crate::model::note::NoteColor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fields(text: &str) -> NoteFields {
        NoteFields {
            author: "Ann".to_string(),
            text: text.to_string(),
            color: NoteColor::Sky,
        }
    }

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
        }
    }

    #[test]
    fn query_orders_newest_first_and_applies_limit() {
        let store = MemoryDocumentStore::with_clock(|| 1_000);
        let owner = identity("u1");
        for text in ["one", "two", "three"] {
            store.insert(&fields(text), &owner).unwrap();
        }

        let docs = store.query_recent(2).unwrap();
        let texts: Vec<_> = docs.iter().map(|doc| doc.text.as_str()).collect();
        assert_eq!(texts, vec!["three", "two"]);
    }

    #[test]
    fn delete_requires_matching_owner() {
        let store = MemoryDocumentStore::new();
        let id = store.insert(&fields("mine"), &identity("owner")).unwrap();

        let err = store.delete(&id, &identity("intruder")).unwrap_err();
        assert_eq!(err, RemoteError::PermissionDenied);
        assert_eq!(store.len(), 1);

        store.delete(&id, &identity("owner")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn watchers_fire_on_every_change() {
        let store = MemoryDocumentStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        store
            .watch(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        let id = store.insert(&fields("hi"), &identity("u")).unwrap();
        store.delete(&id, &identity("u")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unwatched_listener_stops_firing() {
        let store = MemoryDocumentStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let watch = store
            .watch(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        store.insert(&fields("one"), &identity("u")).unwrap();

        store.unwatch(watch);
        store.insert(&fields("two"), &identity("u")).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(store.watcher_count(), 0);
    }

    #[test]
    fn unavailable_store_rejects_calls() {
        let store = MemoryDocumentStore::new();
        store.set_unavailable(Some("offline"));
        let err = store.insert(&fields("hi"), &identity("u")).unwrap_err();
        assert!(matches!(err, RemoteError::Unavailable(_)));
        store.set_unavailable(None);
        assert!(store.query_recent(10).unwrap().is_empty());
    }
}
