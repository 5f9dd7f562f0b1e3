//! Core logic of the pinboard: notes, layout, rendering and drag.
//! Hosts supply the drawing surface and the remote collaborators.

pub mod config;
pub mod db;
pub mod drag;
pub mod layout;
pub mod logging;
pub mod model;
pub mod render;
pub mod service;
pub mod store;

pub use config::{BoardConfig, ControlId, OptionalControls, ALL_CONTROLS, REQUIRED_CONTROLS};
pub use drag::{DragController, DragEffect, PointerSample, PointerTarget, DRAG_PADDING};
pub use layout::{EmbeddedLayout, ViewLayout, ViewStateCache};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::geometry::{BoardSize, CardSize, Position, ViewProps};
pub use model::note::{Note, NoteColor, NoteDraft, NoteId, TiltChoice};
pub use render::{BoardSurface, CardView, RecordingSurface};
pub use service::board::{Board, BoardError, BoardResult};
pub use store::kv::{KvStore, MemoryKvStore, SqliteKvStore};
pub use store::local::LocalNoteStore;
pub use store::remote::{
    AnonymousIdentity, DocumentStore, Identity, IdentityProvider, MemoryDocumentStore,
};
pub use store::shared::SharedNoteStore;
pub use store::{NoteStore, StoreError, StoreResult, StoreVariant};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
