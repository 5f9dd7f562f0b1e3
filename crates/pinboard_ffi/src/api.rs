//! FFI use-case API for a UI host.
//!
//! # Responsibility
//! - Expose one process-wide board session to Dart via FRB.
//! - Translate host input into core calls and core output into envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every response drains pending user notices exactly once.
//! - Calls made before `board_open` fail with a stable message.

use log::warn;
use pinboard_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AnonymousIdentity, Board, BoardConfig, BoardSize, CardView, MemoryDocumentStore, NoteColor,
    NoteDraft, PointerSample, PointerTarget, RecordingSurface, SqliteKvStore, StoreVariant,
    TiltChoice, ALL_CONTROLS,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

const BOARD_DB_FILE_NAME: &str = "pinboard_kv.sqlite3";
const NOT_OPEN_MESSAGE: &str = "board is not open";

static BOARD_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static SESSION: OnceLock<Mutex<Option<Board<RecordingSurface>>>> = OnceLock::new();
static DOCUMENTS: OnceLock<Arc<MemoryDocumentStore>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One card as the host should draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardCardItem {
    pub note_id: String,
    pub author: String,
    /// Localized creation date, empty when unknown.
    pub date: String,
    pub text: String,
    /// Style class, e.g. `paper-mint`.
    pub css_class: String,
    pub left: f64,
    pub top: f64,
    pub rotation_deg: f64,
    /// Stacking layer after a raise; higher draws on top. `None` keeps
    /// document order.
    pub layer: Option<u64>,
    /// Pointer routed to this card while it is dragged.
    pub captured_pointer: Option<i64>,
}

/// Snapshot of drawn cards plus pending notices.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardCardsResponse {
    pub ok: bool,
    pub items: Vec<BoardCardItem>,
    /// Notices the host must show to the acting user.
    pub notices: Vec<String>,
    /// Whether the composer field should take input focus now.
    pub focus_composer: bool,
    pub message: String,
}

/// Result of a single board action.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardActionResponse {
    pub ok: bool,
    /// Created note ID, when the action created one.
    pub note_id: Option<String>,
    pub notices: Vec<String>,
    pub message: String,
}

impl BoardActionResponse {
    fn success(message: impl Into<String>, note_id: Option<String>, notices: Vec<String>) -> Self {
        Self {
            ok: true,
            note_id,
            notices,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>, notices: Vec<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            notices,
            message: message.into(),
        }
    }
}

/// Opens (or reopens) the process board session.
///
/// `config_json` follows `BoardConfig`; blank input uses defaults. All
/// controls are treated as present.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Replaces any previously open session.
#[flutter_rust_bridge::frb(sync)]
pub fn board_open(config_json: String) -> BoardActionResponse {
    let config = match parse_config(&config_json) {
        Ok(config) => config,
        Err(err) => return BoardActionResponse::failure(err, Vec::new()),
    };
    let kv = match SqliteKvStore::open(resolve_board_db_path()) {
        Ok(kv) => Arc::new(kv),
        Err(err) => {
            return BoardActionResponse::failure(format!("board_open failed: {err}"), Vec::new())
        }
    };

    let opened = match config.variant {
        StoreVariant::Local => {
            Board::open_local(kv, RecordingSurface::new(), &config, ALL_CONTROLS)
        }
        StoreVariant::Shared => Board::open_shared(
            kv,
            shared_documents(),
            Arc::new(AnonymousIdentity::new()),
            RecordingSurface::new(),
            &config,
            ALL_CONTROLS,
        ),
    };

    match opened {
        Ok(mut board) => {
            let notices = board.surface_mut().take_notices();
            let message = format!("Board opened with {} note(s).", board.notes().len());
            *session() = Some(board);
            BoardActionResponse::success(message, None, notices)
        }
        Err(err) => BoardActionResponse::failure(format!("board_open failed: {err}"), Vec::new()),
    }
}

/// Posts a note from composer input.
///
/// `color` is one of the palette names; unknown names fall back to lemon.
/// `tilt_deg=None`, NaN or infinity picks an automatic tilt.
#[flutter_rust_bridge::frb(sync)]
pub fn board_create(
    author: String,
    text: String,
    color: String,
    tilt_deg: Option<f64>,
) -> BoardActionResponse {
    let tilt = TiltChoice::from_degrees(tilt_deg);
    let draft = NoteDraft::new(author, text)
        .with_color(NoteColor::parse(&color))
        .with_tilt(tilt);

    with_board_action(|board| match board.create(&draft) {
        Ok(Some(id)) => Ok(("Note pinned.".to_string(), Some(id))),
        Ok(None) => Ok(("Nothing to pin.".to_string(), None)),
        Err(err) => Err(format!("board_create failed: {err}")),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_delete(note_id: String) -> BoardActionResponse {
    with_board_action(|board| {
        board
            .delete(note_id.as_str())
            .map(|()| ("Note removed.".to_string(), None))
            .map_err(|err| format!("board_delete failed: {err}"))
    })
}

/// Applies the filter text and returns the visible cards.
#[flutter_rust_bridge::frb(sync)]
pub fn board_search(filter: String) -> BoardCardsResponse {
    with_board_cards(|board| {
        board
            .set_filter(filter.as_str())
            .map(|_| ())
            .map_err(|err| format!("board_search failed: {err}"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_shuffle() -> BoardActionResponse {
    with_board_action(|board| match board.shuffle() {
        Ok(true) => Ok(("Board shuffled.".to_string(), None)),
        Ok(false) => Ok(("Shuffle is not available.".to_string(), None)),
        Err(err) => Err(format!("board_shuffle failed: {err}")),
    })
}

/// Clears the board: every note locally, only the layout cache when shared.
#[flutter_rust_bridge::frb(sync)]
pub fn board_clear() -> BoardActionResponse {
    with_board_action(|board| {
        board
            .clear()
            .map(|()| ("Board cleared.".to_string(), None))
            .map_err(|err| format!("board_clear failed: {err}"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_resize(width: f64, height: f64) -> BoardCardsResponse {
    with_board_cards(|board| {
        board
            .resize(BoardSize::new(width, height))
            .map(|_| ())
            .map_err(|err| format!("board_resize failed: {err}"))
    })
}

/// Applies any pushed snapshot and returns the current cards.
#[flutter_rust_bridge::frb(sync)]
pub fn board_cards() -> BoardCardsResponse {
    with_board_cards(|board| {
        board
            .pump()
            .map(|_| ())
            .map_err(|err| format!("board_cards failed: {err}"))
    })
}

/// Pointer pressed on a card; `on_delete` marks the delete affordance.
#[flutter_rust_bridge::frb(sync)]
pub fn board_pointer_down(
    note_id: String,
    pointer_id: i64,
    x: f64,
    y: f64,
    on_delete: bool,
) -> BoardCardsResponse {
    let target = if on_delete {
        PointerTarget::DeleteButton
    } else {
        PointerTarget::Card
    };
    with_board_cards(|board| {
        board
            .pointer_down(
                note_id.as_str(),
                PointerSample::new(pointer_id, x, y),
                target,
            )
            .map_err(|err| format!("board_pointer_down failed: {err}"))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn board_pointer_move(note_id: String, pointer_id: i64, x: f64, y: f64) -> BoardCardsResponse {
    with_board_cards(|board| {
        board
            .pointer_move(note_id.as_str(), PointerSample::new(pointer_id, x, y))
            .map_err(|err| format!("board_pointer_move failed: {err}"))
    })
}

/// Pointer released or cancelled on a card.
#[flutter_rust_bridge::frb(sync)]
pub fn board_pointer_up(note_id: String) -> BoardCardsResponse {
    with_board_cards(|board| {
        board
            .pointer_up(note_id.as_str())
            .map_err(|err| format!("board_pointer_up failed: {err}"))
    })
}

/// Pointer cancelled on a card; ends its drag like a release.
#[flutter_rust_bridge::frb(sync)]
pub fn board_pointer_cancel(note_id: String) -> BoardCardsResponse {
    with_board_cards(|board| {
        board
            .pointer_cancel(note_id.as_str())
            .map_err(|err| format!("board_pointer_cancel failed: {err}"))
    })
}

/// Requests composer focus; the response reports whether the host should
/// focus the message field.
#[flutter_rust_bridge::frb(sync)]
pub fn board_focus_composer() -> BoardCardsResponse {
    with_board_cards(|board| {
        board.focus_composer();
        Ok(())
    })
}

fn parse_config(raw: &str) -> Result<BoardConfig, String> {
    if raw.trim().is_empty() {
        return Ok(BoardConfig::default());
    }
    BoardConfig::from_json(raw).map_err(|err| format!("invalid board config: {err}"))
}

fn resolve_board_db_path() -> PathBuf {
    BOARD_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("PINBOARD_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(BOARD_DB_FILE_NAME)
        })
        .clone()
}

fn shared_documents() -> Arc<MemoryDocumentStore> {
    Arc::clone(DOCUMENTS.get_or_init(|| Arc::new(MemoryDocumentStore::new())))
}

fn session() -> MutexGuard<'static, Option<Board<RecordingSurface>>> {
    SESSION
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn with_board_action(
    f: impl FnOnce(&mut Board<RecordingSurface>) -> Result<(String, Option<String>), String>,
) -> BoardActionResponse {
    let mut guard = session();
    let Some(board) = guard.as_mut() else {
        return BoardActionResponse::failure(NOT_OPEN_MESSAGE, Vec::new());
    };
    let outcome = f(board);
    let notices = board.surface_mut().take_notices();
    match outcome {
        Ok((message, note_id)) => BoardActionResponse::success(message, note_id, notices),
        Err(message) => {
            warn!("event=ffi_call module=ffi status=error");
            BoardActionResponse::failure(message, notices)
        }
    }
}

fn with_board_cards(
    f: impl FnOnce(&mut Board<RecordingSurface>) -> Result<(), String>,
) -> BoardCardsResponse {
    let mut guard = session();
    let Some(board) = guard.as_mut() else {
        return BoardCardsResponse {
            ok: false,
            items: Vec::new(),
            notices: Vec::new(),
            focus_composer: false,
            message: NOT_OPEN_MESSAGE.to_string(),
        };
    };
    let focus_before = board.surface().composer_focus_requests();
    let outcome = f(board);
    let notices = board.surface_mut().take_notices();
    let surface = board.surface();
    let focus_composer = surface.composer_focus_requests() > focus_before;
    let items: Vec<BoardCardItem> = surface
        .cards()
        .iter()
        .map(|card| to_card_item(surface, card))
        .collect();
    match outcome {
        Ok(()) => BoardCardsResponse {
            ok: true,
            message: format!("{} card(s).", items.len()),
            items,
            notices,
            focus_composer,
        },
        Err(message) => BoardCardsResponse {
            ok: false,
            items,
            notices,
            focus_composer,
            message,
        },
    }
}

fn to_card_item(surface: &RecordingSurface, card: &CardView) -> BoardCardItem {
    BoardCardItem {
        note_id: card.id.clone(),
        author: card.author_label.clone(),
        date: card.date_label.clone(),
        text: card.text.clone(),
        css_class: card.css_class.clone(),
        left: card.left,
        top: card.top,
        rotation_deg: card.rotation_deg,
        layer: surface.layer(&card.id),
        captured_pointer: surface.captured_pointer(&card.id),
    }
}
