//! Note record and composer draft.
//!
//! # Responsibility
//! - Define the shared `Note` record in the exact JSON shape kept in local
//!   storage (`id`, `author`, `text`, `color`, `tilt`, `x`, `y`, `createdAt`).
//! - Normalize composer input before any persistence attempt.
//!
//! # Invariants
//! - `author` holds at most [`AUTHOR_MAX_CHARS`] characters.
//! - `text` holds 1..=[`TEXT_MAX_CHARS`] characters after trimming.
//! - `tilt`, `x`, `y` are only populated by the local variant; `owner_id`
//!   only by the shared variant.

use crate::model::geometry::Position;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque note identifier (uuid text locally, document id remotely).
pub type NoteId = String;

/// Maximum author length in characters.
pub const AUTHOR_MAX_CHARS: usize = 32;
/// Maximum note body length in characters.
pub const TEXT_MAX_CHARS: usize = 500;
/// Display label used for notes without an author.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Paper color of a card. Unknown stored values decode as `Lemon`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NoteColor {
    #[default]
    Lemon,
    Peach,
    Mint,
    Sky,
    Lilac,
    Rose,
}

impl NoteColor {
    /// Stable value used in storage and form inputs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lemon => "lemon",
            Self::Peach => "peach",
            Self::Mint => "mint",
            Self::Sky => "sky",
            Self::Lilac => "lilac",
            Self::Rose => "rose",
        }
    }

    /// Style variant applied to the rendered card.
    pub fn css_class(self) -> String {
        format!("paper-{}", self.as_str())
    }

    /// Parses a form/storage value, falling back to the default paper.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "peach" => Self::Peach,
            "mint" => Self::Mint,
            "sky" => Self::Sky,
            "lilac" => Self::Lilac,
            "rose" => Self::Rose,
            _ => Self::Lemon,
        }
    }
}

impl From<String> for NoteColor {
    fn from(value: String) -> Self {
        Self::parse(value.as_str())
    }
}

impl From<NoteColor> for String {
    fn from(value: NoteColor) -> Self {
        value.as_str().to_string()
    }
}

/// Shared pinboard message record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    #[serde(default)]
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub color: NoteColor,
    /// Degrees. Local variant only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    /// Shared variant only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl Note {
    /// Returns the embedded position when both coordinates are present.
    pub fn position(&self) -> Option<Position> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Position { x, y }),
            _ => None,
        }
    }

    pub fn set_position(&mut self, position: Position) {
        self.x = Some(position.x);
        self.y = Some(position.y);
    }

    /// Author label shown on the card.
    pub fn author_label(&self) -> &str {
        if self.author.is_empty() {
            ANONYMOUS_AUTHOR
        } else {
            self.author.as_str()
        }
    }

    /// Case-insensitive substring test over author and text.
    ///
    /// `needle` must already be trimmed and lowercased; empty matches all.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.author.to_lowercase().contains(needle) || self.text.to_lowercase().contains(needle)
    }
}

/// Tilt selection from the composer: explicit degrees or a random draw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TiltChoice {
    #[default]
    Auto,
    Fixed(f64),
}

impl TiltChoice {
    /// Parses the composer select value (`auto` or a number of degrees).
    ///
    /// Anything that is not a finite number is treated as `auto`.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Self::Auto;
        }
        Self::from_degrees(trimmed.parse::<f64>().ok())
    }

    /// `Fixed` for a finite number of degrees, `Auto` otherwise.
    pub fn from_degrees(degrees: Option<f64>) -> Self {
        match degrees {
            Some(degrees) if degrees.is_finite() => Self::Fixed(degrees),
            _ => Self::Auto,
        }
    }
}

/// Raw composer input, before trimming and truncation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteDraft {
    pub author: String,
    pub text: String,
    pub color: NoteColor,
    pub tilt: TiltChoice,
}

impl NoteDraft {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_tilt(mut self, tilt: TiltChoice) -> Self {
        self.tilt = tilt;
        self
    }

    /// Trims and truncates the draft.
    ///
    /// # Errors
    /// - Returns [`DraftError::EmptyText`] when the body is blank after trim.
    pub fn normalize(&self) -> Result<NoteDraft, DraftError> {
        let text = truncate_chars(self.text.trim(), TEXT_MAX_CHARS);
        if text.is_empty() {
            return Err(DraftError::EmptyText);
        }
        Ok(NoteDraft {
            author: truncate_chars(self.author.trim(), AUTHOR_MAX_CHARS),
            text,
            color: self.color,
            tilt: match self.tilt {
                TiltChoice::Fixed(degrees) => TiltChoice::from_degrees(Some(degrees)),
                TiltChoice::Auto => TiltChoice::Auto,
            },
        })
    }
}

/// Composer validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftError {
    EmptyText,
}

impl Display for DraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "note text cannot be empty"),
        }
    }
}

impl Error for DraftError {}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::{DraftError, Note, NoteColor, NoteDraft, TiltChoice};

    #[test]
    fn normalize_truncates_text_and_author() {
        let draft = NoteDraft::new("a".repeat(40), "b".repeat(600));
        let normalized = draft.normalize().expect("draft should normalize");
        assert_eq!(normalized.author.chars().count(), 32);
        assert_eq!(normalized.text.chars().count(), 500);
    }

    #[test]
    fn normalize_counts_characters_not_bytes() {
        let draft = NoteDraft::new("é".repeat(33), "ü".repeat(501));
        let normalized = draft.normalize().expect("draft should normalize");
        assert_eq!(normalized.author.chars().count(), 32);
        assert_eq!(normalized.text.chars().count(), 500);
    }

    #[test]
    fn normalize_rejects_blank_text() {
        let err = NoteDraft::new("Ann", "   \n ").normalize().unwrap_err();
        assert_eq!(err, DraftError::EmptyText);
    }

    #[test]
    fn non_finite_tilt_falls_back_to_auto() {
        assert_eq!(TiltChoice::from_degrees(Some(f64::NAN)), TiltChoice::Auto);
        assert_eq!(TiltChoice::from_degrees(Some(f64::INFINITY)), TiltChoice::Auto);
        assert_eq!(TiltChoice::from_degrees(Some(4.5)), TiltChoice::Fixed(4.5));
        assert_eq!(TiltChoice::from_degrees(None), TiltChoice::Auto);

        let draft = NoteDraft::new("", "tilted").with_tilt(TiltChoice::Fixed(f64::NAN));
        assert_eq!(draft.normalize().unwrap().tilt, TiltChoice::Auto);
    }

    #[test]
    fn tilt_choice_parses_auto_and_numbers() {
        assert_eq!(TiltChoice::parse("auto"), TiltChoice::Auto);
        assert_eq!(TiltChoice::parse(" -3 "), TiltChoice::Fixed(-3.0));
        assert_eq!(TiltChoice::parse("sideways"), TiltChoice::Auto);
    }

    #[test]
    fn unknown_color_decodes_as_lemon() {
        let raw = r#"{"id":"n1","author":"","text":"hi","color":"plaid","createdAt":1}"#;
        let note: Note = serde_json::from_str(raw).expect("note should decode");
        assert_eq!(note.color, NoteColor::Lemon);
        assert_eq!(note.author_label(), "Anonymous");
        assert!(note.position().is_none());
    }

    #[test]
    fn local_shape_roundtrips_field_names() {
        let raw = r#"{"id":"n1","author":"Ann","text":"hi","color":"mint","tilt":3,"x":40.5,"y":60,"createdAt":1700000000000}"#;
        let note: Note = serde_json::from_str(raw).expect("note should decode");
        assert_eq!(note.color, NoteColor::Mint);
        assert_eq!(note.tilt, Some(3.0));
        let encoded = serde_json::to_value(&note).expect("note should encode");
        assert_eq!(encoded["createdAt"], 1_700_000_000_000_i64);
        assert!(encoded.get("ownerId").is_none());
    }
}
