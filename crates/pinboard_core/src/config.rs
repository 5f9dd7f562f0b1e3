//! Board session configuration.
//!
//! # Responsibility
//! - Describe which persistence variant and optional controls a session uses.
//! - Resolve interactive controls once at startup.
//!
//! # Invariants
//! - A missing required control aborts startup before any handler is wired.
//! - Optional controls are enabled only when both configured and present.

use crate::model::geometry::{BoardSize, CardSize};
use crate::service::board::BoardError;
use crate::store::shared::DEFAULT_FEED_LIMIT;
use crate::store::StoreVariant;
use log::{error, info};
use serde::{Deserialize, Serialize};

/// Interactive element the host may provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    Board,
    NoteForm,
    AuthorInput,
    TextInput,
    ColorInput,
    TiltInput,
    ClearButton,
    SearchInput,
    ShuffleButton,
    ComposeButton,
}

/// Controls every session needs.
pub const REQUIRED_CONTROLS: &[ControlId] = &[
    ControlId::Board,
    ControlId::NoteForm,
    ControlId::AuthorInput,
    ControlId::TextInput,
    ControlId::ColorInput,
    ControlId::TiltInput,
    ControlId::ClearButton,
    ControlId::SearchInput,
];

/// Every known control.
pub const ALL_CONTROLS: &[ControlId] = &[
    ControlId::Board,
    ControlId::NoteForm,
    ControlId::AuthorInput,
    ControlId::TextInput,
    ControlId::ColorInput,
    ControlId::TiltInput,
    ControlId::ClearButton,
    ControlId::SearchInput,
    ControlId::ShuffleButton,
    ControlId::ComposeButton,
];

impl ControlId {
    /// Element id used by the host markup.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::NoteForm => "noteForm",
            Self::AuthorInput => "nameInput",
            Self::TextInput => "msgInput",
            Self::ColorInput => "colorInput",
            Self::TiltInput => "tiltInput",
            Self::ClearButton => "clearBtn",
            Self::SearchInput => "searchInput",
            Self::ShuffleButton => "shuffleBtn",
            Self::ComposeButton => "newBtn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        ALL_CONTROLS
            .iter()
            .copied()
            .find(|control| control.as_str() == trimmed)
    }
}

/// Optional controls a session may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionalControls {
    pub shuffle: bool,
    pub focus_composer: bool,
}

impl Default for OptionalControls {
    fn default() -> Self {
        Self {
            shuffle: true,
            focus_composer: true,
        }
    }
}

/// Session configuration, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub variant: StoreVariant,
    pub controls: OptionalControls,
    /// Initial board interior size; hosts update it on resize.
    pub board: BoardSize,
    pub card: CardSize,
    /// Fixed RNG seed for reproducible placement.
    pub seed: Option<u64>,
    /// Most recent notes delivered by the shared variant.
    pub feed_limit: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            variant: StoreVariant::Local,
            controls: OptionalControls::default(),
            board: BoardSize::new(1024.0, 720.0),
            card: CardSize::default(),
            seed: None,
            feed_limit: DEFAULT_FEED_LIMIT,
        }
    }
}

impl BoardConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Checks `available` against required controls and narrows the
    /// optional set to what is both configured and present.
    ///
    /// # Errors
    /// - Returns [`BoardError::MissingDependency`] for the first required
    ///   control not in `available`.
    pub fn resolve_controls(&self, available: &[ControlId]) -> Result<OptionalControls, BoardError> {
        if let Some(missing) = REQUIRED_CONTROLS
            .iter()
            .copied()
            .find(|control| !available.contains(control))
        {
            error!(
                "event=board_init module=config status=error missing_control={}",
                missing.as_str()
            );
            return Err(BoardError::MissingDependency(missing));
        }

        let resolved = OptionalControls {
            shuffle: self.controls.shuffle && available.contains(&ControlId::ShuffleButton),
            focus_composer: self.controls.focus_composer
                && available.contains(&ControlId::ComposeButton),
        };
        info!(
            "event=board_init module=config status=ok variant={} shuffle={} focus_composer={}",
            self.variant.as_str(),
            resolved.shuffle,
            resolved.focus_composer
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardConfig, ControlId, ALL_CONTROLS, REQUIRED_CONTROLS};
    use crate::service::board::BoardError;
    use crate::store::StoreVariant;

    #[test]
    fn from_json_fills_defaults() {
        let config = BoardConfig::from_json(r#"{"variant":"shared","seed":9}"#).unwrap();
        assert_eq!(config.variant, StoreVariant::Shared);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.feed_limit, 200);
        assert!(config.controls.shuffle);
    }

    #[test]
    fn missing_required_control_is_fatal() {
        let available: Vec<_> = REQUIRED_CONTROLS
            .iter()
            .copied()
            .filter(|control| *control != ControlId::SearchInput)
            .collect();
        let err = BoardConfig::default()
            .resolve_controls(&available)
            .unwrap_err();
        assert!(matches!(
            err,
            BoardError::MissingDependency(ControlId::SearchInput)
        ));
    }

    #[test]
    fn absent_optional_controls_are_tolerated() {
        let controls = BoardConfig::default()
            .resolve_controls(REQUIRED_CONTROLS)
            .unwrap();
        assert!(!controls.shuffle);
        assert!(!controls.focus_composer);

        let all = BoardConfig::default().resolve_controls(ALL_CONTROLS).unwrap();
        assert!(all.shuffle && all.focus_composer);
    }

    #[test]
    fn control_ids_parse_from_element_ids() {
        assert_eq!(ControlId::parse("shuffleBtn"), Some(ControlId::ShuffleButton));
        assert_eq!(ControlId::parse("nope"), None);
    }
}
