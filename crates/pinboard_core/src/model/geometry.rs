//! Board geometry and viewer-local placement.

use serde::{Deserialize, Serialize};

/// Default rendered card width in CSS pixels.
pub const CARD_WIDTH: f64 = 240.0;
/// Default rendered card height in CSS pixels.
pub const CARD_HEIGHT: f64 = 170.0;

/// Top-left card offset inside the board.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Board interior size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardSize {
    pub width: f64,
    pub height: f64,
}

impl BoardSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Rendered card size, as measured by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardSize {
    pub width: f64,
    pub height: f64,
}

impl Default for CardSize {
    fn default() -> Self {
        Self {
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
        }
    }
}

/// Viewer-local visual attributes of one card.
///
/// Never part of shared note content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewProps {
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees.
    pub tilt: f64,
}

impl ViewProps {
    pub fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }

    pub fn with_position(self, position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
            tilt: self.tilt,
        }
    }
}

/// Clamps `value` to `[min, max]`; `min` wins when the range is inverted.
///
/// Boards narrower than a card produce `max < min`, and the card must then
/// stick to the padded top-left edge instead of leaving the board.
pub fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    min.max(max.min(value))
}

#[cfg(test)]
mod tests {
    use super::clamp_axis;

    #[test]
    fn clamp_axis_keeps_values_inside_range() {
        assert_eq!(clamp_axis(5.0, 10.0, 100.0), 10.0);
        assert_eq!(clamp_axis(50.0, 10.0, 100.0), 50.0);
        assert_eq!(clamp_axis(150.0, 10.0, 100.0), 100.0);
    }

    #[test]
    fn clamp_axis_prefers_lower_bound_for_inverted_range() {
        assert_eq!(clamp_axis(300.0, 10.0, -50.0), 10.0);
        assert_eq!(clamp_axis(-300.0, 10.0, -50.0), 10.0);
    }
}
