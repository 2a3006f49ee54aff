//! Layout catalog: the fixed grid shapes a screen group can take.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

/// Geometry of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSpec {
    /// Number of screen positions (and tiles per split image).
    pub position_count: i32,
    /// `true` when positions stack top-to-bottom, `false` for left-to-right.
    pub is_vertical: bool,
}

/// Supported screen group layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenLayout {
    /// Three landscape screens side by side, positions 0..=2 left to right.
    #[serde(rename = "3x1")]
    Horizontal3x1,
    /// Two portrait screens stacked, positions 0..=1 top to bottom.
    #[serde(rename = "1x2")]
    Vertical1x2,
}

impl ScreenLayout {
    pub const ALL: [ScreenLayout; 2] = [ScreenLayout::Horizontal3x1, ScreenLayout::Vertical1x2];

    pub fn spec(self) -> LayoutSpec {
        match self {
            ScreenLayout::Horizontal3x1 => LayoutSpec {
                position_count: 3,
                is_vertical: false,
            },
            ScreenLayout::Vertical1x2 => LayoutSpec {
                position_count: 2,
                is_vertical: true,
            },
        }
    }

    pub fn position_count(self) -> i32 {
        self.spec().position_count
    }

    pub fn is_vertical(self) -> bool {
        self.spec().is_vertical
    }

    /// Highest valid zero-based position.
    pub fn max_position(self) -> i32 {
        self.position_count() - 1
    }

    pub fn contains_position(self, position: i32) -> bool {
        (0..self.position_count()).contains(&position)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScreenLayout::Horizontal3x1 => "3x1",
            ScreenLayout::Vertical1x2 => "1x2",
        }
    }
}

impl fmt::Display for ScreenLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScreenLayout {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3x1" => Ok(ScreenLayout::Horizontal3x1),
            "1x2" => Ok(ScreenLayout::Vertical1x2),
            other => Err(DomainError::InvalidLayout(other.to_string())),
        }
    }
}

impl TryFrom<String> for ScreenLayout {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
