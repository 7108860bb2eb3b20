//! Output resolution presets.
//!
//! A resolution fixes two things for a processed clip: the target aspect
//! ratio used to size the crop rectangle, and the literal pixel dimensions
//! the cropped region is scaled to during conversion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Supported output resolutions, serialized as `"WIDTHxHEIGHT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1280x720")]
    Landscape720,
    #[serde(rename = "720x1280")]
    Portrait720,
    #[serde(rename = "768x768")]
    Square768,
}

/// All supported resolutions, in display order.
pub const ALL_RESOLUTIONS: &[Resolution] = &[
    Resolution::Landscape720,
    Resolution::Portrait720,
    Resolution::Square768,
];

impl Resolution {
    /// Output pixel dimensions as `(width, height)`.
    pub fn dimensions(self) -> (i32, i32) {
        match self {
            Self::Landscape720 => (1280, 720),
            Self::Portrait720 => (720, 1280),
            Self::Square768 => (768, 768),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape720 => "1280x720",
            Self::Portrait720 => "720x1280",
            Self::Square768 => "768x768",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_RESOLUTIONS
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = ALL_RESOLUTIONS.iter().map(|r| r.as_str()).collect();
                CoreError::Validation(format!(
                    "Unknown resolution '{s}'. Valid resolutions: {}",
                    valid.join(", ")
                ))
            })
    }
}

impl TryFrom<String> for Resolution {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
