//! Per-video processing status and configuration rules.
//!
//! Status moves `pending -> processed | error`, and a reprocess re-enters
//! `pending` from either terminal state. Configuration (start time,
//! resolution, crop rectangle) can be patched in any status without touching
//! it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geometry::{self, CropRect};
use crate::resolution::Resolution;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Processing status of a single video. Discriminants match the seed order
/// of the `video_statuses` lookup table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    #[default]
    Pending = 1,
    Processed = 2,
    Error = 3,
}

impl VideoStatus {
    /// Return the database status ID.
    pub fn id(self) -> i16 {
        self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Processed),
            3 => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Error => "error",
        }
    }

    /// Whether `self -> next` is a permitted transition.
    ///
    /// `pending -> pending` is allowed: the batch re-marks every video as it
    /// starts on it.
    pub fn can_transition_to(self, next: VideoStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, _) | (Self::Processed, Self::Pending) | (Self::Error, Self::Pending)
        )
    }

    /// Validate and perform a transition.
    pub fn transition(self, next: VideoStatus) -> Result<VideoStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::Conflict(format!(
                "Invalid video status transition: {self} -> {next}"
            )))
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i16> for VideoStatus {
    type Error = CoreError;

    fn try_from(id: i16) -> Result<Self, CoreError> {
        Self::from_id(id)
            .ok_or_else(|| CoreError::Internal(format!("Unknown video status id {id}")))
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Source frame facts that bound a video's configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceFrame {
    pub duration: f64,
    pub width: i32,
    pub height: i32,
}

impl SourceFrame {
    /// Conservative frame assumed when metadata extraction fails, so an
    /// upload is never blocked by an unreadable file.
    pub const FALLBACK: SourceFrame = SourceFrame {
        duration: 10.0,
        width: 1280,
        height: 720,
    };
}

/// The user-editable part of a video record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoConfig {
    pub start_time: f64,
    pub resolution: Resolution,
    pub crop: CropRect,
}

impl VideoConfig {
    /// Configuration for a freshly uploaded video.
    pub fn initial(frame: &SourceFrame) -> Self {
        let resolution = Resolution::default();
        Self {
            start_time: 0.0,
            resolution,
            crop: geometry::default_crop(resolution, frame.width, frame.height),
        }
    }
}

/// Partial configuration update. Unknown fields are rejected at
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoPatch {
    pub start_time: Option<f64>,
    pub resolution: Option<Resolution>,
    pub crop_x: Option<i32>,
    pub crop_y: Option<i32>,
    pub crop_width: Option<i32>,
    pub crop_height: Option<i32>,
}

impl VideoPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn sets_crop_size(&self) -> bool {
        self.crop_width.is_some() || self.crop_height.is_some()
    }

    /// Field-by-field validation against the source frame.
    pub fn validate(&self, frame: &SourceFrame) -> Result<(), CoreError> {
        if let Some(t) = self.start_time {
            if !t.is_finite() || t < 0.0 || t >= frame.duration {
                return Err(CoreError::Validation(format!(
                    "start_time must be in [0, {}), got {t}",
                    frame.duration
                )));
            }
        }
        for (name, value) in [("crop_x", self.crop_x), ("crop_y", self.crop_y)] {
            if let Some(v) = value {
                if v < 0 {
                    return Err(CoreError::Validation(format!(
                        "{name} must be >= 0, got {v}"
                    )));
                }
            }
        }
        for (name, value) in [
            ("crop_width", self.crop_width),
            ("crop_height", self.crop_height),
        ] {
            if let Some(v) = value {
                if v <= 0 {
                    return Err(CoreError::Validation(format!(
                        "{name} must be > 0, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Validate `patch` and merge it into `current`.
///
/// A resolution change without an explicit crop size resizes the crop to the
/// largest fit for the new aspect ratio, keeping the previous center point.
/// Explicit crop fields are applied on top. A rectangle that ends up outside
/// the frame is shrunk to the frame and re-centered instead of rejected.
pub fn apply_patch(
    current: &VideoConfig,
    patch: &VideoPatch,
    frame: &SourceFrame,
) -> Result<VideoConfig, CoreError> {
    patch.validate(frame)?;

    let mut next = *current;
    if let Some(t) = patch.start_time {
        next.start_time = t;
    }

    if let Some(resolution) = patch.resolution {
        if resolution != current.resolution && !patch.sets_crop_size() {
            let size = geometry::crop_size_for_resolution(resolution, frame.width, frame.height);
            next.crop = geometry::recenter_on(current.crop, size, frame.width, frame.height);
        }
        next.resolution = resolution;
    }

    if let Some(x) = patch.crop_x {
        next.crop.x = x;
    }
    if let Some(y) = patch.crop_y {
        next.crop.y = y;
    }
    if let Some(w) = patch.crop_width {
        next.crop.width = w;
    }
    if let Some(h) = patch.crop_height {
        next.crop.height = h;
    }

    next.crop = geometry::fit_crop(next.crop, frame.width, frame.height);
    Ok(next)
}
