//! Video entity model and DTOs.

use reelset_core::geometry::CropRect;
use reelset_core::lifecycle::{SourceFrame, VideoConfig, VideoStatus};
use reelset_core::progress::StatusEntry;
use reelset_core::resolution::Resolution;
use reelset_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `videos` table.
///
/// `fps` and `frame_count` stay `None` until the video is processed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub dataset_id: DbId,
    pub filename: String,
    pub filepath: String,
    pub duration: f64,
    pub original_width: i32,
    pub original_height: i32,
    pub start_time: f64,
    #[sqlx(try_from = "String")]
    pub resolution: Resolution,
    pub crop_x: i32,
    pub crop_y: i32,
    pub crop_width: i32,
    pub crop_height: i32,
    pub fps: Option<i32>,
    pub frame_count: Option<i32>,
    #[sqlx(rename = "status_id", try_from = "i16")]
    #[serde(rename = "status")]
    pub status: VideoStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Video {
    pub fn source_frame(&self) -> SourceFrame {
        SourceFrame {
            duration: self.duration,
            width: self.original_width,
            height: self.original_height,
        }
    }

    pub fn crop(&self) -> CropRect {
        CropRect {
            x: self.crop_x,
            y: self.crop_y,
            width: self.crop_width,
            height: self.crop_height,
        }
    }

    /// Current editable configuration.
    pub fn config(&self) -> VideoConfig {
        VideoConfig {
            start_time: self.start_time,
            resolution: self.resolution,
            crop: self.crop(),
        }
    }

    pub fn status_entry(&self) -> StatusEntry {
        StatusEntry {
            video_id: self.id,
            status: Some(self.status),
        }
    }
}

/// DTO for inserting an uploaded video with its initial configuration.
#[derive(Debug, Clone)]
pub struct CreateVideo {
    pub dataset_id: DbId,
    pub filename: String,
    pub filepath: String,
    pub frame: SourceFrame,
    pub config: VideoConfig,
}
