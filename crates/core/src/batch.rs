//! Dataset batch processing configuration, output naming and summary.
//!
//! A batch converts every video of one dataset with a shared frame rate and
//! frame count. Orchestration (database reads and writes, invoking the
//! converter) lives in the API engine; this module holds the pure parts.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Extension of every processed clip.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Prefix of processed clip filenames (`item_0001.mp4`, ...).
pub const OUTPUT_PREFIX: &str = "item";

/// Raw batch trigger body. Fields are optional so that a missing value is
/// reported as a validation error rather than a body parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchRequest {
    pub fps: Option<i64>,
    pub frame_count: Option<i64>,
}

/// Validated batch configuration shared by all videos of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchConfig {
    pub fps: i32,
    pub frame_count: i32,
}

impl BatchConfig {
    pub fn new(fps: i32, frame_count: i32) -> Result<Self, CoreError> {
        Self::try_from(BatchRequest {
            fps: Some(fps.into()),
            frame_count: Some(frame_count.into()),
        })
    }
}

impl TryFrom<BatchRequest> for BatchConfig {
    type Error = CoreError;

    fn try_from(request: BatchRequest) -> Result<Self, Self::Error> {
        let fps = require_positive("fps", request.fps)?;
        let frame_count = require_positive("frame_count", request.frame_count)?;
        Ok(Self { fps, frame_count })
    }
}

fn require_positive(name: &str, value: Option<i64>) -> Result<i32, CoreError> {
    let value = value.ok_or_else(|| CoreError::Validation(format!("{name} is required")))?;
    if value <= 0 {
        return Err(CoreError::Validation(format!(
            "{name} must be a positive integer, got {value}"
        )));
    }
    i32::try_from(value)
        .map_err(|_| CoreError::Validation(format!("{name} is too large: {value}")))
}

/// Filename for the clip at 1-based position `index` in the dataset's
/// video list.
pub fn output_filename(index: usize) -> String {
    format!("{OUTPUT_PREFIX}_{index:04}.{OUTPUT_EXTENSION}")
}

/// Result of one dataset batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed_count: usize,
    pub total_videos: usize,
    pub message: String,
}

impl BatchSummary {
    pub fn new(processed_count: usize, total_videos: usize) -> Self {
        Self {
            processed_count,
            total_videos,
            message: format!(
                "Processing completed. {processed_count}/{total_videos} videos processed successfully."
            ),
        }
    }

    pub fn failed_count(&self) -> usize {
        self.total_videos - self.processed_count
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn valid_config_accepted() {
        let config = BatchConfig::new(16, 81).unwrap();
        assert_eq!(
            config,
            BatchConfig {
                fps: 16,
                frame_count: 81,
            }
        );
    }

    #[test]
    fn missing_fields_rejected() {
        let result = BatchConfig::try_from(BatchRequest {
            fps: None,
            frame_count: Some(81),
        });
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("fps"));

        let result = BatchConfig::try_from(BatchRequest {
            fps: Some(16),
            frame_count: None,
        });
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("frame_count"));
    }

    #[test]
    fn non_positive_values_rejected() {
        assert_matches!(BatchConfig::new(0, 81), Err(CoreError::Validation(_)));
        assert_matches!(BatchConfig::new(16, -1), Err(CoreError::Validation(_)));
    }

    #[test]
    fn oversized_values_rejected() {
        let result = BatchConfig::try_from(BatchRequest {
            fps: Some(i64::from(i32::MAX) + 1),
            frame_count: Some(81),
        });
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn output_filenames_are_zero_padded() {
        assert_eq!(output_filename(1), "item_0001.mp4");
        assert_eq!(output_filename(42), "item_0042.mp4");
        assert_eq!(output_filename(12345), "item_12345.mp4");
    }

    #[test]
    fn summary_message() {
        let summary = BatchSummary::new(0, 1);
        assert_eq!(
            summary.message,
            "Processing completed. 0/1 videos processed successfully."
        );
        assert_eq!(summary.failed_count(), 1);
        assert_eq!(BatchSummary::new(0, 0).failed_count(), 0);
    }
}
