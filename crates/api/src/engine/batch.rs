//! Batch Processor.
//!
//! Converts every video of one dataset with a shared [`BatchConfig`], one
//! video at a time. A failed conversion is recorded as that video's `error`
//! status and never aborts the batch. Only a missing dataset or a failure
//! to list its videos stops a batch before it starts.

use std::sync::Arc;

use reelset_core::batch::{BatchConfig, BatchSummary};
use reelset_core::error::CoreError;
use reelset_core::ffmpeg::{ConversionJob, VideoConverter};
use reelset_core::lifecycle::VideoStatus;
use reelset_core::storage::StorageLayout;
use reelset_core::types::DbId;
use reelset_db::models::dataset::Dataset;
use reelset_db::models::video::Video;
use reelset_db::repositories::{DatasetRepo, VideoRepo};
use reelset_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

/// Outcome of one video within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VideoOutcome {
    Processed,
    Failed,
    /// The row vanished or its status moved on while the batch ran.
    Skipped,
}

/// Runs dataset batches against a [`VideoConverter`].
#[derive(Clone)]
pub struct BatchProcessor {
    pool: DbPool,
    storage: StorageLayout,
    converter: Arc<dyn VideoConverter>,
    cancel: CancellationToken,
}

impl BatchProcessor {
    pub fn new(
        pool: DbPool,
        storage: StorageLayout,
        converter: Arc<dyn VideoConverter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            pool,
            storage,
            converter,
            cancel,
        }
    }

    /// Process every video of `dataset_id` in list order.
    ///
    /// Output files are named `item_0001.mp4`, `item_0002.mp4`, ... by
    /// position. The cancellation token is checked between videos; videos
    /// not reached keep their current status.
    pub async fn process_dataset(
        &self,
        dataset_id: DbId,
        config: BatchConfig,
    ) -> AppResult<BatchSummary> {
        let dataset = DatasetRepo::find_by_id(&self.pool, dataset_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Dataset",
                id: dataset_id,
            }))?;

        let videos = VideoRepo::list_by_dataset(&self.pool, dataset_id).await?;
        let total = videos.len();
        if total == 0 {
            tracing::info!(dataset_id, "Dataset has no videos, nothing to process");
            return Ok(BatchSummary::new(0, 0));
        }

        let output_dir = self.storage.output_dir(dataset.id, &dataset.name);
        if let Err(e) = tokio::fs::create_dir_all(&output_dir).await {
            tracing::warn!(
                dataset_id,
                path = %output_dir.display(),
                error = %e,
                "Failed to create output directory",
            );
        }

        tracing::info!(
            dataset_id,
            total,
            fps = config.fps,
            frame_count = config.frame_count,
            "Batch started",
        );

        let mut processed = 0;
        for (position, video) in videos.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    dataset_id,
                    remaining = total - position,
                    "Batch cancelled before completion",
                );
                break;
            }

            let outcome = self
                .process_video(&dataset, video.id, position + 1, config)
                .await;
            if outcome == VideoOutcome::Processed {
                processed += 1;
            }
        }

        let summary = BatchSummary::new(processed, total);
        tracing::info!(
            dataset_id,
            processed = summary.processed_count,
            failed = summary.failed_count(),
            "Batch finished",
        );
        Ok(summary)
    }

    /// Run one video through the lifecycle. Database failures are logged and
    /// count as a failed video so the rest of the batch still runs.
    async fn process_video(
        &self,
        dataset: &Dataset,
        video_id: DbId,
        index: usize,
        config: BatchConfig,
    ) -> VideoOutcome {
        match self.try_process_video(dataset, video_id, index, config).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    dataset_id = dataset.id,
                    video_id,
                    error = %e,
                    "Database error while processing video",
                );
                if let Err(e) = VideoRepo::mark_error(&self.pool, video_id).await {
                    tracing::warn!(video_id, error = %e, "Failed to record video error");
                }
                VideoOutcome::Failed
            }
        }
    }

    async fn try_process_video(
        &self,
        dataset: &Dataset,
        video_id: DbId,
        index: usize,
        config: BatchConfig,
    ) -> AppResult<VideoOutcome> {
        // Read right before converting so edits made since the batch started
        // are honoured.
        let Some(video) = VideoRepo::find_by_id(&self.pool, video_id).await? else {
            tracing::info!(dataset_id = dataset.id, video_id, "Video deleted mid-batch");
            return Ok(VideoOutcome::Skipped);
        };
        if !permits(dataset.id, &video, VideoStatus::Pending)
            || !VideoRepo::mark_pending(&self.pool, video_id).await?
        {
            return Ok(VideoOutcome::Skipped);
        }

        let job = self.conversion_job(dataset, &video, index, config);
        tracing::debug!(
            dataset_id = dataset.id,
            video_id,
            output = %job.output.display(),
            "Converting video",
        );
        let result = self.converter.convert(&job).await;
        if let Err(e) = &result {
            tracing::warn!(
                dataset_id = dataset.id,
                video_id,
                exit_code = ?e.exit_code(),
                error = %e,
                "Video conversion failed",
            );
        }

        let next = if result.is_ok() {
            VideoStatus::Processed
        } else {
            VideoStatus::Error
        };
        let Some(current) = VideoRepo::find_by_id(&self.pool, video_id).await? else {
            tracing::info!(dataset_id = dataset.id, video_id, "Video deleted during conversion");
            return Ok(VideoOutcome::Skipped);
        };
        if !permits(dataset.id, &current, next) {
            return Ok(VideoOutcome::Skipped);
        }

        let recorded = match next {
            VideoStatus::Processed => {
                VideoRepo::mark_processed(&self.pool, video_id, config.fps, config.frame_count)
                    .await?
            }
            _ => VideoRepo::mark_error(&self.pool, video_id).await?,
        };
        if recorded.is_none() {
            tracing::warn!(
                dataset_id = dataset.id,
                video_id,
                status = %next,
                "Video status changed during conversion, result not recorded",
            );
            return Ok(VideoOutcome::Skipped);
        }

        Ok(if next == VideoStatus::Processed {
            VideoOutcome::Processed
        } else {
            VideoOutcome::Failed
        })
    }

    fn conversion_job(
        &self,
        dataset: &Dataset,
        video: &Video,
        index: usize,
        config: BatchConfig,
    ) -> ConversionJob {
        ConversionJob {
            source: self.storage.raw_path(&video.filepath),
            output: self.storage.output_path(dataset.id, &dataset.name, index),
            start_time: video.start_time,
            crop: video.crop(),
            resolution: video.resolution,
            fps: config.fps,
            frame_count: config.frame_count,
        }
    }
}

/// Check a status move against the lifecycle rules, logging a refusal.
fn permits(dataset_id: DbId, video: &Video, next: VideoStatus) -> bool {
    match video.status.transition(next) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(dataset_id, video_id = video.id, error = %e, "Status change refused");
            false
        }
    }
}
