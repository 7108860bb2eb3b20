//! Repository for the `videos` table.
//!
//! Status writes are guarded in SQL: a video can only become `processed` or
//! `error` while it is `pending`, so a stale writer cannot overwrite a newer
//! outcome.

use reelset_core::lifecycle::{VideoConfig, VideoStatus};
use reelset_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::video::{CreateVideo, Video};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, dataset_id, filename, filepath, duration, original_width, \
    original_height, start_time, resolution, crop_x, crop_y, crop_width, crop_height, \
    fps, frame_count, status_id, created_at, updated_at";

/// Provides CRUD and status operations for videos.
pub struct VideoRepo;

impl VideoRepo {
    /// Insert a new video in `pending` status, returning the created row.
    pub async fn create(pool: &SqlitePool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO videos
                (dataset_id, filename, filepath, duration, original_width, original_height,
                 start_time, resolution, crop_x, crop_y, crop_width, crop_height,
                 status_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
             RETURNING {COLUMNS}"
        );
        let crop = input.config.crop;
        sqlx::query_as::<_, Video>(&query)
            .bind(input.dataset_id)
            .bind(&input.filename)
            .bind(&input.filepath)
            .bind(input.frame.duration)
            .bind(input.frame.width)
            .bind(input.frame.height)
            .bind(input.config.start_time)
            .bind(input.config.resolution.as_str())
            .bind(crop.x)
            .bind(crop.y)
            .bind(crop.width)
            .bind(crop.height)
            .bind(VideoStatus::Pending.id())
            .bind(now)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = ?1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a dataset's videos in upload order.
    pub async fn list_by_dataset(
        pool: &SqlitePool,
        dataset_id: DbId,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE dataset_id = ?1 ORDER BY id ASC");
        sqlx::query_as::<_, Video>(&query)
            .bind(dataset_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the editable configuration. Status is left untouched.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_config(
        pool: &SqlitePool,
        id: DbId,
        config: &VideoConfig,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET
                start_time = ?2,
                resolution = ?3,
                crop_x = ?4,
                crop_y = ?5,
                crop_width = ?6,
                crop_height = ?7,
                updated_at = ?8
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(config.start_time)
            .bind(config.resolution.as_str())
            .bind(config.crop.x)
            .bind(config.crop.y)
            .bind(config.crop.width)
            .bind(config.crop.height)
            .bind(chrono::Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Move a video back to `pending` from any status. Returns `true` if the
    /// row exists.
    pub async fn mark_pending(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE videos SET status_id = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(VideoStatus::Pending.id())
            .bind(chrono::Utc::now())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful conversion with the frame rate and frame count
    /// actually used.
    ///
    /// Returns `None` if the row is gone or no longer `pending`.
    pub async fn mark_processed(
        pool: &SqlitePool,
        id: DbId,
        fps: i32,
        frame_count: i32,
    ) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET status_id = ?2, fps = ?3, frame_count = ?4, updated_at = ?5
             WHERE id = ?1 AND status_id = ?6
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(VideoStatus::Processed.id())
            .bind(fps)
            .bind(frame_count)
            .bind(chrono::Utc::now())
            .bind(VideoStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Record a failed conversion.
    ///
    /// Returns `None` if the row is gone or no longer `pending`.
    pub async fn mark_error(pool: &SqlitePool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!(
            "UPDATE videos SET status_id = ?2, updated_at = ?3
             WHERE id = ?1 AND status_id = ?4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .bind(VideoStatus::Error.id())
            .bind(chrono::Utc::now())
            .bind(VideoStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a video row. Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
