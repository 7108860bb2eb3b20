//! Handlers for videos: upload, listing, configuration patches and deletion.

use std::path::Path as FsPath;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use reelset_core::error::CoreError;
use reelset_core::ffmpeg::extract_metadata;
use reelset_core::lifecycle::{apply_patch, SourceFrame, VideoConfig, VideoPatch};
use reelset_core::storage::{
    remove_file_best_effort, stored_upload_name, validate_video_extension, StorageLayout,
};
use reelset_core::types::DbId;
use reelset_db::models::video::{CreateVideo, Video};
use reelset_db::repositories::{DatasetRepo, VideoRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::require_dataset;
use crate::response::DataResponse;
use crate::state::AppState;

/// Filename used when the multipart part carries none.
const DEFAULT_UPLOAD_NAME: &str = "upload.mp4";

fn video_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Video",
        id,
    })
}

/// GET /api/v1/datasets/{id}/videos
///
/// Also the source of truth for progress polling: each row carries its
/// current status.
pub async fn list_by_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Video>>>> {
    require_dataset(&state.pool, dataset_id).await?;
    let videos = VideoRepo::list_by_dataset(&state.pool, dataset_id).await?;
    Ok(Json(DataResponse { data: videos }))
}

/// POST /api/v1/datasets/{id}/videos
///
/// Accepts a multipart form with a required `file` field. The raw file is
/// stored under the dataset's upload directory and probed for metadata; if
/// probing fails the video is created with a fallback 1280x720, 10 s frame.
pub async fn upload(
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Video>>)> {
    require_dataset(&state.pool, dataset_id).await?;

    let mut file: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .and_then(|n| FsPath::new(n).file_name())
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        file = Some((filename, data));
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    validate_video_extension(&filename)?;

    let upload_dir = state.storage.upload_dir(dataset_id);
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let stamp = chrono::Utc::now().timestamp_micros();
    let relative =
        StorageLayout::relative_upload_path(dataset_id, &stored_upload_name(&filename, stamp));
    let absolute = state.storage.raw_path(&relative);
    tokio::fs::write(&absolute, &data)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let frame = match extract_metadata(&state.config.ffprobe_path, &absolute).await {
        Ok(probe) => probe.source_frame(),
        Err(e) => {
            tracing::warn!(
                dataset_id,
                filename = %filename,
                error = %e,
                "Metadata extraction failed, using fallback dimensions",
            );
            SourceFrame::FALLBACK
        }
    };

    let input = CreateVideo {
        dataset_id,
        filename,
        filepath: relative,
        frame,
        config: VideoConfig::initial(&frame),
    };
    let video = match VideoRepo::create(&state.pool, &input).await {
        Ok(video) => video,
        Err(e) => {
            remove_file_best_effort(&absolute).await;
            return Err(e.into());
        }
    };
    DatasetRepo::touch(&state.pool, dataset_id).await?;

    tracing::info!(
        dataset_id,
        video_id = video.id,
        width = video.original_width,
        height = video.original_height,
        duration = video.duration,
        "Video uploaded",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: video })))
}

/// GET /api/v1/videos/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Video>>> {
    let video = VideoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| video_not_found(id))?;
    Ok(Json(DataResponse { data: video }))
}

/// PATCH /api/v1/videos/{id}
///
/// Partial configuration update. Status is never changed here. Unknown or
/// malformed fields are rejected with 400.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    payload: Result<Json<VideoPatch>, JsonRejection>,
) -> AppResult<Json<DataResponse<Video>>> {
    let Json(patch) = payload?;
    let video = VideoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| video_not_found(id))?;

    if patch.is_empty() {
        return Ok(Json(DataResponse { data: video }));
    }

    let config = apply_patch(&video.config(), &patch, &video.source_frame())?;
    let updated = VideoRepo::update_config(&state.pool, id, &config)
        .await?
        .ok_or_else(|| video_not_found(id))?;

    tracing::debug!(
        video_id = id,
        resolution = %updated.resolution,
        crop_x = updated.crop_x,
        crop_y = updated.crop_y,
        crop_width = updated.crop_width,
        crop_height = updated.crop_height,
        "Video configuration updated",
    );
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/videos/{id}
///
/// Removes the raw file best-effort, then the row.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let video = VideoRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| video_not_found(id))?;

    remove_file_best_effort(&state.storage.raw_path(&video.filepath)).await;

    if !VideoRepo::delete(&state.pool, id).await? {
        return Err(video_not_found(id));
    }
    tracing::info!(video_id = id, dataset_id = video.dataset_id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}
