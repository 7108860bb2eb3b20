//! Handlers for the `/datasets` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use reelset_core::error::CoreError;
use reelset_core::storage::{remove_dir_best_effort, remove_file_best_effort};
use reelset_core::types::DbId;
use reelset_db::models::dataset::{CreateDataset, Dataset};
use reelset_db::repositories::{DatasetRepo, VideoRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::require_dataset;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/datasets
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateDataset>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<Dataset>>)> {
    let Json(input) = payload?;
    let name = reelset_core::dataset::validate_name(&input.name)?;
    let dataset = DatasetRepo::create(&state.pool, &CreateDataset { name }).await?;
    tracing::info!(dataset_id = dataset.id, name = %dataset.name, "Dataset created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: dataset })))
}

/// GET /api/v1/datasets
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Dataset>>>> {
    let datasets = DatasetRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: datasets }))
}

/// GET /api/v1/datasets/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Dataset>>> {
    let dataset = require_dataset(&state.pool, id).await?;
    Ok(Json(DataResponse { data: dataset }))
}

/// DELETE /api/v1/datasets/{id}
///
/// Removes every raw upload and the processed output directory, then the
/// dataset row (videos cascade). File removal is best-effort. Refused while a
/// batch is running on the dataset.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let dataset = require_dataset(&state.pool, id).await?;
    if state.batches.is_running(id) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Dataset {id} has a batch in progress"
        ))));
    }

    let videos = VideoRepo::list_by_dataset(&state.pool, id).await?;
    for video in &videos {
        remove_file_best_effort(&state.storage.raw_path(&video.filepath)).await;
    }
    remove_dir_best_effort(&state.storage.upload_dir(id)).await;
    remove_dir_best_effort(&state.storage.output_dir(id, &dataset.name)).await;

    if !DatasetRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Dataset",
            id,
        }));
    }
    state.progress.remove(id).await;

    tracing::info!(dataset_id = id, videos = videos.len(), "Dataset deleted");
    Ok(StatusCode::NO_CONTENT)
}
