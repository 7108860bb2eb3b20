//! Handlers for dataset batch processing and progress polling.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use reelset_core::batch::{BatchConfig, BatchRequest, BatchSummary};
use reelset_core::progress::{ProgressReport, StatusEntry};
use reelset_core::types::DbId;
use reelset_db::repositories::VideoRepo;
use reelset_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::handlers::require_dataset;
use crate::response::DataResponse;
use crate::state::AppState;

async fn status_entries(pool: &DbPool, dataset_id: DbId) -> AppResult<Vec<StatusEntry>> {
    let videos = VideoRepo::list_by_dataset(pool, dataset_id).await?;
    Ok(videos.iter().map(|v| v.status_entry()).collect())
}

/// POST /api/v1/datasets/{id}/process
///
/// Runs the batch to completion before responding. The batch runs on its
/// own task and finishes even if the client disconnects.
pub async fn process(
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> AppResult<Json<DataResponse<BatchSummary>>> {
    let Json(request) = payload?;
    let config = BatchConfig::try_from(request)?;
    require_dataset(&state.pool, dataset_id).await?;

    let permit = state.batches.acquire(dataset_id)?;
    let entries = status_entries(&state.pool, dataset_id).await?;
    state.progress.start(dataset_id, &entries).await;

    let processor = state.batch_processor();
    let handle = tokio::spawn(async move {
        let result = processor.process_dataset(dataset_id, config).await;
        drop(permit);
        result
    });

    let summary = handle
        .await
        .map_err(|e| AppError::InternalError(format!("Batch task failed: {e}")))??;
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/datasets/{id}/progress
pub async fn progress(
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProgressReport>>> {
    require_dataset(&state.pool, dataset_id).await?;
    let entries = status_entries(&state.pool, dataset_id).await?;
    let report = state.progress.poll(dataset_id, &entries).await;
    Ok(Json(DataResponse { data: report }))
}

/// DELETE /api/v1/datasets/{id}/progress
pub async fn stop_progress(
    State(state): State<AppState>,
    Path(dataset_id): Path<DbId>,
) -> AppResult<StatusCode> {
    require_dataset(&state.pool, dataset_id).await?;
    state.progress.stop(dataset_id).await;
    Ok(StatusCode::NO_CONTENT)
}
