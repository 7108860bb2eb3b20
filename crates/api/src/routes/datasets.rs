//! Route definitions for the `/datasets` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{dataset, processing, video};
use crate::state::AppState;

/// Routes mounted at `/datasets`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /{id}                      -> get_by_id
/// DELETE /{id}                      -> delete
///
/// GET    /{id}/videos               -> video::list_by_dataset
/// POST   /{id}/videos               -> video::upload
///
/// POST   /{id}/process              -> processing::process
/// GET    /{id}/progress             -> processing::progress
/// DELETE /{id}/progress             -> processing::stop_progress
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dataset::list).post(dataset::create))
        .route("/{id}", get(dataset::get_by_id).delete(dataset::delete))
        .route(
            "/{id}/videos",
            get(video::list_by_dataset).post(video::upload),
        )
        .route("/{id}/process", post(processing::process))
        .route(
            "/{id}/progress",
            get(processing::progress).delete(processing::stop_progress),
        )
}
