pub mod datasets;
pub mod health;
pub mod videos;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /datasets                                        list, create
/// /datasets/{id}                                   get, delete
/// /datasets/{id}/videos                            list, upload (multipart)
/// /datasets/{id}/process                           run batch (POST)
/// /datasets/{id}/progress                          poll, stop tracking
///
/// /videos/{id}                                     get, patch, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/datasets", datasets::router())
        .nest("/videos", videos::router())
}
