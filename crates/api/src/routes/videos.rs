//! Route definitions for the `/videos` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::video;
use crate::state::AppState;

/// Routes mounted at `/videos`.
///
/// ```text
/// GET    /{id}                      -> get_by_id
/// PATCH  /{id}                      -> update
/// DELETE /{id}                      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(video::get_by_id)
            .patch(video::update)
            .delete(video::delete),
    )
}
