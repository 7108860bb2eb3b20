//! HTTP request handlers.
//!
//! Handlers stay thin: extract, validate through `reelset_core`, persist
//! through `reelset_db` repositories, and wrap results in
//! [`DataResponse`](crate::response::DataResponse).

pub mod dataset;
pub mod processing;
pub mod video;

use reelset_core::error::CoreError;
use reelset_core::types::DbId;
use reelset_db::models::dataset::Dataset;
use reelset_db::repositories::DatasetRepo;
use reelset_db::DbPool;

use crate::error::{AppError, AppResult};

/// Load a dataset or fail with 404.
pub(crate) async fn require_dataset(pool: &DbPool, id: DbId) -> AppResult<Dataset> {
    DatasetRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Dataset",
            id,
        }))
}
