//! Dataset entity model and DTOs.

use reelset_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `datasets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dataset {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDataset {
    pub name: String,
}
