//! Repository for the `datasets` table.

use reelset_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::dataset::{CreateDataset, Dataset};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, created_at, updated_at";

/// Provides CRUD operations for datasets.
pub struct DatasetRepo;

impl DatasetRepo {
    /// Insert a new dataset, returning the created row.
    pub async fn create(pool: &SqlitePool, input: &CreateDataset) -> Result<Dataset, sqlx::Error> {
        let now = chrono::Utc::now();
        let query = format!(
            "INSERT INTO datasets (name, created_at, updated_at)
             VALUES (?1, ?2, ?2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dataset>(&query)
            .bind(&input.name)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<Dataset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets WHERE id = ?1");
        sqlx::query_as::<_, Dataset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all datasets, most recently created first.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<Dataset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM datasets ORDER BY id DESC");
        sqlx::query_as::<_, Dataset>(&query).fetch_all(pool).await
    }

    /// Bump `updated_at`, e.g. after a video was added.
    pub async fn touch(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE datasets SET updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(chrono::Utc::now())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a dataset and, through `ON DELETE CASCADE`, its videos.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM datasets WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
