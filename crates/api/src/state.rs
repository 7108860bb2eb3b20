use std::sync::Arc;

use reelset_core::ffmpeg::VideoConverter;
use reelset_core::storage::StorageLayout;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::engine::batch::BatchProcessor;
use crate::engine::guard::BatchGuard;
use crate::engine::progress::ProgressRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: reelset_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Raw upload and processed output locations.
    pub storage: StorageLayout,
    /// Clip converter used by the Batch Processor.
    pub converter: Arc<dyn VideoConverter>,
    /// Per-dataset progress trackers.
    pub progress: Arc<ProgressRegistry>,
    /// Datasets with a batch in flight.
    pub batches: BatchGuard,
    /// Cancelled on server shutdown; checked by running batches.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build state from configuration with the given converter.
    pub fn new(
        pool: reelset_db::DbPool,
        config: ServerConfig,
        converter: Arc<dyn VideoConverter>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            storage: config.storage_layout(),
            progress: Arc::new(ProgressRegistry::new(config.poll_timing())),
            config: Arc::new(config),
            converter,
            batches: BatchGuard::new(),
            shutdown,
        }
    }

    pub fn batch_processor(&self) -> BatchProcessor {
        BatchProcessor::new(
            self.pool.clone(),
            self.storage.clone(),
            Arc::clone(&self.converter),
            self.shutdown.clone(),
        )
    }
}
