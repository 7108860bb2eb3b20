//! Per-dataset batch exclusivity.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use reelset_core::error::CoreError;
use reelset_core::types::DbId;

/// Set of datasets with a batch in flight.
///
/// Cloneable handle; designed to live in `AppState`.
#[derive(Debug, Clone, Default)]
pub struct BatchGuard {
    running: Arc<Mutex<HashSet<DbId>>>,
}

impl BatchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `dataset_id` for a batch run.
    ///
    /// Fails with [`CoreError::Conflict`] while another batch holds it. The
    /// claim is released when the returned permit is dropped.
    pub fn acquire(&self, dataset_id: DbId) -> Result<BatchPermit, CoreError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.insert(dataset_id) {
            return Err(CoreError::Conflict(format!(
                "A batch is already running for dataset {dataset_id}"
            )));
        }
        Ok(BatchPermit {
            dataset_id,
            running: Arc::clone(&self.running),
        })
    }

    pub fn is_running(&self, dataset_id: DbId) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&dataset_id)
    }
}

/// Proof that the holder owns a dataset's batch slot.
#[derive(Debug)]
pub struct BatchPermit {
    dataset_id: DbId,
    running: Arc<Mutex<HashSet<DbId>>>,
}

impl BatchPermit {
    pub fn dataset_id(&self) -> DbId {
        self.dataset_id
    }
}

impl Drop for BatchPermit {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.dataset_id);
    }
}
