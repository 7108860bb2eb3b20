//! Per-dataset progress tracker registry.
//!
//! One [`ProgressTracker`] per dataset, started when a batch is triggered
//! and advanced by each progress poll. Trackers stay after reaching a final
//! phase so late polls still see the settled report; the next batch on the
//! same dataset replaces them.

use std::collections::HashMap;
use std::time::Instant;

use reelset_core::progress::{
    derive_progress, is_complete, PollPhase, PollTiming, ProgressReport, ProgressTracker,
    StatusEntry,
};
use reelset_core::types::DbId;
use tokio::sync::Mutex;

pub struct ProgressRegistry {
    timing: PollTiming,
    trackers: Mutex<HashMap<DbId, ProgressTracker>>,
}

impl ProgressRegistry {
    pub fn new(timing: PollTiming) -> Self {
        Self {
            timing,
            trackers: Mutex::new(HashMap::new()),
        }
    }

    /// Start (or restart) tracking a dataset, returning the kickoff report.
    pub async fn start(&self, dataset_id: DbId, entries: &[StatusEntry]) -> ProgressReport {
        let tracker = ProgressTracker::start(entries, Instant::now(), self.timing);
        let report = tracker.report();
        self.trackers.lock().await.insert(dataset_id, tracker);
        tracing::debug!(dataset_id, videos = entries.len(), "Progress tracking started");
        report
    }

    /// Fold the latest statuses into the dataset's tracker.
    ///
    /// A dataset that is not tracked gets a stateless projection: `done`
    /// once every video has finished.
    pub async fn poll(&self, dataset_id: DbId, entries: &[StatusEntry]) -> ProgressReport {
        let mut trackers = self.trackers.lock().await;
        match trackers.get_mut(&dataset_id) {
            Some(tracker) => {
                let report = tracker.observe(entries, Instant::now());
                if report.phase == PollPhase::TimedOut {
                    tracing::warn!(dataset_id, "Progress tracking hit its time ceiling");
                }
                report
            }
            None => untracked_report(entries),
        }
    }

    /// Stop tracking a dataset. Returns `false` if it was not tracked.
    pub async fn stop(&self, dataset_id: DbId) -> bool {
        match self.trackers.lock().await.get_mut(&dataset_id) {
            Some(tracker) => {
                tracker.stop();
                true
            }
            None => false,
        }
    }

    /// Forget a dataset entirely, e.g. after it was deleted.
    pub async fn remove(&self, dataset_id: DbId) {
        self.trackers.lock().await.remove(&dataset_id);
    }
}

fn untracked_report(entries: &[StatusEntry]) -> ProgressReport {
    let progress = derive_progress(entries, &[]);
    let done = is_complete(&progress);
    ProgressReport {
        entries: progress,
        phase: if done { PollPhase::Done } else { PollPhase::Running },
        done,
    }
}
