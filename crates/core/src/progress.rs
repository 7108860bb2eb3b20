//! Client-facing progress projection over per-video processing status.
//!
//! The mapping from a video's persisted status to a reported
//! `(status, progress, message)` tuple is the single source of truth for
//! every progress consumer. [`ProgressTracker`] adds the polling lifecycle
//! on top: an instant kickoff snapshot, continuity with the previous
//! snapshot, a settle period once everything has finished, and a hard
//! ceiling on total tracking time.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::lifecycle::VideoStatus;
use crate::types::DbId;

/// Progress reported for a video the batch has just been asked to start.
pub const KICKOFF_PROGRESS: u8 = 25;

/// Progress reported while a video is `pending` during a batch.
pub const PROCESSING_PROGRESS: u8 = 75;

/// Progress reported once a video is processed.
pub const COMPLETE_PROGRESS: u8 = 100;

pub const MSG_KICKOFF: &str = "Starting processing...";
pub const MSG_PROCESSING: &str = "Processing video...";
pub const MSG_COMPLETE: &str = "Processing complete";
pub const MSG_FAILED: &str = "Processing failed";
pub const MSG_WAITING: &str = "Waiting to start...";

/// Default settle period after every video has reached a terminal state.
pub const DEFAULT_COMPLETION_GRACE: Duration = Duration::from_secs(2);

/// Default hard ceiling on how long one batch is tracked.
pub const DEFAULT_MAX_TRACKING: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Idle,
    Processing,
    Completed,
    Error,
}

impl ProgressStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Reported progress of one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingProgress {
    pub video_id: DbId,
    pub progress: u8,
    pub status: ProgressStatus,
    pub message: String,
}

/// Persisted status of one video as seen by a poll. `None` means the
/// status is missing or not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    pub video_id: DbId,
    pub status: Option<VideoStatus>,
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Map one video's status to its reported progress.
///
/// | status        | reported   | progress          | message            |
/// |---------------|------------|-------------------|--------------------|
/// | processed     | completed  | 100               | Processing complete|
/// | error         | error      | previous, else 0  | Processing failed  |
/// | pending       | processing | 75                | Processing video...|
/// | other, was processing | processing | previous | previous         |
/// | other         | idle       | 0                 | Waiting to start...|
pub fn derive_entry(
    entry: StatusEntry,
    previous: Option<&ProcessingProgress>,
) -> ProcessingProgress {
    let (status, progress, message) = match entry.status {
        Some(VideoStatus::Processed) => {
            (ProgressStatus::Completed, COMPLETE_PROGRESS, MSG_COMPLETE.to_string())
        }
        Some(VideoStatus::Error) => (
            ProgressStatus::Error,
            previous.map_or(0, |p| p.progress),
            MSG_FAILED.to_string(),
        ),
        Some(VideoStatus::Pending) => (
            ProgressStatus::Processing,
            PROCESSING_PROGRESS,
            MSG_PROCESSING.to_string(),
        ),
        None => match previous {
            Some(p) if p.status == ProgressStatus::Processing => {
                (ProgressStatus::Processing, p.progress, p.message.clone())
            }
            _ => (ProgressStatus::Idle, 0, MSG_WAITING.to_string()),
        },
    };

    ProcessingProgress {
        video_id: entry.video_id,
        progress,
        status,
        message,
    }
}

/// Map every video, pairing each with its entry in `previous` by id.
pub fn derive_progress(
    entries: &[StatusEntry],
    previous: &[ProcessingProgress],
) -> Vec<ProcessingProgress> {
    let by_id: HashMap<DbId, &ProcessingProgress> =
        previous.iter().map(|p| (p.video_id, p)).collect();
    entries
        .iter()
        .map(|e| derive_entry(*e, by_id.get(&e.video_id).copied()))
        .collect()
}

/// Snapshot shown the moment a batch is triggered, before any poll returns.
pub fn kickoff_progress(entries: &[StatusEntry]) -> Vec<ProcessingProgress> {
    entries
        .iter()
        .map(|e| {
            if e.status == Some(VideoStatus::Processed) {
                ProcessingProgress {
                    video_id: e.video_id,
                    progress: COMPLETE_PROGRESS,
                    status: ProgressStatus::Completed,
                    message: MSG_COMPLETE.to_string(),
                }
            } else {
                ProcessingProgress {
                    video_id: e.video_id,
                    progress: KICKOFF_PROGRESS,
                    status: ProgressStatus::Processing,
                    message: MSG_KICKOFF.to_string(),
                }
            }
        })
        .collect()
}

/// `true` when every entry is completed or failed.
pub fn is_complete(progress: &[ProcessingProgress]) -> bool {
    progress.iter().all(|p| p.status.is_finished())
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Timing policy for a tracked batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    /// How long a fully finished snapshot must hold before tracking ends.
    pub completion_grace: Duration,
    /// Tracking ends unconditionally after this long.
    pub max_duration: Duration,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            completion_grace: DEFAULT_COMPLETION_GRACE,
            max_duration: DEFAULT_MAX_TRACKING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    /// At least one video is still in flight.
    Running,
    /// Everything has finished; waiting out the grace period.
    Settling,
    /// Finished and settled. Polling should stop.
    Done,
    /// The ceiling was reached before completion settled.
    TimedOut,
    /// Tracking was stopped explicitly.
    Stopped,
}

impl PollPhase {
    /// Whether a poller should stop.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Done | Self::TimedOut | Self::Stopped)
    }
}

/// What a progress poll returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub entries: Vec<ProcessingProgress>,
    pub phase: PollPhase,
    pub done: bool,
}

/// Tracks one batch's progress across polls.
///
/// All timing decisions take the current instant as an argument so the
/// tracker owns no timers of its own.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    timing: PollTiming,
    started_at: Instant,
    finished_since: Option<Instant>,
    snapshot: Vec<ProcessingProgress>,
    phase: PollPhase,
}

impl ProgressTracker {
    /// Begin tracking with the kickoff snapshot.
    pub fn start(entries: &[StatusEntry], now: Instant, timing: PollTiming) -> Self {
        Self {
            timing,
            started_at: now,
            finished_since: None,
            snapshot: kickoff_progress(entries),
            phase: PollPhase::Running,
        }
    }

    /// Fold the latest persisted statuses into the snapshot and advance the
    /// phase. Once the phase is final the snapshot is frozen.
    pub fn observe(&mut self, entries: &[StatusEntry], now: Instant) -> ProgressReport {
        if self.phase.is_final() {
            return self.report();
        }

        self.snapshot = derive_progress(entries, &self.snapshot);

        if is_complete(&self.snapshot) {
            let since = *self.finished_since.get_or_insert(now);
            self.phase = if now.saturating_duration_since(since) >= self.timing.completion_grace {
                PollPhase::Done
            } else {
                PollPhase::Settling
            };
        } else {
            self.finished_since = None;
            self.phase = PollPhase::Running;
        }

        if !self.phase.is_final()
            && now.saturating_duration_since(self.started_at) >= self.timing.max_duration
        {
            self.phase = PollPhase::TimedOut;
        }

        self.report()
    }

    /// End tracking immediately.
    pub fn stop(&mut self) {
        self.phase = PollPhase::Stopped;
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn report(&self) -> ProgressReport {
        ProgressReport {
            entries: self.snapshot.clone(),
            phase: self.phase,
            done: self.phase.is_final(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(video_id: DbId, status: VideoStatus) -> StatusEntry {
        StatusEntry {
            video_id,
            status: Some(status),
        }
    }

    fn timing() -> PollTiming {
        PollTiming {
            completion_grace: Duration::from_secs(2),
            max_duration: Duration::from_secs(60),
        }
    }

    #[test]
    fn mapping_table() {
        let processed = derive_entry(entry(1, VideoStatus::Processed), None);
        assert_eq!(processed.status, ProgressStatus::Completed);
        assert_eq!(processed.progress, 100);
        assert_eq!(processed.message, MSG_COMPLETE);

        let pending = derive_entry(entry(2, VideoStatus::Pending), None);
        assert_eq!(pending.status, ProgressStatus::Processing);
        assert_eq!(pending.progress, 75);
        assert_eq!(pending.message, MSG_PROCESSING);

        let failed = derive_entry(entry(3, VideoStatus::Error), None);
        assert_eq!(failed.status, ProgressStatus::Error);
        assert_eq!(failed.progress, 0);
        assert_eq!(failed.message, MSG_FAILED);
    }

    #[test]
    fn error_carries_previous_progress() {
        let previous = derive_entry(entry(3, VideoStatus::Pending), None);
        let failed = derive_entry(entry(3, VideoStatus::Error), Some(&previous));
        assert_eq!(failed.progress, 75);
        assert_eq!(failed.status, ProgressStatus::Error);
    }

    #[test]
    fn unknown_status_continues_processing_or_idles() {
        let unknown = StatusEntry {
            video_id: 4,
            status: None,
        };
        let previous = ProcessingProgress {
            video_id: 4,
            progress: 25,
            status: ProgressStatus::Processing,
            message: MSG_KICKOFF.to_string(),
        };
        let carried = derive_entry(unknown, Some(&previous));
        assert_eq!(carried, previous);

        let idle = derive_entry(unknown, None);
        assert_eq!(idle.status, ProgressStatus::Idle);
        assert_eq!(idle.progress, 0);
        assert_eq!(idle.message, MSG_WAITING);
    }

    #[test]
    fn kickoff_snapshot() {
        let snapshot = kickoff_progress(&[
            entry(1, VideoStatus::Processed),
            entry(2, VideoStatus::Error),
            entry(3, VideoStatus::Pending),
        ]);
        assert_eq!(snapshot[0].status, ProgressStatus::Completed);
        assert_eq!(snapshot[0].progress, 100);
        for p in &snapshot[1..] {
            assert_eq!(p.status, ProgressStatus::Processing);
            assert_eq!(p.progress, 25);
            assert_eq!(p.message, MSG_KICKOFF);
        }
        assert!(!is_complete(&snapshot));
    }

    #[test]
    fn empty_batch_is_complete() {
        assert!(is_complete(&[]));
    }

    #[test]
    fn tracker_settles_then_finishes() {
        let t0 = Instant::now();
        let mut tracker = ProgressTracker::start(
            &[entry(1, VideoStatus::Pending), entry(2, VideoStatus::Pending)],
            t0,
            timing(),
        );
        assert_eq!(tracker.phase(), PollPhase::Running);

        let report = tracker.observe(
            &[entry(1, VideoStatus::Processed), entry(2, VideoStatus::Pending)],
            t0 + Duration::from_secs(1),
        );
        assert_eq!(report.phase, PollPhase::Running);
        assert!(!report.done);

        let finished = [entry(1, VideoStatus::Processed), entry(2, VideoStatus::Error)];
        let report = tracker.observe(&finished, t0 + Duration::from_secs(2));
        assert_eq!(report.phase, PollPhase::Settling);
        assert_eq!(report.entries[1].status, ProgressStatus::Error);
        assert_eq!(report.entries[1].progress, 75);

        let report = tracker.observe(&finished, t0 + Duration::from_secs(4));
        assert_eq!(report.phase, PollPhase::Done);
        assert!(report.done);
    }

    #[test]
    fn regression_during_grace_resets_settling() {
        let t0 = Instant::now();
        let mut tracker = ProgressTracker::start(&[entry(1, VideoStatus::Pending)], t0, timing());
        tracker.observe(&[entry(1, VideoStatus::Processed)], t0 + Duration::from_secs(1));
        let report = tracker.observe(
            &[entry(1, VideoStatus::Pending)],
            t0 + Duration::from_secs(2),
        );
        assert_eq!(report.phase, PollPhase::Running);
        let report = tracker.observe(
            &[entry(1, VideoStatus::Processed)],
            t0 + Duration::from_secs(3),
        );
        assert_eq!(report.phase, PollPhase::Settling);
    }

    #[test]
    fn ceiling_stops_unfinished_tracking() {
        let t0 = Instant::now();
        let mut tracker = ProgressTracker::start(&[entry(1, VideoStatus::Pending)], t0, timing());
        let report = tracker.observe(
            &[entry(1, VideoStatus::Pending)],
            t0 + Duration::from_secs(61),
        );
        assert_eq!(report.phase, PollPhase::TimedOut);
        assert!(report.done);

        // Frozen after the ceiling.
        let report = tracker.observe(
            &[entry(1, VideoStatus::Processed)],
            t0 + Duration::from_secs(62),
        );
        assert_eq!(report.entries[0].status, ProgressStatus::Processing);
    }

    #[test]
    fn stop_is_final() {
        let t0 = Instant::now();
        let mut tracker = ProgressTracker::start(&[entry(1, VideoStatus::Pending)], t0, timing());
        tracker.stop();
        let report = tracker.observe(&[entry(1, VideoStatus::Processed)], t0);
        assert_eq!(report.phase, PollPhase::Stopped);
        assert_eq!(report.entries[0].progress, KICKOFF_PROGRESS);
    }

    #[test]
    fn completion_detected_within_one_poll() {
        let t0 = Instant::now();
        let statuses = [entry(1, VideoStatus::Processed), entry(2, VideoStatus::Error)];
        let mut tracker = ProgressTracker::start(&statuses, t0, timing());
        let report = tracker.observe(&statuses, t0);
        assert!(is_complete(&report.entries));
        assert_eq!(report.phase, PollPhase::Settling);
    }
}
