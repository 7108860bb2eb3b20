//! Dataset batch engine.
//!
//! Contains the Batch Processor that converts a dataset's videos one at a
//! time, the per-dataset progress tracker registry polled by clients, and
//! the guard that keeps at most one batch running per dataset.

pub mod batch;
pub mod guard;
pub mod progress;
