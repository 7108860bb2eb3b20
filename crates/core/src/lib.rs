//! Reelset domain logic.
//!
//! Pure building blocks shared by the database and API crates: crop
//! geometry, video status rules, metadata extraction and clip conversion,
//! batch naming and summaries, and the progress projection.

pub mod batch;
pub mod dataset;
pub mod error;
pub mod ffmpeg;
pub mod geometry;
pub mod lifecycle;
pub mod progress;
pub mod resolution;
pub mod storage;
pub mod types;
