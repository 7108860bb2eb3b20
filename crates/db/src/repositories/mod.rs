//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&SqlitePool` as the first argument.

pub mod dataset_repo;
pub mod video_repo;

pub use dataset_repo::DatasetRepo;
pub use video_repo::VideoRepo;
