//! On-disk layout for raw uploads and processed clips.
//!
//! ```text
//! {storage_root}/uploads/{dataset_id}/{stored_name}         raw uploads
//! {output_root}/{dataset_name}_{dataset_id}/item_0001.mp4   processed clips
//! ```
//!
//! Video records store the raw path relative to `storage_root`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::batch::output_filename;
use crate::error::CoreError;
use crate::types::DbId;

/// Upload extensions accepted as raw video.
pub const SUPPORTED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi", "m4v"];

/// Directory under `storage_root` holding raw uploads.
const UPLOADS_DIR: &str = "uploads";

#[derive(Debug, Clone)]
pub struct StorageLayout {
    storage_root: PathBuf,
    output_root: PathBuf,
}

impl StorageLayout {
    pub fn new(storage_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            output_root: output_root.into(),
        }
    }

    /// Directory holding a dataset's raw uploads.
    pub fn upload_dir(&self, dataset_id: DbId) -> PathBuf {
        self.storage_root
            .join(UPLOADS_DIR)
            .join(dataset_id.to_string())
    }

    /// Storage-relative path recorded on the video row.
    pub fn relative_upload_path(dataset_id: DbId, stored_name: &str) -> String {
        format!("{UPLOADS_DIR}/{dataset_id}/{stored_name}")
    }

    /// Absolute location of a stored raw file.
    pub fn raw_path(&self, relative: &str) -> PathBuf {
        self.storage_root.join(relative)
    }

    /// Directory receiving a dataset's processed clips. The id suffix keeps
    /// datasets with the same name apart.
    pub fn output_dir(&self, dataset_id: DbId, dataset_name: &str) -> PathBuf {
        self.output_root
            .join(format!("{}_{dataset_id}", sanitize_component(dataset_name)))
    }

    /// Processed clip path for the video at 1-based `index`.
    pub fn output_path(&self, dataset_id: DbId, dataset_name: &str, index: usize) -> PathBuf {
        self.output_dir(dataset_id, dataset_name)
            .join(output_filename(index))
    }
}

/// Reduce a user-supplied name to a single safe path component.
///
/// Keeps ASCII alphanumerics, `-`, `_` and `.`; everything else becomes `_`.
/// Names that would be empty or consist only of dots map to `"unnamed"`.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Lowercased extension of `filename`, validated against
/// [`SUPPORTED_VIDEO_EXTENSIONS`].
pub fn validate_video_extension(filename: &str) -> Result<String, CoreError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if SUPPORTED_VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "Unsupported video format '.{ext}'. Supported: {}",
            SUPPORTED_VIDEO_EXTENSIONS.join(", ")
        )))
    }
}

/// Unique stored name for an upload: `{stamp}_{sanitized original}`.
pub fn stored_upload_name(original: &str, stamp: i64) -> String {
    let base = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(original);
    format!("{stamp}_{}", sanitize_component(base))
}

/// Remove a file, treating "already gone" as success.
///
/// Other failures are logged and reported as `false`; callers continue.
pub async fn remove_file_best_effort(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove file");
            false
        }
    }
}

/// Recursively remove a directory, treating "already gone" as success.
pub async fn remove_dir_best_effort(path: &Path) -> bool {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove directory");
            false
        }
    }
}
