use std::path::PathBuf;
use std::time::Duration;

use reelset_core::progress::PollTiming;
use reelset_core::storage::StorageLayout;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Batch processing runs inside the
    /// request, so the default is generous (`3600`).
    pub request_timeout_secs: u64,
    /// Root for raw uploads (default: `storage`).
    pub storage_root: PathBuf,
    /// Root for processed clips (default: `storage/processed`).
    pub output_root: PathBuf,
    /// Settle period once a tracked batch has finished (default: `2000` ms).
    pub progress_grace_ms: u64,
    /// Hard ceiling on tracking one batch (default: `1800` s).
    pub progress_max_secs: u64,
    /// `ffmpeg` binary used for conversion.
    pub ffmpeg_path: PathBuf,
    /// `ffprobe` binary used for metadata extraction.
    pub ffprobe_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `3600`                     |
    /// | `STORAGE_ROOT`         | `storage`                  |
    /// | `OUTPUT_ROOT`          | `storage/processed`        |
    /// | `PROGRESS_GRACE_MS`    | `2000`                     |
    /// | `PROGRESS_MAX_SECS`    | `1800`                     |
    /// | `FFMPEG_PATH`          | `ffmpeg`                   |
    /// | `FFPROBE_PATH`         | `ffprobe`                  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let storage_root: PathBuf = std::env::var("STORAGE_ROOT")
            .unwrap_or_else(|_| "storage".into())
            .into();

        let output_root: PathBuf = std::env::var("OUTPUT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| storage_root.join("processed"));

        let progress_grace_ms: u64 = std::env::var("PROGRESS_GRACE_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse()
            .expect("PROGRESS_GRACE_MS must be a valid u64");

        let progress_max_secs: u64 = std::env::var("PROGRESS_MAX_SECS")
            .unwrap_or_else(|_| "1800".into())
            .parse()
            .expect("PROGRESS_MAX_SECS must be a valid u64");

        let ffmpeg_path = std::env::var("FFMPEG_PATH")
            .unwrap_or_else(|_| "ffmpeg".into())
            .into();
        let ffprobe_path = std::env::var("FFPROBE_PATH")
            .unwrap_or_else(|_| "ffprobe".into())
            .into();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage_root,
            output_root,
            progress_grace_ms,
            progress_max_secs,
            ffmpeg_path,
            ffprobe_path,
        }
    }

    pub fn storage_layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage_root, &self.output_root)
    }

    pub fn poll_timing(&self) -> PollTiming {
        PollTiming {
            completion_grace: Duration::from_millis(self.progress_grace_ms),
            max_duration: Duration::from_secs(self.progress_max_secs),
        }
    }
}
