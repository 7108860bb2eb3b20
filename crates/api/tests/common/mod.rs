#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use reelset_core::ffmpeg::{ConversionJob, FfmpegError, VideoConverter};
use reelset_core::lifecycle::{SourceFrame, VideoConfig};
use reelset_core::storage::StorageLayout;
use reelset_db::models::video::{CreateVideo, Video};
use reelset_db::repositories::VideoRepo;
use reelset_db::DbPool;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use reelset_api::config::ServerConfig;
use reelset_api::router::build_app_router;
use reelset_api::state::AppState;

const MULTIPART_BOUNDARY: &str = "reelset-test-boundary";

/// An application under test with its own in-memory database and a
/// temporary storage root that is removed on drop.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub storage: TempDir,
}

impl TestApp {
    /// A fresh handle to the router for one `oneshot` request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn pool(&self) -> &DbPool {
        &self.state.pool
    }
}

/// In-memory database with all migrations applied.
pub async fn test_pool() -> DbPool {
    let pool = reelset_db::create_memory_pool().await.unwrap();
    reelset_db::run_migrations(&pool).await.unwrap();
    pool
}

/// Build a test `ServerConfig` rooted at `storage`.
///
/// `ffprobe` points at a binary that does not exist so uploads always take
/// the fallback-metadata path.
pub fn test_config(storage: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        storage_root: storage.to_path_buf(),
        output_root: storage.join("processed"),
        progress_grace_ms: 0,
        progress_max_secs: 60,
        ffmpeg_path: "ffmpeg".into(),
        ffprobe_path: storage.join("missing-ffprobe"),
    }
}

/// Build the full application router with the production middleware stack
/// and the given converter.
pub async fn build_test_app(converter: Arc<dyn VideoConverter>) -> TestApp {
    build_test_app_with(test_pool().await, converter, CancellationToken::new()).await
}

/// Like [`build_test_app`], over an existing pool and shutdown token.
pub async fn build_test_app_with(
    pool: DbPool,
    converter: Arc<dyn VideoConverter>,
    shutdown: CancellationToken,
) -> TestApp {
    let storage = tempfile::tempdir().unwrap();
    let config = test_config(storage.path());
    let state = AppState::new(pool, config.clone(), converter, shutdown);
    let router = build_app_router(state.clone(), &config);
    TestApp {
        router,
        state,
        storage,
    }
}

/// Test app whose converter succeeds on every job.
pub async fn build_default_app() -> TestApp {
    build_test_app(Arc::new(FakeConverter::default())).await
}

// ---------------------------------------------------------------------------
// Fake converter
// ---------------------------------------------------------------------------

/// Records every job and fails those whose source filename ends with one of
/// the configured suffixes.
#[derive(Default)]
pub struct FakeConverter {
    failing_suffixes: HashSet<String>,
    jobs: Mutex<Vec<ConversionJob>>,
}

impl FakeConverter {
    pub fn failing_on(suffixes: &[&str]) -> Self {
        Self {
            failing_suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn jobs(&self) -> Vec<ConversionJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoConverter for FakeConverter {
    async fn convert(&self, job: &ConversionJob) -> Result<(), FfmpegError> {
        self.jobs.lock().unwrap().push(job.clone());
        let source = job.source.to_string_lossy();
        if self.failing_suffixes.iter().any(|s| source.ends_with(s.as_str())) {
            return Err(FfmpegError::ExecutionFailed {
                exit_code: Some(1),
                stderr: "scripted failure".into(),
            });
        }
        Ok(())
    }
}

/// Succeeds on every job and cancels `token` once the first job is done.
pub struct CancellingConverter {
    token: CancellationToken,
    jobs: Mutex<Vec<ConversionJob>>,
}

impl CancellingConverter {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[async_trait]
impl VideoConverter for CancellingConverter {
    async fn convert(&self, job: &ConversionJob) -> Result<(), FfmpegError> {
        self.jobs.lock().unwrap().push(job.clone());
        self.token.cancel();
        Ok(())
    }
}

/// Signals `started` when a job begins and holds it until `release` fires.
#[derive(Default)]
pub struct GatedConverter {
    pub started: Notify,
    pub release: Notify,
}

#[async_trait]
impl VideoConverter for GatedConverter {
    async fn convert(&self, _job: &ConversionJob) -> Result<(), FfmpegError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

/// Marks every pending video processed at 30 fps behind the batch's back,
/// then reports success.
pub struct RacingConverter {
    pool: DbPool,
}

impl RacingConverter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoConverter for RacingConverter {
    async fn convert(&self, _job: &ConversionJob) -> Result<(), FfmpegError> {
        sqlx::query(
            "UPDATE videos SET status_id = 2, fps = 30, frame_count = 30 WHERE status_id = 1",
        )
        .execute(&self.pool)
        .await
        .unwrap();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a dataset through the API and return its id.
pub async fn create_dataset(app: &TestApp, name: &str) -> i64 {
    let response = post_json(
        app.app(),
        "/api/v1/datasets",
        serde_json::json!({ "name": name }),
    )
    .await;
    let json = body_json(response).await;
    json["data"]["id"].as_i64().unwrap()
}

/// Insert a video row directly with a known source frame. When
/// `write_raw` is set, a placeholder raw file is written at its path.
pub async fn seed_video(
    app: &TestApp,
    dataset_id: i64,
    filename: &str,
    frame: SourceFrame,
    write_raw: bool,
) -> Video {
    let relative = StorageLayout::relative_upload_path(dataset_id, filename);
    if write_raw {
        let path = app.state.storage.raw_path(&relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"raw").unwrap();
    }
    let input = CreateVideo {
        dataset_id,
        filename: filename.to_string(),
        filepath: relative,
        frame,
        config: VideoConfig::initial(&frame),
    };
    VideoRepo::create(app.pool(), &input).await.unwrap()
}

pub fn hd_frame() -> SourceFrame {
    SourceFrame {
        duration: 8.0,
        width: 1920,
        height: 1080,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, Body::empty(), None).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, Body::empty(), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(
        app,
        Method::POST,
        uri,
        Body::from(body.to_string()),
        Some("application/json"),
    )
    .await
}

pub async fn patch_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(
        app,
        Method::PATCH,
        uri,
        Body::from(body.to_string()),
        Some("application/json"),
    )
    .await
}

/// POST a raw body with a JSON content type, for malformed-payload tests.
pub async fn post_raw_json(app: Router, uri: &str, body: &str) -> Response {
    send(
        app,
        Method::POST,
        uri,
        Body::from(body.to_string()),
        Some("application/json"),
    )
    .await
}

/// POST a single-part multipart form.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    field: &str,
    filename: &str,
    data: &[u8],
) -> Response {
    let mut body = format!(
        "--{MULTIPART_BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    let content_type = format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}");
    send(app, Method::POST, uri, Body::from(body), Some(&content_type)).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Body,
    content_type: Option<&str>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header(CONTENT_TYPE, ct);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
