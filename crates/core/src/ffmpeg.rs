//! FFmpeg/FFprobe integration.
//!
//! Two boundaries live here: metadata extraction (ffprobe JSON in, a
//! validated [`VideoProbe`] out) and clip conversion (a [`ConversionJob`] in,
//! success or a failed exit status out). Conversion goes through the
//! [`VideoConverter`] trait so batch orchestration can run against a fake.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geometry::CropRect;
use crate::lifecycle::SourceFrame;
use crate::resolution::Resolution;

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("invalid video metadata: {0}")]
    InvalidMetadata(String),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

impl FfmpegError {
    /// Exit code of the external tool, when it ran and exited with one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExecutionFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_format -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    #[serde(default)]
    pub format: FfprobeFormat,
}

/// A single stream from ffprobe output.
#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// e.g. "30/1" or "24000/1001"
    pub r_frame_rate: Option<String>,
    pub duration: Option<String>,
    pub nb_frames: Option<String>,
}

/// Format-level metadata from ffprobe.
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeFormat {
    pub duration: Option<String>,
}

/// Canonical per-video metadata produced by extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoProbe {
    pub duration: f64,
    pub width: i32,
    pub height: i32,
    pub fps: Option<f64>,
    pub frame_count: Option<i64>,
}

impl VideoProbe {
    pub fn source_frame(&self) -> SourceFrame {
        SourceFrame {
            duration: self.duration,
            width: self.width,
            height: self.height,
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata extraction
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(ffprobe: &Path, path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = tokio::process::Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(e.to_string()))
}

/// Probe a file and normalize the result into a [`VideoProbe`].
pub async fn extract_metadata(ffprobe: &Path, path: &Path) -> Result<VideoProbe, FfmpegError> {
    let probe = probe_video(ffprobe, path).await?;
    metadata_from_probe(&probe)
}

/// Normalize parsed ffprobe output.
///
/// Fails when there is no video stream or when duration, width or height is
/// missing or zero. Frame count prefers `round(fps * duration)`; when the
/// frame rate is unusable the stream's own frame count is used and the rate
/// is back-computed from it.
pub fn metadata_from_probe(probe: &FfprobeOutput) -> Result<VideoProbe, FfmpegError> {
    let stream = first_video_stream(probe).ok_or(FfmpegError::NoVideoStream)?;

    let duration = parse_duration(probe)
        .filter(|d| *d > 0.0)
        .ok_or_else(|| FfmpegError::InvalidMetadata("missing or zero duration".into()))?;
    let width = stream
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| FfmpegError::InvalidMetadata("missing or zero width".into()))?;
    let height = stream
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| FfmpegError::InvalidMetadata("missing or zero height".into()))?;

    let mut fps = stream.r_frame_rate.as_deref().and_then(parse_fraction);
    let frame_count = match fps {
        Some(rate) => Some((rate * duration).round() as i64),
        None => {
            let count = stream
                .nb_frames
                .as_deref()
                .and_then(|n| n.parse::<i64>().ok())
                .filter(|n| *n > 0);
            if let Some(n) = count {
                fps = Some(n as f64 / duration);
            }
            count
        }
    };

    Ok(VideoProbe {
        duration,
        width,
        height,
        fps: fps.map(round_to_hundredths),
        frame_count,
    })
}

/// Find the first video stream in the ffprobe output.
fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Parse the video duration in seconds, preferring the container value.
pub fn parse_duration(probe: &FfprobeOutput) -> Option<f64> {
    let container = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok());
    container.or_else(|| {
        first_video_stream(probe)
            .and_then(|s| s.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
    })
}

/// Parse a rational like `"24000/1001"`. Zero denominators and non-positive
/// rates are rejected.
fn parse_fraction(s: &str) -> Option<f64> {
    let (num, den) = s.split_once('/')?;
    let num = num.trim().parse::<f64>().ok()?;
    let den = den.trim().parse::<f64>().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den).filter(|fps| *fps > 0.0)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// H.264 encoder preset used for every processed clip.
pub const ENCODE_PRESET: &str = "medium";

/// Constant rate factor used for every processed clip.
pub const ENCODE_CRF: u8 = 18;

/// One clip conversion: seek, crop, scale, resample and cut to a fixed
/// number of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub start_time: f64,
    pub crop: CropRect,
    pub resolution: Resolution,
    pub fps: i32,
    pub frame_count: i32,
}

impl ConversionJob {
    /// The `-vf` filter chain: crop the source rectangle, then scale to the
    /// resolution's pixel dimensions.
    pub fn filter_chain(&self) -> String {
        let (out_w, out_h) = self.resolution.dimensions();
        format!(
            "crop={}:{}:{}:{},scale={out_w}:{out_h}",
            self.crop.width, self.crop.height, self.crop.x, self.crop.y
        )
    }

    /// Full ffmpeg argument list. Existing outputs are overwritten.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-y".into(),
            "-ss".into(),
            format!("{:.3}", self.start_time),
            "-i".into(),
            self.source.to_string_lossy().into_owned(),
            "-vf".into(),
            self.filter_chain(),
            "-r".into(),
            self.fps.to_string(),
            "-frames:v".into(),
            self.frame_count.to_string(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            ENCODE_PRESET.into(),
            "-crf".into(),
            ENCODE_CRF.to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-an".into(),
            self.output.to_string_lossy().into_owned(),
        ]
    }
}

/// Runs a [`ConversionJob`] to completion.
///
/// Implementations must treat each call as isolated: a failure affects only
/// the job passed in.
#[async_trait]
pub trait VideoConverter: Send + Sync {
    async fn convert(&self, job: &ConversionJob) -> Result<(), FfmpegError>;
}

/// [`VideoConverter`] backed by an `ffmpeg` child process.
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    binary: PathBuf,
}

impl FfmpegConverter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegConverter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl VideoConverter for FfmpegConverter {
    async fn convert(&self, job: &ConversionJob) -> Result<(), FfmpegError> {
        if !job.source.exists() {
            return Err(FfmpegError::VideoNotFound(
                job.source.to_string_lossy().to_string(),
            ));
        }

        let output = tokio::process::Command::new(&self.binary)
            .args(job.args())
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(FfmpegError::NotFound)?;

        if !output.status.success() {
            return Err(FfmpegError::ExecutionFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(())
    }
}
