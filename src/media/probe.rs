//! Media metadata probing via ffprobe.
//!
//! The pipeline needs a handful of attributes (channel layout, codec, duration,
//! sample rate) before it decides how to stage a file. ffprobe already knows how
//! to read every container we care about, so this module shells out to it and
//! parses its JSON report instead of linking a demuxer.

use crate::error::{GscribeError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Immutable metadata snapshot of a local media file.
///
/// All eight attributes are mandatory: a probe that cannot determine one of
/// them is a failed probe, never a partially filled record.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMetadata {
    pub filename: PathBuf,
    pub channels: u32,
    pub codec_type: String,
    /// Duration in seconds.
    pub duration: f64,
    /// Sample-accurate duration in stream time-base ticks.
    pub duration_ts: i64,
    pub format_name: String,
    pub sample_rate: u32,
    /// File size in bytes.
    pub size: u64,
}

impl std::fmt::Display for MediaMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "filename: {}, channels: {}, codec_type: {}, duration: {}, duration_ts: {}, format_name: {}, sample_rate: {}, size: {}",
            self.filename.display(),
            self.channels,
            self.codec_type,
            self.duration,
            self.duration_ts,
            self.format_name,
            self.sample_rate,
            self.size
        )
    }
}

/// Trait for media metadata extraction.
///
/// This trait allows swapping implementations (real ffprobe vs mock).
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Probe a local file and return its full metadata record.
    async fn inspect(&self, path: &Path) -> Result<MediaMetadata>;
}

/// ffprobe-backed inspector.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    binary: String,
}

impl FfprobeInspector {
    pub fn new() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }

    /// Override the probe binary (used by tests and unusual installs).
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn inspect(&self, path: &Path) -> Result<MediaMetadata> {
        if !path.is_file() {
            return Err(GscribeError::Inspection {
                path: path.to_string_lossy().to_string(),
                message: "file does not exist".to_string(),
            });
        }

        let output = Command::new(&self.binary)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .await
            .map_err(|e| GscribeError::Inspection {
                path: path.to_string_lossy().to_string(),
                message: format!("failed to run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GscribeError::Inspection {
                path: path.to_string_lossy().to_string(),
                message: format!("ffprobe failed: {}", stderr.trim()),
            });
        }

        parse_probe_report(path, &output.stdout)
    }
}

// ffprobe's JSON mixes numeric and string-encoded numbers; the report structs
// below keep everything optional so missing attributes surface as errors with
// the attribute name rather than a serde parse failure.

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
    duration_ts: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    size: Option<String>,
}

fn missing(path: &Path, attribute: &str) -> GscribeError {
    GscribeError::Inspection {
        path: path.to_string_lossy().to_string(),
        message: format!("missing {}", attribute),
    }
}

/// Parse an ffprobe JSON report into a complete metadata record.
///
/// Fails if any of the eight mandatory attributes is absent or malformed.
fn parse_probe_report(path: &Path, report: &[u8]) -> Result<MediaMetadata> {
    let report: ProbeReport =
        serde_json::from_slice(report).map_err(|e| GscribeError::Inspection {
            path: path.to_string_lossy().to_string(),
            message: format!("unreadable ffprobe report: {}", e),
        })?;

    let stream = report
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .ok_or_else(|| missing(path, "audio stream"))?;
    let format = report.format.as_ref().ok_or_else(|| missing(path, "format"))?;

    let channels = stream.channels.ok_or_else(|| missing(path, "channels"))?;
    let codec_type = stream
        .codec_type
        .clone()
        .ok_or_else(|| missing(path, "codec_type"))?;
    let duration_ts = stream
        .duration_ts
        .ok_or_else(|| missing(path, "duration_ts"))?;
    let sample_rate = stream
        .sample_rate
        .as_deref()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| missing(path, "sample_rate"))?;

    let format_name = format
        .format_name
        .clone()
        .ok_or_else(|| missing(path, "format_name"))?;
    let duration = format
        .duration
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| missing(path, "duration"))?;
    let size = format
        .size
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| missing(path, "size"))?;

    if channels == 0 {
        return Err(missing(path, "channels"));
    }
    if sample_rate == 0 {
        return Err(missing(path, "sample_rate"));
    }

    Ok(MediaMetadata {
        filename: path.to_path_buf(),
        channels,
        codec_type,
        duration,
        duration_ts,
        format_name,
        sample_rate,
        size,
    })
}

/// Mock inspector for testing
#[derive(Debug, Clone)]
pub struct MockInspector {
    metadata: MediaMetadata,
    should_fail: bool,
}

impl MockInspector {
    /// Create a mock that reports plausible metadata for any path.
    pub fn new() -> Self {
        Self {
            metadata: MediaMetadata {
                filename: PathBuf::new(),
                channels: 1,
                codec_type: "audio".to_string(),
                duration: 12.5,
                duration_ts: 551250,
                format_name: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
                sample_rate: 44100,
                size: 204800,
            },
            should_fail: false,
        }
    }

    /// Configure the channel count the mock reports.
    pub fn with_channels(mut self, channels: u32) -> Self {
        self.metadata.channels = channels;
        self
    }

    /// Configure the mock to fail on inspect.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Default for MockInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaInspector for MockInspector {
    async fn inspect(&self, path: &Path) -> Result<MediaMetadata> {
        if self.should_fail {
            return Err(GscribeError::Inspection {
                path: path.to_string_lossy().to_string(),
                message: "mock inspection failure".to_string(),
            });
        }
        let mut metadata = self.metadata.clone();
        metadata.filename = path.to_path_buf();
        Ok(metadata)
    }
}
