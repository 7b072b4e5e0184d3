//! Canonical-format transcoding via ffmpeg.

use crate::error::{GscribeError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Trait for media transcoding.
///
/// This trait allows swapping implementations (real ffmpeg vs mock).
#[async_trait]
pub trait MediaTranscoder: Send + Sync {
    /// Convert `source` into `target_format`, writing the result to `export_path`.
    ///
    /// Creates or overwrites `export_path`.
    async fn transcode(&self, source: &Path, target_format: &str, export_path: &Path)
    -> Result<()>;
}

/// ffmpeg-backed transcoder.
///
/// Video inputs are handled by dropping the video stream and keeping the audio.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }

    /// Override the transcode binary (used by tests and unusual installs).
    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaTranscoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        source: &Path,
        target_format: &str,
        export_path: &Path,
    ) -> Result<()> {
        let output = Command::new(&self.binary)
            .args(["-y", "-v", "error", "-i"])
            .arg(source)
            .args(["-vn", "-f", target_format])
            .arg(export_path)
            .output()
            .await
            .map_err(|e| GscribeError::Transcode {
                message: format!("failed to run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GscribeError::Transcode {
                message: format!(
                    "{} exited with {}: {}",
                    self.binary,
                    output.status,
                    stderr.trim()
                ),
            });
        }

        Ok(())
    }
}

/// Mock transcoder for testing
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    should_fail: bool,
}

impl MockTranscoder {
    /// Create a mock that writes a stub file at the export path.
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    /// Configure the mock to fail on transcode.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaTranscoder for MockTranscoder {
    async fn transcode(
        &self,
        _source: &Path,
        _target_format: &str,
        export_path: &Path,
    ) -> Result<()> {
        if self.should_fail {
            return Err(GscribeError::Transcode {
                message: "mock transcode failure".to_string(),
            });
        }
        // Write a stub so downstream stages see a real file at the export path.
        tokio::fs::write(export_path, b"fLaC").await?;
        Ok(())
    }
}
