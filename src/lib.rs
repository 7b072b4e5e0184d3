//! gscribe - Cloud transcription for local audio and video files
//!
//! Stages a local file in Cloud Storage, runs an asynchronous Speech-to-Text
//! job against it, and writes the transcript to a local text file.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod diagnostics;
pub mod error;
pub mod gcp;
pub mod media;
pub mod pipeline;

// Core traits (probe → transcode → stage → recognize)
pub use gcp::auth::TokenProvider;
pub use gcp::speech::RecognitionApi;
pub use gcp::storage::StagingStore;
pub use media::probe::{MediaInspector, MediaMetadata};
pub use media::transcode::MediaTranscoder;

// Pipeline
pub use gcp::speech::{JobClient, TranscriptSegment};
pub use pipeline::{Pipeline, PipelineOptions};

// Error handling
pub use error::{GscribeError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}
