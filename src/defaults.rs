//! Default configuration constants for gscribe.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Canonical audio format submitted for recognition.
///
/// FLAC is lossless, well compressed, and accepted by the Speech-to-Text API
/// without a declared sample rate; the rate is read from the container.
pub const CANONICAL_FORMAT: &str = "flac";

/// File extension of the canonical format.
pub const CANONICAL_EXTENSION: &str = "flac";

/// Default recognition language code (BCP-47).
pub const LANGUAGE_CODE: &str = "ja-JP";

/// Default polling interval for the long-running recognition operation, in seconds.
///
/// Recognition of typical narration runs for minutes; polling faster than this
/// only burns quota.
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Default upper bound on how long a recognition job may run before the
/// pipeline gives up, in seconds.
pub const JOB_TIMEOUT_SECS: u64 = 30 * 60;

/// Default suffix appended to the project id to form the staging bucket name.
pub const BUCKET_SUFFIX: &str = "speech-staging";

/// Minimum number of distinct speakers hinted to diarization.
pub const MIN_SPEAKER_COUNT: u32 = 1;

/// Maximum number of distinct speakers hinted to diarization.
pub const MAX_SPEAKER_COUNT: u32 = 2;

/// Default directory for exported transcripts, relative to the working directory.
pub const OUTPUT_DIR: &str = "out";

/// Separator between transcript segments in the exported text.
pub const SEGMENT_SEPARATOR: &str = "\n\n";

/// OAuth2 scope covering both Cloud Storage and Speech-to-Text.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
