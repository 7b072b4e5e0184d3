//! Local media handling: metadata probing and canonical-format transcoding.

pub mod probe;
pub mod transcode;

pub use probe::{FfprobeInspector, MediaInspector, MediaMetadata, MockInspector};
pub use transcode::{FfmpegTranscoder, MediaTranscoder, MockTranscoder};
