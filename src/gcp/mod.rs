//! Google Cloud integration: authentication, object-storage staging, and the
//! asynchronous Speech-to-Text recognition job.

pub mod auth;
pub mod speech;
pub mod storage;

pub use auth::{ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
pub use speech::{JobClient, JobStatus, MockRecognitionApi, RecognitionApi, SpeechClient, TranscriptSegment};
pub use storage::{MockStagingStore, StagingClient, StagingStore};
