//! Asynchronous Speech-to-Text recognition jobs.
//!
//! Submission returns a long-running operation name; the job client polls it
//! on a fixed interval until the operation resolves, a configured deadline
//! passes, or the run is cancelled. A failed progress read is transient: the
//! job keeps running server-side, so the client logs and keeps polling.

use crate::config::RecognitionSettings;
use crate::error::{GscribeError, Result};
use crate::gcp::auth::TokenProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SPEECH_API: &str = "https://speech.googleapis.com/v1p1beta1";

/// One recognized utterance, in service-returned order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// Last-observed state of a recognition operation.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Running { progress: u8 },
    Succeeded { segments: Vec<TranscriptSegment> },
    Failed { message: String },
}

/// Trait for the raw recognition job API.
///
/// This trait allows swapping implementations (real Speech-to-Text vs mock).
#[async_trait]
pub trait RecognitionApi: Send + Sync {
    /// Submit a long-running recognition job. Returns the operation name.
    async fn submit(&self, storage_uri: &str, settings: &RecognitionSettings) -> Result<String>;

    /// Read the operation's current state.
    async fn poll(&self, operation: &str) -> Result<JobStatus>;
}

// Request wire format. The sample rate is intentionally left out of the
// request: the FLAC container already declares it.

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    config: RequestConfig<'a>,
    audio: RequestAudio<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestConfig<'a> {
    encoding: &'static str,
    language_code: &'a str,
    enable_automatic_punctuation: bool,
    diarization_config: DiarizationConfig,
    use_enhanced: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DiarizationConfig {
    enable_speaker_diarization: bool,
    min_speaker_count: u32,
    max_speaker_count: u32,
}

#[derive(Debug, Serialize)]
struct RequestAudio<'a> {
    uri: &'a str,
}

fn build_request<'a>(storage_uri: &'a str, settings: &'a RecognitionSettings) -> RecognizeRequest<'a> {
    RecognizeRequest {
        config: RequestConfig {
            encoding: "FLAC",
            language_code: &settings.language,
            enable_automatic_punctuation: settings.punctuation,
            diarization_config: DiarizationConfig {
                enable_speaker_diarization: true,
                min_speaker_count: settings.min_speakers,
                max_speaker_count: settings.max_speakers,
            },
            use_enhanced: settings.enhanced_model,
        },
        audio: RequestAudio { uri: storage_uri },
    }
}

// Operation wire format.

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    #[serde(default)]
    done: bool,
    metadata: Option<OperationMetadata>,
    response: Option<RecognizeResponse>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationMetadata {
    progress_percent: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognizeResult>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternatives: Vec<RecognizeAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognizeAlternative {
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: Option<String>,
}

/// Map a polled operation onto the job state machine.
///
/// Only the top (first, highest-confidence) alternative of each result is kept.
fn operation_status(operation: Operation) -> JobStatus {
    if !operation.done {
        let progress = operation
            .metadata
            .and_then(|m| m.progress_percent)
            .unwrap_or(0)
            .min(100);
        return JobStatus::Running { progress };
    }

    if let Some(error) = operation.error {
        return JobStatus::Failed {
            message: error
                .message
                .unwrap_or_else(|| "unspecified service error".to_string()),
        };
    }

    match operation.response {
        Some(response) => {
            let segments = response
                .results
                .into_iter()
                .filter_map(|r| r.alternatives.into_iter().next())
                .map(|a| TranscriptSegment { text: a.transcript })
                .collect();
            JobStatus::Succeeded { segments }
        }
        None => JobStatus::Failed {
            message: "operation resolved without a result".to_string(),
        },
    }
}

/// Speech-to-Text REST client.
pub struct SpeechClient {
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl SpeechClient {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
        }
    }
}

#[async_trait]
impl RecognitionApi for SpeechClient {
    async fn submit(&self, storage_uri: &str, settings: &RecognitionSettings) -> Result<String> {
        let token = self.tokens.access_token().await?;
        let request = build_request(storage_uri, settings);

        let response = self
            .client
            .post(format!("{}/speech:longrunningrecognize", SPEECH_API))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| GscribeError::RecognitionJob {
                message: format!("submission failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GscribeError::RecognitionJob {
                message: format!("submission returned {}: {}", status, body),
            });
        }

        let submitted: SubmitResponse =
            response.json().await.map_err(|e| GscribeError::RecognitionJob {
                message: format!("malformed submission response: {}", e),
            })?;

        submitted.name.ok_or_else(|| GscribeError::RecognitionJob {
            message: "submission response carried no operation name".to_string(),
        })
    }

    async fn poll(&self, operation: &str) -> Result<JobStatus> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .get(format!("{}/operations/{}", SPEECH_API, operation))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| GscribeError::RecognitionJob {
                message: format!("progress read failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(GscribeError::RecognitionJob {
                message: format!("progress read returned {}", status),
            });
        }

        let operation: Operation =
            response.json().await.map_err(|e| GscribeError::RecognitionJob {
                message: format!("malformed operation: {}", e),
            })?;

        Ok(operation_status(operation))
    }
}

/// Progress callback invoked with the last-observed percentage (0–100).
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

/// Supervises one recognition job from submission to resolution.
///
/// Read-only after construction; safe to reuse across sequential runs.
pub struct JobClient {
    api: Arc<dyn RecognitionApi>,
    poll_interval: Duration,
    timeout: Duration,
    quiet: bool,
    progress: Option<ProgressFn>,
}

impl JobClient {
    pub fn new(api: Arc<dyn RecognitionApi>) -> Self {
        Self {
            api,
            poll_interval: Duration::from_secs(crate::defaults::POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(crate::defaults::JOB_TIMEOUT_SECS),
            quiet: false,
            progress: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Observe progress updates (strictly increasing, 0–100).
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(&self, percent: u8) {
        if let Some(progress) = &self.progress {
            progress(percent);
        }
    }

    /// Submit a job and block until it resolves, times out, or is cancelled.
    ///
    /// State machine: Submitted → Running (self-loop while polling) →
    /// Succeeded | Failed. Terminal states are final; retry means a fresh
    /// submission by the caller.
    pub async fn submit_and_await(
        &self,
        storage_uri: &str,
        settings: &RecognitionSettings,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranscriptSegment>> {
        let operation = self.api.submit(storage_uri, settings).await?;
        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut last_progress = 0u8;

        loop {
            match self.api.poll(&operation).await {
                Ok(JobStatus::Succeeded { segments }) => {
                    self.report(100);
                    return Ok(segments);
                }
                Ok(JobStatus::Failed { message }) => {
                    return Err(GscribeError::RecognitionJob { message });
                }
                Ok(JobStatus::Running { progress }) => {
                    if progress > last_progress {
                        last_progress = progress;
                        self.report(progress);
                    }
                }
                // The job keeps running server-side; a failed read is not a
                // failed job.
                Err(e) => {
                    if !self.quiet {
                        eprintln!("Progress read failed ({}), still polling.", e);
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(GscribeError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(GscribeError::Timeout { limit: self.timeout });
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

/// Scripted poll outcome for the mock API.
#[derive(Debug, Clone)]
enum PollScript {
    Status(JobStatus),
    Transient,
}

/// Mock recognition API for testing
#[derive(Debug, Default)]
pub struct MockRecognitionApi {
    script: std::sync::Mutex<VecDeque<PollScript>>,
    submissions: std::sync::Mutex<Vec<String>>,
    fail_submit: bool,
}

impl MockRecognitionApi {
    /// Create a mock with an empty poll script.
    ///
    /// An exhausted script keeps reporting Running at the last progress seen,
    /// so unterminated scripts surface as a timeout in tests.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_running(self, progress: u8) -> Self {
        self.push(PollScript::Status(JobStatus::Running { progress }));
        self
    }

    pub fn then_transient_error(self) -> Self {
        self.push(PollScript::Transient);
        self
    }

    pub fn then_succeeded(self, texts: &[&str]) -> Self {
        self.push(PollScript::Status(JobStatus::Succeeded {
            segments: texts.iter().map(|t| TranscriptSegment::new(t)).collect(),
        }));
        self
    }

    pub fn then_failed(self, message: &str) -> Self {
        self.push(PollScript::Status(JobStatus::Failed {
            message: message.to_string(),
        }));
        self
    }

    /// Configure the mock to reject the submission itself.
    pub fn with_submit_failure(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    /// Storage URIs submitted so far.
    pub fn submissions(&self) -> Vec<String> {
        self.submissions.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, entry: PollScript) {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).push_back(entry);
    }
}

#[async_trait]
impl RecognitionApi for MockRecognitionApi {
    async fn submit(&self, storage_uri: &str, _settings: &RecognitionSettings) -> Result<String> {
        if self.fail_submit {
            return Err(GscribeError::RecognitionJob {
                message: "mock submission failure".to_string(),
            });
        }
        self.submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(storage_uri.to_string());
        Ok("mock-operation-1".to_string())
    }

    async fn poll(&self, _operation: &str) -> Result<JobStatus> {
        match self.script.lock().unwrap_or_else(|e| e.into_inner()).pop_front() {
            Some(PollScript::Status(status)) => Ok(status),
            Some(PollScript::Transient) => Err(GscribeError::Other(
                "mock transient progress failure".to_string(),
            )),
            None => Ok(JobStatus::Running { progress: 99 }),
        }
    }
}
