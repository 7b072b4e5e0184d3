//! Transcription pipeline orchestrator.
//!
//! One run moves a local media file through a fixed sequence:
//! probe → transcode to canonical FLAC → stage in the bucket → submit and
//! await the recognition job → aggregate the transcript → unstage.
//!
//! Stages never overlap. A staged artifact (the canonical local file, the
//! remote blob) must not outlive the run that created it: on the success path
//! the deletes are pipeline stages whose failures propagate; on every other
//! exit path (error, timeout, cancellation) the run finishes with a
//! best-effort discard of whatever was staged so far.

use crate::config::RecognitionSettings;
use crate::defaults;
use crate::error::{GscribeError, Result};
use crate::gcp::speech::{JobClient, TranscriptSegment};
use crate::gcp::storage::StagingStore;
use crate::media::probe::MediaInspector;
use crate::media::transcode::MediaTranscoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Join transcript segments with a blank-line separator, in service order.
///
/// No re-ordering, no deduplication, no trailing separator.
pub fn join_transcript(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(defaults::SEGMENT_SEPARATOR)
}

/// Canonical export path: the source's basename with the canonical extension,
/// in the same directory as the source.
pub fn canonical_export_path(source: &Path) -> PathBuf {
    source.with_extension(defaults::CANONICAL_EXTENSION)
}

/// Behavior switches for a pipeline instance.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Reject inputs that are not mono before transcoding.
    pub require_mono: bool,
    /// Suppress status messages.
    pub quiet: bool,
    /// Print the probed metadata record.
    pub verbose: bool,
}

/// Artifacts created by the current run that still need to be discarded.
#[derive(Debug, Default)]
struct StagedArtifacts {
    /// Local canonical file, if created.
    local: Option<PathBuf>,
    /// Local path whose basename addresses the staged remote blob, if uploaded.
    remote: Option<PathBuf>,
}

/// Sequences one transcription run and retains its transcript.
///
/// Concurrent runs need independent instances; the clients are read-only
/// after construction and may be shared.
pub struct Pipeline {
    inspector: Arc<dyn MediaInspector>,
    transcoder: Arc<dyn MediaTranscoder>,
    staging: Arc<dyn StagingStore>,
    jobs: JobClient,
    settings: RecognitionSettings,
    options: PipelineOptions,
    transcript: Option<String>,
}

impl Pipeline {
    /// Build a pipeline and provision the staging bucket.
    ///
    /// Bucket provisioning happens once here, not per run.
    pub async fn connect(
        inspector: Arc<dyn MediaInspector>,
        transcoder: Arc<dyn MediaTranscoder>,
        staging: Arc<dyn StagingStore>,
        jobs: JobClient,
        settings: RecognitionSettings,
        options: PipelineOptions,
    ) -> Result<Self> {
        staging.ensure_bucket().await?;
        Ok(Self {
            inspector,
            transcoder,
            staging,
            jobs,
            settings,
            options,
            transcript: None,
        })
    }

    /// Run the full pipeline for one source file.
    ///
    /// On success the transcript is retained for `export`. On any failure the
    /// staged artifacts are discarded best-effort before the error returns.
    pub async fn run(&mut self, source: &Path, cancel: &CancellationToken) -> Result<()> {
        let mut staged = StagedArtifacts::default();
        match self.run_inner(source, cancel, &mut staged).await {
            Ok(transcript) => {
                self.transcript = Some(transcript);
                Ok(())
            }
            Err(e) => {
                self.discard(staged).await;
                Err(e)
            }
        }
    }

    async fn run_inner(
        &self,
        source: &Path,
        cancel: &CancellationToken,
        staged: &mut StagedArtifacts,
    ) -> Result<String> {
        let metadata = self.inspector.inspect(source).await?;
        if self.options.verbose && !self.options.quiet {
            eprintln!("{}", metadata);
        }
        if self.options.require_mono && metadata.channels != 1 {
            return Err(GscribeError::Inspection {
                path: source.to_string_lossy().to_string(),
                message: format!("expected mono audio, got {} channels", metadata.channels),
            });
        }

        let export_path = canonical_export_path(&metadata.filename);
        if export_path == metadata.filename {
            return Err(GscribeError::Transcode {
                message: format!(
                    "{} already uses the canonical extension; rename the input",
                    source.display()
                ),
            });
        }

        self.transcoder
            .transcode(source, defaults::CANONICAL_FORMAT, &export_path)
            .await?;
        staged.local = Some(export_path.clone());

        let blob_name = self.staging.upload(&export_path).await?;
        staged.remote = Some(export_path.clone());

        let storage_uri = self.staging.uri(&blob_name);
        let segments = self
            .jobs
            .submit_and_await(&storage_uri, &self.settings, cancel)
            .await?;
        let transcript = join_transcript(&segments);

        // Stages 6 and 7: unstaging is part of the pipeline here, so failures
        // propagate. Each artifact leaves the discard set before its delete is
        // attempted, so a failed delete is reported once, not retried.
        staged.remote = None;
        self.staging.delete(&export_path).await?;

        staged.local = None;
        tokio::fs::remove_file(&export_path).await?;

        Ok(transcript)
    }

    /// Best-effort removal of whatever the failed run staged.
    async fn discard(&self, staged: StagedArtifacts) {
        if let Some(path) = &staged.remote
            && let Err(e) = self.staging.delete(path).await
        {
            eprintln!("gscribe: failed to discard staged blob: {}", e);
        }
        if let Some(path) = &staged.local
            && let Err(e) = tokio::fs::remove_file(path).await
        {
            eprintln!("gscribe: failed to remove {}: {}", path.display(), e);
        }
    }

    /// The transcript of the last successful run, if any.
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Persist the retained transcript as UTF-8 text.
    pub async fn export(&self, destination: &Path) -> Result<()> {
        let transcript = self.transcript.as_deref().ok_or_else(|| {
            GscribeError::Other("no transcript to export; run the pipeline first".to_string())
        })?;
        tokio::fs::write(destination, transcript).await?;
        if !self.options.quiet {
            eprintln!("File {} created.", destination.display());
        }
        Ok(())
    }
}
