//! End-to-end pipeline tests over mocked collaborators.
//!
//! Every external system (ffprobe, ffmpeg, Cloud Storage, Speech-to-Text) is
//! replaced by its mock; the pipeline logic under test is real.

use gscribe::config::RecognitionSettings;
use gscribe::gcp::speech::{JobClient, MockRecognitionApi, RecognitionApi};
use gscribe::gcp::storage::{MockStagingStore, StagingStore};
use gscribe::media::probe::{MediaInspector, MockInspector};
use gscribe::media::transcode::{MediaTranscoder, MockTranscoder};
use gscribe::pipeline::{Pipeline, PipelineOptions};
use gscribe::{GscribeError, TranscriptSegment};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Fixture {
    dir: TempDir,
    source: PathBuf,
    store: Arc<MockStagingStore>,
    api: Arc<MockRecognitionApi>,
}

impl Fixture {
    fn new(store: MockStagingStore, api: MockRecognitionApi) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("sample.m4a");
        std::fs::write(&source, b"m4a bytes").unwrap();
        Self {
            dir,
            source,
            store: Arc::new(store),
            api: Arc::new(api),
        }
    }

    fn canonical_path(&self) -> PathBuf {
        self.dir.path().join("sample.flac")
    }

    async fn pipeline(&self) -> Pipeline {
        self.pipeline_with(
            Arc::new(MockInspector::new()),
            Arc::new(MockTranscoder::new()),
            PipelineOptions {
                quiet: true,
                ..Default::default()
            },
        )
        .await
    }

    async fn pipeline_with(
        &self,
        inspector: Arc<dyn MediaInspector>,
        transcoder: Arc<dyn MediaTranscoder>,
        options: PipelineOptions,
    ) -> Pipeline {
        let jobs = JobClient::new(Arc::clone(&self.api) as Arc<dyn RecognitionApi>)
            .with_poll_interval(Duration::from_millis(1))
            .with_timeout(Duration::from_millis(250))
            .with_quiet(true);

        Pipeline::connect(
            inspector,
            transcoder,
            Arc::clone(&self.store) as Arc<dyn StagingStore>,
            jobs,
            RecognitionSettings::default(),
            options,
        )
        .await
        .unwrap()
    }
}

#[tokio::test]
async fn full_run_exports_joined_transcript_and_unstages_everything() {
    let fixture = Fixture::new(
        MockStagingStore::new(),
        MockRecognitionApi::new()
            .then_running(40)
            .then_succeeded(&["Hello", "world"]),
    );

    let mut pipeline = fixture.pipeline().await;
    pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap();

    // The canonical rendition went up under its basename, then came back down.
    assert_eq!(fixture.store.uploads(), vec!["sample.flac".to_string()]);
    assert!(fixture.store.remaining_blobs().is_empty());
    assert!(!fixture.canonical_path().exists());
    // The original input is untouched.
    assert!(fixture.source.exists());

    assert_eq!(pipeline.transcript(), Some("Hello\n\nworld"));

    let out_dir = fixture.dir.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let destination = out_dir.join("sample.txt");
    pipeline.export(&destination).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&destination).unwrap(),
        "Hello\n\nworld"
    );
}

#[tokio::test]
async fn recognition_uses_the_staged_blob_uri() {
    let fixture = Fixture::new(
        MockStagingStore::new(),
        MockRecognitionApi::new().then_succeeded(&["Hello"]),
    );

    let mut pipeline = fixture.pipeline().await;
    pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        fixture.api.submissions(),
        vec!["gs://mock-bucket/sample.flac".to_string()]
    );
}

#[tokio::test]
async fn bucket_is_provisioned_once_at_construction() {
    let fixture = Fixture::new(
        MockStagingStore::new(),
        MockRecognitionApi::new()
            .then_succeeded(&["a"])
            .then_succeeded(&["b"]),
    );

    let mut pipeline = fixture.pipeline().await;
    assert_eq!(fixture.store.ensure_calls(), 1);

    pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap();
    // Re-create the source for a second run; runs never touch the bucket setup.
    std::fs::write(&fixture.source, b"m4a bytes").unwrap();
    pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(fixture.store.ensure_calls(), 1);
    assert!(fixture.store.create_calls() <= 1);
}

#[tokio::test]
async fn transcode_failure_aborts_before_any_upload() {
    let fixture = Fixture::new(MockStagingStore::new(), MockRecognitionApi::new());

    let mut pipeline = fixture
        .pipeline_with(
            Arc::new(MockInspector::new()),
            Arc::new(MockTranscoder::new().with_failure()),
            PipelineOptions {
                quiet: true,
                ..Default::default()
            },
        )
        .await;

    let err = pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GscribeError::Transcode { .. }));
    assert!(fixture.store.uploads().is_empty());
    assert!(!fixture.canonical_path().exists());
}

#[tokio::test]
async fn upload_failure_discards_the_local_canonical_file() {
    let fixture = Fixture::new(
        MockStagingStore::new().with_upload_failure(),
        MockRecognitionApi::new(),
    );

    let mut pipeline = fixture.pipeline().await;
    let err = pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GscribeError::StorageUpload { .. }));
    assert!(!fixture.canonical_path().exists());
    assert!(fixture.store.remaining_blobs().is_empty());
}

#[tokio::test]
async fn recognition_failure_discards_blob_and_local_file() {
    let fixture = Fixture::new(
        MockStagingStore::new(),
        MockRecognitionApi::new()
            .then_running(10)
            .then_failed("audio too long"),
    );

    let mut pipeline = fixture.pipeline().await;
    let err = pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GscribeError::RecognitionJob { .. }));
    // The blob was uploaded, then discarded on the failure path.
    assert_eq!(fixture.store.uploads(), vec!["sample.flac".to_string()]);
    assert!(fixture.store.remaining_blobs().is_empty());
    assert!(!fixture.canonical_path().exists());
    // No partial transcript survives a failed run.
    assert_eq!(pipeline.transcript(), None);
}

#[tokio::test]
async fn job_timeout_discards_blob_and_local_file() {
    // An empty poll script keeps the job Running until the deadline.
    let fixture = Fixture::new(MockStagingStore::new(), MockRecognitionApi::new());

    let mut pipeline = fixture.pipeline().await;
    let err = pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GscribeError::Timeout { .. }));
    assert!(fixture.store.remaining_blobs().is_empty());
    assert!(!fixture.canonical_path().exists());
}

#[tokio::test]
async fn cancellation_discards_blob_and_local_file() {
    let fixture = Fixture::new(MockStagingStore::new(), MockRecognitionApi::new());

    let mut pipeline = fixture.pipeline().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline.run(&fixture.source, &cancel).await.unwrap_err();

    assert!(matches!(err, GscribeError::Cancelled));
    assert!(fixture.store.remaining_blobs().is_empty());
    assert!(!fixture.canonical_path().exists());
}

#[tokio::test]
async fn mono_guard_rejects_stereo_input_before_transcoding() {
    let fixture = Fixture::new(MockStagingStore::new(), MockRecognitionApi::new());

    let mut pipeline = fixture
        .pipeline_with(
            Arc::new(MockInspector::new().with_channels(2)),
            Arc::new(MockTranscoder::new()),
            PipelineOptions {
                require_mono: true,
                quiet: true,
                ..Default::default()
            },
        )
        .await;

    let err = pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        GscribeError::Inspection { message, .. } => {
            assert!(message.contains("got 2 channels"));
        }
        other => panic!("Expected Inspection error, got {:?}", other),
    }
    assert!(!fixture.canonical_path().exists());
    assert!(fixture.store.uploads().is_empty());
}

#[tokio::test]
async fn mono_guard_is_off_by_default() {
    let fixture = Fixture::new(
        MockStagingStore::new(),
        MockRecognitionApi::new().then_succeeded(&["ok"]),
    );

    let mut pipeline = fixture
        .pipeline_with(
            Arc::new(MockInspector::new().with_channels(2)),
            Arc::new(MockTranscoder::new()),
            PipelineOptions {
                quiet: true,
                ..Default::default()
            },
        )
        .await;

    pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(pipeline.transcript(), Some("ok"));
}

#[tokio::test]
async fn source_already_canonical_is_rejected() {
    let fixture = Fixture::new(MockStagingStore::new(), MockRecognitionApi::new());
    let flac_source = fixture.dir.path().join("already.flac");
    std::fs::write(&flac_source, b"fLaC").unwrap();

    let mut pipeline = fixture.pipeline().await;
    let err = pipeline
        .run(&flac_source, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, GscribeError::Transcode { .. }));
    // The input itself must never be treated as a staged artifact.
    assert!(flac_source.exists());
}

#[tokio::test]
async fn export_without_a_run_is_an_error() {
    let fixture = Fixture::new(MockStagingStore::new(), MockRecognitionApi::new());
    let pipeline = fixture.pipeline().await;

    let err = pipeline
        .export(&fixture.dir.path().join("out.txt"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no transcript"));
}

#[tokio::test]
async fn single_segment_transcript_has_no_separator() {
    let fixture = Fixture::new(
        MockStagingStore::new(),
        MockRecognitionApi::new().then_succeeded(&["こんにちは"]),
    );

    let mut pipeline = fixture.pipeline().await;
    pipeline
        .run(&fixture.source, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(pipeline.transcript(), Some("こんにちは"));
}

#[test]
fn segments_join_with_exactly_one_blank_line() {
    let segments = vec![
        TranscriptSegment::new("one"),
        TranscriptSegment::new("two"),
        TranscriptSegment::new("three"),
    ];
    assert_eq!(
        gscribe::pipeline::join_transcript(&segments),
        "one\n\ntwo\n\nthree"
    );
}
