//! Transcription application entry point.
//!
//! Orchestrates the complete file-to-transcript flow:
//! probe → transcode → stage → recognize → export

use crate::config::Config;
use crate::error::{GscribeError, Result};
use crate::gcp::auth::{ServiceAccountKey, ServiceAccountTokenProvider, TokenProvider};
use crate::gcp::speech::{JobClient, SpeechClient};
use crate::gcp::storage::StagingClient;
use crate::media::probe::FfprobeInspector;
use crate::media::transcode::FfmpegTranscoder;
use crate::pipeline::{Pipeline, PipelineOptions};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// CLI overrides applied on top of the loaded configuration.
#[derive(Debug, Default)]
pub struct Overrides {
    pub project: Option<String>,
    pub credentials: Option<PathBuf>,
    pub bucket_suffix: Option<String>,
    pub language: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub require_mono: bool,
}

impl Overrides {
    fn apply(self, mut config: Config) -> Config {
        if let Some(p) = self.project {
            config.gcp.project = Some(p);
        }
        if let Some(c) = self.credentials {
            config.gcp.credentials = Some(c);
        }
        if let Some(s) = self.bucket_suffix {
            config.gcp.bucket_suffix = s;
        }
        if let Some(l) = self.language {
            config.recognition.language = l;
        }
        if let Some(o) = self.output_dir {
            config.pipeline.output_dir = o;
        }
        if let Some(t) = self.timeout_secs {
            config.pipeline.job_timeout_secs = t;
        }
        if let Some(i) = self.poll_interval_secs {
            config.pipeline.poll_interval_secs = i;
        }
        if self.require_mono {
            config.pipeline.require_mono = true;
        }
        config
    }
}

/// Transcript destination: `{output_dir}/{input basename}.txt`.
pub fn transcript_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "transcript".to_string());
    output_dir.join(format!("{}.txt", stem))
}

/// Run the transcribe command: stage the file, await recognition, export text.
pub async fn run_transcribe_command(
    config: Config,
    overrides: Overrides,
    input: &Path,
    quiet: bool,
    verbosity: u8,
) -> Result<()> {
    let config = overrides.apply(config);
    let bucket = config.bucket_name()?;

    let project = config
        .gcp
        .project
        .clone()
        .unwrap_or_default();
    let credentials_path =
        config
            .gcp
            .credentials
            .clone()
            .ok_or_else(|| GscribeError::ConfigInvalidValue {
                key: "gcp.credentials".to_string(),
                message:
                    "no credential file configured (flag, config file, or GSCRIBE_CREDENTIALS)"
                        .to_string(),
            })?;

    let key = ServiceAccountKey::load(&credentials_path)?;
    let tokens: Arc<dyn TokenProvider> = Arc::new(ServiceAccountTokenProvider::new(key));

    let staging = Arc::new(StagingClient::new(
        Arc::clone(&tokens),
        &project,
        &bucket,
        quiet,
    ));
    let speech = Arc::new(SpeechClient::new(Arc::clone(&tokens)));

    // Job progress shows as a bar unless quiet; the observer is dropped with
    // the pipeline, which finishes the bar first.
    let progress_bar = if quiet {
        None
    } else {
        let pb = ProgressBar::new(100);
        pb.set_style(
            // SAFETY: hardcoded template string — always valid
            #[allow(clippy::expect_used)]
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% recognized")
                .expect("hardcoded progress bar template")
                .progress_chars("#>-"),
        );
        Some(pb)
    };

    let mut jobs = JobClient::new(speech)
        .with_poll_interval(Duration::from_secs(config.pipeline.poll_interval_secs))
        .with_timeout(Duration::from_secs(config.pipeline.job_timeout_secs))
        .with_quiet(quiet);
    if let Some(pb) = progress_bar.clone() {
        jobs = jobs.with_progress(Box::new(move |percent| {
            pb.set_position(u64::from(percent));
        }));
    }

    // Ctrl-C stops polling; the pipeline still discards staged artifacts.
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_on_signal.cancel();
        }
    });

    if !quiet {
        eprintln!("Transcribing {} via bucket {}...", input.display(), bucket);
    }

    let mut pipeline = Pipeline::connect(
        Arc::new(FfprobeInspector::new()),
        Arc::new(FfmpegTranscoder::new()),
        staging,
        jobs,
        config.recognition.clone(),
        PipelineOptions {
            require_mono: config.pipeline.require_mono,
            quiet,
            verbose: verbosity >= 1,
        },
    )
    .await?;

    let run_result = pipeline.run(input, &cancel).await;
    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }
    run_result?;

    tokio::fs::create_dir_all(&config.pipeline.output_dir).await?;
    let destination = transcript_path(&config.pipeline.output_dir, input);
    pipeline.export(&destination).await?;

    if !quiet {
        eprintln!("Transcript written to {}.", destination.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_path_uses_input_stem() {
        assert_eq!(
            transcript_path(Path::new("out"), Path::new("/data/sample.m4a")),
            PathBuf::from("out/sample.txt")
        );
    }

    #[test]
    fn test_transcript_path_handles_extensionless_input() {
        assert_eq!(
            transcript_path(Path::new("out"), Path::new("/data/narration")),
            PathBuf::from("out/narration.txt")
        );
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let overrides = Overrides {
            project: Some("negishi".to_string()),
            language: Some("en-US".to_string()),
            timeout_secs: Some(600),
            require_mono: true,
            ..Default::default()
        };

        let config = overrides.apply(Config::default());
        assert_eq!(config.gcp.project.as_deref(), Some("negishi"));
        assert_eq!(config.recognition.language, "en-US");
        assert_eq!(config.pipeline.job_timeout_secs, 600);
        assert!(config.pipeline.require_mono);
        // Untouched fields keep their defaults.
        assert_eq!(config.pipeline.poll_interval_secs, 5);
    }

    #[test]
    fn test_overrides_default_is_identity() {
        let config = Overrides::default().apply(Config::default());
        assert_eq!(config, Config::default());
    }
}
