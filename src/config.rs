use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::defaults;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub gcp: GcpConfig,
    pub recognition: RecognitionSettings,
    pub pipeline: PipelineSettings,
}

/// Google Cloud account configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GcpConfig {
    /// Project id owning the staging bucket and recognition quota
    pub project: Option<String>,
    /// Path to the service-account credential JSON file
    pub credentials: Option<PathBuf>,
    /// Suffix appended to the project id to form the bucket name
    pub bucket_suffix: String,
}

/// Recognition request configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionSettings {
    pub language: String,
    pub min_speakers: u32,
    pub max_speakers: u32,
    pub punctuation: bool,
    pub enhanced_model: bool,
}

/// Pipeline behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Seconds between progress polls of the recognition operation
    pub poll_interval_secs: u64,
    /// Seconds after which a still-running job is abandoned
    pub job_timeout_secs: u64,
    /// Directory transcripts are exported into
    pub output_dir: PathBuf,
    /// Reject inputs that are not mono before transcoding
    pub require_mono: bool,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            project: None,
            credentials: None,
            bucket_suffix: defaults::BUCKET_SUFFIX.to_string(),
        }
    }
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            language: defaults::LANGUAGE_CODE.to_string(),
            min_speakers: defaults::MIN_SPEAKER_COUNT,
            max_speakers: defaults::MAX_SPEAKER_COUNT,
            punctuation: true,
            enhanced_model: true,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
            job_timeout_secs: defaults::JOB_TIMEOUT_SECS,
            output_dir: PathBuf::from(defaults::OUTPUT_DIR),
            require_mono: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - GSCRIBE_PROJECT → gcp.project
    /// - GSCRIBE_CREDENTIALS → gcp.credentials
    /// - GSCRIBE_BUCKET_SUFFIX → gcp.bucket_suffix
    /// - GSCRIBE_LANGUAGE → recognition.language
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(project) = std::env::var("GSCRIBE_PROJECT")
            && !project.is_empty()
        {
            self.gcp.project = Some(project);
        }

        if let Ok(credentials) = std::env::var("GSCRIBE_CREDENTIALS")
            && !credentials.is_empty()
        {
            self.gcp.credentials = Some(PathBuf::from(credentials));
        }

        if let Ok(suffix) = std::env::var("GSCRIBE_BUCKET_SUFFIX")
            && !suffix.is_empty()
        {
            self.gcp.bucket_suffix = suffix;
        }

        if let Ok(language) = std::env::var("GSCRIBE_LANGUAGE")
            && !language.is_empty()
        {
            self.recognition.language = language;
        }

        self
    }

    /// Staging bucket name derived from the project id.
    ///
    /// Returns `{project}-{suffix}`, or an error if no project is configured.
    pub fn bucket_name(&self) -> crate::error::Result<String> {
        let project =
            self.gcp
                .project
                .as_deref()
                .ok_or_else(|| crate::error::GscribeError::ConfigInvalidValue {
                    key: "gcp.project".to_string(),
                    message: "no project id configured (flag, config file, or GSCRIBE_PROJECT)"
                        .to_string(),
                })?;
        Ok(format!("{}-{}", project, self.gcp.bucket_suffix))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/gscribe/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("gscribe")
            .join("config.toml")
    }
}
