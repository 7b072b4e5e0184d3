//! Error types for gscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GscribeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Media probe errors
    #[error("Failed to inspect {path}: {message}")]
    Inspection { path: String, message: String },

    // Transcode errors
    #[error("Transcoding failed: {message}")]
    Transcode { message: String },

    // Authentication errors
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // Object storage errors
    #[error("Bucket provisioning failed: {message}")]
    StorageProvision { message: String },

    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Upload failed: {message}")]
    StorageUpload { message: String },

    #[error("Remote delete failed: {message}")]
    StorageDelete { message: String },

    // Recognition job errors
    #[error("Recognition job failed: {message}")]
    RecognitionJob { message: String },

    #[error("Recognition job did not resolve within {}", humantime::format_duration(*.limit))]
    Timeout { limit: std::time::Duration },

    #[error("Run cancelled")]
    Cancelled,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, GscribeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[test]
    fn test_config_file_not_found_display() {
        let error = GscribeError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_inspection_display() {
        let error = GscribeError::Inspection {
            path: "/data/sample.m4a".to_string(),
            message: "missing sample_rate".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to inspect /data/sample.m4a: missing sample_rate"
        );
    }

    #[test]
    fn test_transcode_display() {
        let error = GscribeError::Transcode {
            message: "ffmpeg exited with status 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transcoding failed: ffmpeg exited with status 1"
        );
    }

    #[test]
    fn test_not_found_display() {
        let error = GscribeError::NotFound {
            path: "/tmp/missing.flac".to_string(),
        };
        assert_eq!(error.to_string(), "File not found: /tmp/missing.flac");
    }

    #[test]
    fn test_storage_provision_display() {
        let error = GscribeError::StorageProvision {
            message: "permission denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Bucket provisioning failed: permission denied"
        );
    }

    #[test]
    fn test_recognition_job_display() {
        let error = GscribeError::RecognitionJob {
            message: "audio too long".to_string(),
        };
        assert_eq!(error.to_string(), "Recognition job failed: audio too long");
    }

    #[test]
    fn test_timeout_display() {
        let error = GscribeError::Timeout {
            limit: Duration::from_secs(90),
        };
        assert_eq!(
            error.to_string(),
            "Recognition job did not resolve within 1m 30s"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: GscribeError = io_error.into();
        assert!(matches!(error, GscribeError::Io(_)));
        assert_eq!(error.to_string(), "I/O error: access denied");
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(GscribeError::Cancelled.to_string(), "Run cancelled");
    }
}
