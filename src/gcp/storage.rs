//! Object-storage staging against the Cloud Storage JSON API.
//!
//! A run stages exactly one blob: the canonical FLAC rendition of the input.
//! Blob names are the local file's basename, so two runs over same-named files
//! must not share a bucket (use distinct bucket suffixes).

use crate::error::{GscribeError, Result};
use crate::gcp::auth::TokenProvider;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

const STORAGE_API: &str = "https://storage.googleapis.com/storage/v1";
const STORAGE_UPLOAD_API: &str = "https://storage.googleapis.com/upload/storage/v1";

/// Trait for remote blob staging.
///
/// This trait allows swapping implementations (real Cloud Storage vs mock).
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Check that the staging bucket exists, creating it if absent. Idempotent.
    async fn ensure_bucket(&self) -> Result<()>;

    /// Upload a local file under its basename. Returns the blob name.
    ///
    /// The local path must exist and be a regular file.
    async fn upload(&self, local_path: &Path) -> Result<String>;

    /// Delete the blob previously staged for a local file.
    ///
    /// The precondition mirrors `upload`: the *local* path must still exist,
    /// because the blob name is resolved from its basename.
    async fn delete(&self, local_path: &Path) -> Result<()>;

    /// Storage locator for a staged blob. Pure formatting, no I/O.
    fn uri(&self, blob_name: &str) -> String;
}

/// Resolve the blob name for a local path, enforcing the regular-file precondition.
fn blob_name_for(local_path: &Path) -> Result<String> {
    if !local_path.is_file() {
        return Err(GscribeError::NotFound {
            path: local_path.to_string_lossy().to_string(),
        });
    }
    local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| GscribeError::NotFound {
            path: local_path.to_string_lossy().to_string(),
        })
}

/// Cloud Storage staging client.
///
/// Read-only after construction; safe to reuse across sequential runs.
pub struct StagingClient {
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    project: String,
    bucket: String,
    quiet: bool,
}

impl StagingClient {
    pub fn new(tokens: Arc<dyn TokenProvider>, project: &str, bucket: &str, quiet: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            project: project.to_string(),
            bucket: bucket.to_string(),
            quiet,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object URL with the blob name percent-encoded as a path segment.
    fn object_url(&self, blob_name: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(STORAGE_API).map_err(|e| GscribeError::Other(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GscribeError::Other("storage endpoint is not a base URL".to_string()))?
            .extend(["b", &self.bucket, "o", blob_name]);
        Ok(url)
    }

    async fn create_bucket(&self, token: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/b", STORAGE_API))
            .query(&[("project", self.project.as_str())])
            .bearer_auth(token)
            .json(&serde_json::json!({ "name": self.bucket }))
            .send()
            .await
            .map_err(|e| GscribeError::StorageProvision {
                message: format!("bucket create request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GscribeError::StorageProvision {
                message: format!("bucket create returned {}: {}", status, body),
            });
        }

        if !self.quiet {
            eprintln!("Bucket {} created.", self.bucket);
        }
        Ok(())
    }
}

#[async_trait]
impl StagingStore for StagingClient {
    async fn ensure_bucket(&self) -> Result<()> {
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .get(format!("{}/b/{}", STORAGE_API, self.bucket))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| GscribeError::StorageProvision {
                message: format!("bucket lookup failed: {}", e),
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND => self.create_bucket(&token).await,
            status => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());
                Err(GscribeError::StorageProvision {
                    message: format!("bucket lookup returned {}: {}", status, body),
                })
            }
        }
    }

    async fn upload(&self, local_path: &Path) -> Result<String> {
        let blob_name = blob_name_for(local_path)?;
        let token = self.tokens.access_token().await?;

        let file = tokio::fs::File::open(local_path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .client
            .post(format!("{}/b/{}/o", STORAGE_UPLOAD_API, self.bucket))
            .query(&[("uploadType", "media"), ("name", blob_name.as_str())])
            .bearer_auth(&token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| GscribeError::StorageUpload {
                message: format!("upload request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GscribeError::StorageUpload {
                message: format!("upload returned {}: {}", status, body),
            });
        }

        if !self.quiet {
            eprintln!(
                "File {} uploaded to {}.",
                local_path.display(),
                self.uri(&blob_name)
            );
        }
        Ok(blob_name)
    }

    async fn delete(&self, local_path: &Path) -> Result<()> {
        let blob_name = blob_name_for(local_path)?;
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .delete(self.object_url(&blob_name)?)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| GscribeError::StorageDelete {
                message: format!("delete request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GscribeError::StorageDelete {
                message: format!("delete of {} returned {}: {}", blob_name, status, body),
            });
        }

        if !self.quiet {
            eprintln!("Blob {} deleted.", blob_name);
        }
        Ok(())
    }

    fn uri(&self, blob_name: &str) -> String {
        format!("gs://{}/{}", self.bucket, blob_name)
    }
}

/// Mock staging store for testing
#[derive(Debug, Default)]
pub struct MockStagingStore {
    state: std::sync::Mutex<MockState>,
    fail_upload: bool,
    fail_delete: bool,
    bucket_exists: bool,
}

#[derive(Debug, Default)]
struct MockState {
    bucket_created: bool,
    ensure_calls: usize,
    create_calls: usize,
    blobs: Vec<String>,
    uploads: Vec<String>,
}

impl MockStagingStore {
    /// Create a mock with no pre-existing bucket.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pretend the bucket already exists remotely.
    pub fn with_existing_bucket(mut self) -> Self {
        self.bucket_exists = true;
        self
    }

    /// Configure the mock to fail on upload.
    pub fn with_upload_failure(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    /// Configure the mock to fail on delete.
    pub fn with_delete_failure(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    /// Blob names currently held by the mock bucket.
    pub fn remaining_blobs(&self) -> Vec<String> {
        self.state().blobs.clone()
    }

    /// Every blob name ever uploaded, in order.
    pub fn uploads(&self) -> Vec<String> {
        self.state().uploads.clone()
    }

    pub fn ensure_calls(&self) -> usize {
        self.state().ensure_calls
    }

    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }
}

#[async_trait]
impl StagingStore for MockStagingStore {
    async fn ensure_bucket(&self) -> Result<()> {
        let mut state = self.state();
        state.ensure_calls += 1;
        if !self.bucket_exists && !state.bucket_created {
            state.bucket_created = true;
            state.create_calls += 1;
        }
        Ok(())
    }

    async fn upload(&self, local_path: &Path) -> Result<String> {
        let blob_name = blob_name_for(local_path)?;
        if self.fail_upload {
            return Err(GscribeError::StorageUpload {
                message: "mock upload failure".to_string(),
            });
        }
        let mut state = self.state();
        state.blobs.push(blob_name.clone());
        state.uploads.push(blob_name.clone());
        Ok(blob_name)
    }

    async fn delete(&self, local_path: &Path) -> Result<()> {
        let blob_name = blob_name_for(local_path)?;
        if self.fail_delete {
            return Err(GscribeError::StorageDelete {
                message: "mock delete failure".to_string(),
            });
        }
        let mut state = self.state();
        match state.blobs.iter().position(|b| *b == blob_name) {
            Some(idx) => {
                state.blobs.remove(idx);
                Ok(())
            }
            None => Err(GscribeError::StorageDelete {
                message: format!("blob {} already absent", blob_name),
            }),
        }
    }

    fn uri(&self, blob_name: &str) -> String {
        format!("gs://mock-bucket/{}", blob_name)
    }
}
