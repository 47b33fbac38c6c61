//! Image storage collaborator
//!
//! Summaries carry opaque image reference tokens: raw URLs, YouTube video
//! ids/URLs (resolved to thumbnails), or `bucket/path` tokens resolved
//! against a storage bucket. Signed URLs are preferred, with a public-URL
//! fallback. Every read/write failure here recovers locally (empty list /
//! `false`) and never aborts summary generation.

use crate::error::{Result, SummarizerError};
use crate::youtube;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Storage backend and reference index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage API base URL; `None` leaves bucket tokens unresolved
    pub base_url: Option<String>,

    /// Bucket holding uploaded images
    pub bucket: String,

    /// API credential for signed-URL and upload requests
    pub api_key: Option<String>,

    /// Lifetime of requested signed URLs
    pub signed_url_ttl_seconds: u64,

    /// Directory for the per-video reference index files
    pub state_dir: PathBuf,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            bucket: "video-images".to_string(),
            api_key: None,
            signed_url_ttl_seconds: 3600,
            state_dir: PathBuf::from(".yt-summarizer/references"),
            request_timeout_seconds: 30,
        }
    }
}

/// Storage collaborator consulted by the pipeline for extra image references
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload a local file, returning its `bucket/path` token
    async fn upload(&self, path: &Path) -> Result<String>;

    /// Resolve a token to a display URL. Signed URLs are preferred for
    /// bucket tokens; failures fall back to the public URL form.
    async fn resolve(&self, token: &str) -> String;

    /// Tokens previously associated with a video; empty on any failure
    async fn list_references(&self, video_id: &str) -> Vec<String>;

    /// Associate a token with a video; `false` on any failure
    async fn store_reference(&self, video_id: &str, token: &str) -> bool;
}

/// Resolve the non-bucket token forms shared by every store implementation:
/// YouTube ids/URLs become thumbnail URLs, other URLs pass through.
fn resolve_plain_token(token: &str) -> Option<String> {
    if token.contains("youtube.com") || token.contains("youtu.be") || youtube::is_video_id(token) {
        if let Some(id) = youtube::resolve_video_id(token) {
            return Some(youtube::thumbnail_url(&id));
        }
    }
    if token.starts_with("http://") || token.starts_with("https://") {
        return Some(token.to_string());
    }
    None
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct VideoReferences {
    video_id: String,
    tokens: Vec<String>,
    updated_at: Option<DateTime<Utc>>,
}

/// Per-video reference index persisted as JSON files with an in-memory cache
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    state_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, VideoReferences>>>,
}

impl ReferenceIndex {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            state_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn index_path(&self, video_id: &str) -> PathBuf {
        self.state_dir.join(format!("{}.refs.json", video_id))
    }

    pub async fn list(&self, video_id: &str) -> Result<Vec<String>> {
        if let Some(refs) = self.cache.read().await.get(video_id) {
            return Ok(refs.tokens.clone());
        }

        let path = self.index_path(video_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let refs: VideoReferences = serde_json::from_str(&content)?;
        let tokens = refs.tokens.clone();
        self.cache
            .write()
            .await
            .insert(video_id.to_string(), refs);
        Ok(tokens)
    }

    pub async fn append(&self, video_id: &str, token: &str) -> Result<()> {
        let mut tokens = self.list(video_id).await?;
        tokens.push(token.to_string());

        let refs = VideoReferences {
            video_id: video_id.to_string(),
            tokens,
            updated_at: Some(Utc::now()),
        };

        fs::create_dir_all(&self.state_dir).await?;
        let path = self.index_path(video_id);
        fs::write(&path, serde_json::to_string_pretty(&refs)?).await?;
        debug!("Saved reference index: {}", path.display());

        self.cache
            .write()
            .await
            .insert(video_id.to_string(), refs);
        Ok(())
    }
}

/// HTTP bucket store with signed-URL resolution and a local reference index
pub struct BucketImageStore {
    config: StorageConfig,
    client: reqwest::Client,
    index: ReferenceIndex,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl BucketImageStore {
    pub fn new(config: StorageConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("yt-summarizer/0.1")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let index = ReferenceIndex::new(config.state_dir.clone());

        Self {
            config,
            client,
            index,
        }
    }

    fn public_url(&self, base_url: &str, object_path: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            base_url.trim_end_matches('/'),
            self.config.bucket,
            object_path
        )
    }

    async fn signed_url(&self, base_url: &str, object_path: &str) -> Result<String> {
        let url = format!(
            "{}/object/sign/{}/{}",
            base_url.trim_end_matches('/'),
            self.config.bucket,
            object_path
        );

        let mut request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "expiresIn": self.config.signed_url_ttl_seconds }));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SummarizerError::ImageReference(format!(
                "signed URL request returned {}",
                response.status()
            )));
        }

        let payload: SignedUrlResponse = response.json().await?;
        Ok(format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            payload.signed_url
        ))
    }

    /// Strip the leading bucket segment from a `bucket/path` token
    fn object_path<'a>(&self, token: &'a str) -> &'a str {
        token
            .strip_prefix(&format!("{}/", self.config.bucket))
            .unwrap_or(token)
    }
}

#[async_trait]
impl ImageStore for BucketImageStore {
    async fn upload(&self, path: &Path) -> Result<String> {
        let base_url = self.config.base_url.as_deref().ok_or_else(|| {
            SummarizerError::ImageReference("no storage base URL configured".to_string())
        })?;

        let bytes = fs::read(path).await?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_lowercase();
        // Content hash keeps generated object names unique
        let object_name = format!("{:x}.{}", md5::compute(&bytes), extension);

        let url = format!(
            "{}/object/{}/{}",
            base_url.trim_end_matches('/'),
            self.config.bucket,
            object_name
        );

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&object_name)
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SummarizerError::ImageReference(format!(
                "upload returned {}",
                response.status()
            )));
        }

        Ok(format!("{}/{}", self.config.bucket, object_name))
    }

    async fn resolve(&self, token: &str) -> String {
        if let Some(url) = resolve_plain_token(token) {
            return url;
        }

        let Some(base_url) = self.config.base_url.as_deref() else {
            return token.to_string();
        };

        let object_path = self.object_path(token);
        match self.signed_url(base_url, object_path).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Signed URL failed for {}, using public URL: {}", token, e);
                self.public_url(base_url, object_path)
            }
        }
    }

    async fn list_references(&self, video_id: &str) -> Vec<String> {
        match self.index.list(video_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Failed to list image references for {}: {}", video_id, e);
                Vec::new()
            }
        }
    }

    async fn store_reference(&self, video_id: &str, token: &str) -> bool {
        match self.index.append(video_id, token).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to store image reference for {}: {}", video_id, e);
                false
            }
        }
    }
}

/// In-memory store for demos and tests; resolves bucket tokens verbatim
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    references: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_lowercase();
        Ok(format!("memory/{:x}.{}", md5::compute(&bytes), extension))
    }

    async fn resolve(&self, token: &str) -> String {
        resolve_plain_token(token).unwrap_or_else(|| token.to_string())
    }

    async fn list_references(&self, video_id: &str) -> Vec<String> {
        self.references
            .read()
            .await
            .get(video_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn store_reference(&self, video_id: &str, token: &str) -> bool {
        self.references
            .write()
            .await
            .entry(video_id.to_string())
            .or_default()
            .push(token.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_plain_token_forms() {
        assert_eq!(
            resolve_plain_token("dQw4w9WgXcQ"),
            Some("https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string())
        );
        assert_eq!(
            resolve_plain_token("https://youtu.be/dQw4w9WgXcQ"),
            Some("https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string())
        );
        assert_eq!(
            resolve_plain_token("https://example.com/a.png"),
            Some("https://example.com/a.png".to_string())
        );
        assert_eq!(resolve_plain_token("video-images/a.png"), None);
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryImageStore::new();
        assert!(store.list_references("vid").await.is_empty());
        assert!(store.store_reference("vid", "video-images/a.png").await);
        assert!(store.store_reference("vid", "video-images/b.png").await);
        assert_eq!(
            store.list_references("vid").await,
            vec!["video-images/a.png", "video-images/b.png"]
        );
    }

    #[tokio::test]
    async fn test_bucket_store_recovers_on_index_failure() {
        // Point the index at a file path that cannot be a directory
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = StorageConfig {
            state_dir: file.path().to_path_buf(),
            ..Default::default()
        };
        let store = BucketImageStore::new(config);

        assert!(store.list_references("vid").await.is_empty());
        assert!(!store.store_reference("vid", "video-images/a.png").await);
    }

    #[tokio::test]
    async fn test_bucket_store_resolves_without_base_url() {
        let store = BucketImageStore::new(StorageConfig::default());
        assert_eq!(store.resolve("video-images/a.png").await, "video-images/a.png");
        assert_eq!(
            store.resolve("dQw4w9WgXcQ").await,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
    }

    #[tokio::test]
    async fn test_reference_index_persists() {
        let dir = tempfile::tempdir().unwrap();
        let index = ReferenceIndex::new(dir.path().to_path_buf());
        index.append("vid", "video-images/a.png").await.unwrap();

        // A fresh index instance reads back from disk
        let reread = ReferenceIndex::new(dir.path().to_path_buf());
        assert_eq!(reread.list("vid").await.unwrap(), vec!["video-images/a.png"]);
    }
}
