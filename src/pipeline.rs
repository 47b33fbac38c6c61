//! The analysis pipeline: URL to assembled summary
//!
//! One request runs as a sequential asynchronous pipeline; metadata fetch,
//! caption fetch, and the stored-image lookup are independent reads and run
//! concurrently. Caption and storage failures degrade the result; id
//! resolution and metadata failures are terminal.

use crate::assembler;
use crate::captions::CaptionSource;
use crate::error::{Result, SummarizerError};
use crate::metadata::MetadataSource;
use crate::segmenter::{CaptionSegmenter, SegmenterConfig, SegmenterOutput};
use crate::storage::ImageStore;
use crate::summary::SummaryData;
use crate::youtube;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Pipeline-level settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Preferred caption language (falls back to the source default)
    pub language: Option<String>,
}

/// Drives one video-analysis request end to end
pub struct SummaryPipeline {
    config: PipelineConfig,
    metadata: Arc<dyn MetadataSource>,
    captions: Arc<dyn CaptionSource>,
    store: Arc<dyn ImageStore>,
    segmenter: CaptionSegmenter,
}

impl SummaryPipeline {
    pub fn new(
        config: PipelineConfig,
        segmenter_config: SegmenterConfig,
        metadata: Arc<dyn MetadataSource>,
        captions: Arc<dyn CaptionSource>,
        store: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            config,
            metadata,
            captions,
            store,
            segmenter: CaptionSegmenter::new(segmenter_config),
        }
    }

    /// Build the default HTTP-backed stack from configuration
    pub fn from_config(config: &crate::config::Config) -> Self {
        let captions: Arc<dyn CaptionSource> = match &config.captions.endpoint {
            Some(endpoint) => Arc::new(crate::captions::TimedTextClient::with_base_url(
                endpoint,
                config.captions.request_timeout_seconds,
                config.captions.api_key.clone(),
            )),
            None => Arc::new(crate::captions::TimedTextClient::new(
                config.captions.request_timeout_seconds,
                config.captions.api_key.clone(),
            )),
        };

        let metadata: Arc<dyn MetadataSource> = match &config.metadata.endpoint {
            Some(endpoint) => Arc::new(crate::metadata::YouTubeMetadataClient::with_base_url(
                endpoint,
                config.metadata.request_timeout_seconds,
            )),
            None => Arc::new(crate::metadata::YouTubeMetadataClient::new(
                config.metadata.request_timeout_seconds,
            )),
        };

        let store: Arc<dyn ImageStore> =
            Arc::new(crate::storage::BucketImageStore::new(config.storage.clone()));

        Self::new(
            config.pipeline.clone(),
            config.segmenter.clone(),
            metadata,
            captions,
            store,
        )
    }

    /// Run a request to a terminal `SummaryData`: fatal errors land in
    /// `error`, everything else produces a structurally valid summary.
    pub async fn run(&self, url: &str) -> SummaryData {
        match self.generate(url).await {
            Ok(data) => data,
            Err(e) => {
                error!("Analysis failed for {}: {}", url, e);
                SummaryData::loading().fail(e.to_string())
            }
        }
    }

    async fn generate(&self, url: &str) -> Result<SummaryData> {
        let video_id = youtube::resolve_video_id(url)
            .ok_or_else(|| SummarizerError::InvalidUrl(url.to_string()))?;
        info!("Analyzing video {}", video_id);

        let language = self.config.language.as_deref();

        // Independent reads run concurrently
        let (details, cues, extra_refs) = tokio::join!(
            self.metadata.fetch(&video_id),
            self.captions.fetch(&video_id, language),
            self.store.list_references(&video_id),
        );

        let details = details?;

        // Caption failure is recovered with a degraded summary
        let segmented = match cues {
            Ok(cues) => match self.segmenter.segment(&cues, language) {
                Ok(segmented) => segmented,
                Err(e) => {
                    warn!("Segmentation failed for {}, degrading: {}", video_id, e);
                    SegmenterOutput::default()
                }
            },
            Err(e) => {
                warn!("Caption fetch failed for {}, degrading: {}", video_id, e);
                SegmenterOutput::default()
            }
        };

        let content = assembler::assemble(&details, &segmented, &extra_refs);
        debug!(
            "Assembled summary for {}: {} timestamps, {} code blocks, {} links",
            video_id,
            content.timestamps.len(),
            content.code.len(),
            content.links.len()
        );

        Ok(SummaryData::loading()
            .with_details(details)
            .complete(content))
    }

    /// Upload a local image and attach its token to a video's references.
    /// Returns the token, or `None` when the store rejected the write.
    pub async fn attach_image(&self, video_id: &str, path: &std::path::Path) -> Option<String> {
        let token = match self.store.upload(path).await {
            Ok(token) => token,
            Err(e) => {
                warn!("Image upload failed: {}", e);
                return None;
            }
        };

        if self.store.store_reference(video_id, &token).await {
            Some(token)
        } else {
            None
        }
    }
}

/// Shared view-model over in-flight and settled analysis requests.
///
/// Requests carry a monotonic id; a superseded request's result is discarded
/// instead of overwriting the state of a newer one.
pub struct AnalysisSession {
    pipeline: Arc<SummaryPipeline>,
    state: Arc<RwLock<SummaryData>>,
    latest_request: Arc<AtomicU64>,
}

impl AnalysisSession {
    pub fn new(pipeline: Arc<SummaryPipeline>) -> Self {
        Self {
            pipeline,
            state: Arc::new(RwLock::new(SummaryData::loading())),
            latest_request: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Analyze a URL, superseding any in-flight request
    pub async fn analyze(&self, url: &str) -> SummaryData {
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.write().await = SummaryData::loading();

        let result = self.pipeline.run(url).await;

        if self.latest_request.load(Ordering::SeqCst) != request_id {
            debug!("Discarding stale result for request {}", request_id);
            return result;
        }

        *self.state.write().await = result.clone();
        result
    }

    /// Current view-model snapshot
    pub async fn current(&self) -> SummaryData {
        self.state.read().await.clone()
    }

    /// Append an uploaded image to the settled summary, post-hoc
    pub async fn attach_image(&self, path: &std::path::Path) -> Option<String> {
        let video_id = {
            let state = self.state.read().await;
            state.video_details.as_ref().map(|d| d.video_id.clone())?
        };

        let token = self.pipeline.attach_image(&video_id, path).await?;

        let mut state = self.state.write().await;
        if let Some(summary) = state.summary.as_mut() {
            summary.image_references.push(token.clone());
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::Cue;
    use crate::storage::MemoryImageStore;
    use crate::summary::VideoDetails;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StubMetadata {
        delay_ms: u64,
    }

    #[async_trait]
    impl MetadataSource for StubMetadata {
        async fn fetch(&self, video_id: &str) -> Result<VideoDetails> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            Ok(VideoDetails {
                video_id: video_id.to_string(),
                title: format!("Video {}", video_id),
                description: String::new(),
                thumbnail: "thumb.jpg".to_string(),
                channel: "RustCasts".to_string(),
                duration_seconds: 60.0,
                captions_available: true,
                language: None,
            })
        }
    }

    struct StubCaptions {
        cues: Vec<Cue>,
        fail: bool,
    }

    #[async_trait]
    impl CaptionSource for StubCaptions {
        async fn fetch(&self, _video_id: &str, _language: Option<&str>) -> Result<Vec<Cue>> {
            if self.fail {
                Err(SummarizerError::CaptionProcessing("boom".to_string()))
            } else {
                Ok(self.cues.clone())
            }
        }
    }

    fn pipeline(metadata_delay_ms: u64, captions_fail: bool) -> Arc<SummaryPipeline> {
        Arc::new(SummaryPipeline::new(
            PipelineConfig::default(),
            SegmenterConfig::default(),
            Arc::new(StubMetadata {
                delay_ms: metadata_delay_ms,
            }),
            Arc::new(StubCaptions {
                cues: vec![
                    Cue::new(0, "Remember that iterators are lazy in Rust."),
                    Cue::new(5000, "let total: u32 = items.iter().sum();"),
                ],
                fail: captions_fail,
            }),
            Arc::new(MemoryImageStore::new()),
        ))
    }

    #[tokio::test]
    async fn test_invalid_url_is_terminal_error() {
        let data = pipeline(0, false).run("not a video").await;
        assert!(data.is_terminal());
        assert!(data.summary.is_none());
        assert!(data.error.as_deref().unwrap().contains("not a video"));
    }

    #[tokio::test]
    async fn test_successful_run() {
        let data = pipeline(0, false).run("https://youtu.be/dQw4w9WgXcQ").await;
        assert!(data.is_terminal());
        assert!(data.error.is_none());

        let summary = data.summary.unwrap();
        assert!(!summary.text.is_empty());
        assert_eq!(summary.code.len(), 1);
        assert_eq!(
            data.video_details.unwrap().video_id,
            "dQw4w9WgXcQ".to_string()
        );
    }

    #[tokio::test]
    async fn test_caption_failure_degrades_gracefully() {
        let data = pipeline(0, true).run("https://youtu.be/dQw4w9WgXcQ").await;
        assert!(data.is_terminal());
        assert!(data.error.is_none());

        let summary = data.summary.unwrap();
        assert!(summary.code.is_empty());
        assert!(summary.timestamps.is_empty());
        assert!(!summary.text.is_empty());
    }

    #[tokio::test]
    async fn test_stale_request_is_discarded() {
        let slow = pipeline(50, false);
        let session = AnalysisSession::new(slow);

        let (first, second) = tokio::join!(
            session.analyze("https://youtu.be/aaaaaaaaaaa"),
            async {
                // Issue the superseding request after the first is in flight
                tokio::time::sleep(Duration::from_millis(10)).await;
                session.analyze("https://youtu.be/bbbbbbbbbbb").await
            }
        );

        assert_eq!(
            first.video_details.as_ref().unwrap().video_id,
            "aaaaaaaaaaa"
        );
        let current = session.current().await;
        assert_eq!(current, second);
        assert_eq!(
            current.video_details.unwrap().video_id,
            "bbbbbbbbbbb".to_string()
        );
    }
}
