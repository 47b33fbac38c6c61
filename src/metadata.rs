//! Video metadata fetching
//!
//! The oEmbed endpoint supplies title, channel, and thumbnail; the watch
//! page is scraped for description, duration, and a caption-track hint.
//! oEmbed failure is fatal to the request; watch-page enrichment degrades
//! gracefully.

use crate::error::{Result, SummarizerError};
use crate::summary::VideoDetails;
use crate::youtube;
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of video metadata for a video id
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata; failure surfaces as `MetadataFetch` and is fatal to
    /// the whole request.
    async fn fetch(&self, video_id: &str) -> Result<VideoDetails>;
}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: String,
    author_name: String,
    thumbnail_url: String,
}

/// Metadata client backed by the oEmbed endpoint plus watch-page scraping
pub struct YouTubeMetadataClient {
    client: reqwest::Client,
    base_url: String,
}

impl YouTubeMetadataClient {
    pub fn new(timeout_seconds: u64) -> Self {
        Self::with_base_url("https://www.youtube.com", timeout_seconds)
    }

    /// Client against a custom endpoint (used by tests and proxies)
    pub fn with_base_url(base_url: &str, timeout_seconds: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("Mozilla/5.0 (compatible; yt-summarizer/0.1)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_oembed(&self, video_id: &str) -> Result<OembedResponse> {
        let url = format!(
            "{}/oembed?url={}&format=json",
            self.base_url,
            urlencoding::encode(&youtube::watch_url(video_id)),
        );
        debug!("Fetching oEmbed metadata from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            SummarizerError::MetadataFetch {
                video_id: video_id.to_string(),
                reason: e.to_string(),
            }
        })?;

        if !response.status().is_success() {
            return Err(SummarizerError::MetadataFetch {
                video_id: video_id.to_string(),
                reason: format!("oEmbed endpoint returned {}", response.status()),
            });
        }

        response
            .json::<OembedResponse>()
            .await
            .map_err(|e| SummarizerError::MetadataFetch {
                video_id: video_id.to_string(),
                reason: format!("malformed oEmbed payload: {}", e),
            })
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let url = format!("{}/watch?v={}", self.base_url, urlencoding::encode(video_id));
        let response = self.client.get(&url).send().await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetadataSource for YouTubeMetadataClient {
    async fn fetch(&self, video_id: &str) -> Result<VideoDetails> {
        let oembed = self.fetch_oembed(video_id).await?;

        let mut details = VideoDetails {
            video_id: video_id.to_string(),
            title: oembed.title,
            description: String::new(),
            thumbnail: oembed.thumbnail_url,
            channel: oembed.author_name,
            duration_seconds: 0.0,
            captions_available: false,
            language: None,
        };

        // Enrichment only; a scrape failure does not fail the request
        match self.fetch_watch_page(video_id).await {
            Ok(html) => {
                let page = WatchPage::parse(&html);
                details.description = page.description;
                details.duration_seconds = page.duration_seconds;
                details.captions_available = page.captions_available;
            }
            Err(e) => {
                warn!("Watch page scrape failed for {}: {}", video_id, e);
            }
        }

        Ok(details)
    }
}

/// Fields scraped out of a watch page document
#[derive(Debug, Default, PartialEq)]
struct WatchPage {
    description: String,
    duration_seconds: f64,
    captions_available: bool,
}

impl WatchPage {
    fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);

        let description = select_meta_content(&document, "meta[name=\"description\"]")
            .unwrap_or_default();

        let duration_seconds = select_meta_content(&document, "meta[itemprop=\"duration\"]")
            .and_then(|content| parse_iso8601_duration(&content))
            .unwrap_or(0.0);

        let captions_available = html.contains("\"captionTracks\"");

        Self {
            description,
            duration_seconds,
            captions_available,
        }
    }
}

fn select_meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.to_string())
}

/// Parse an ISO 8601 duration of the `PT#H#M#S` form into seconds
fn parse_iso8601_duration(value: &str) -> Option<f64> {
    let rest = value.strip_prefix("PT")?;

    let mut seconds = 0.0;
    let mut number = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let parsed: f64 = number.parse().ok()?;
        number.clear();
        match c {
            'H' => seconds += parsed * 3600.0,
            'M' => seconds += parsed * 60.0,
            'S' => seconds += parsed,
            _ => return None,
        }
    }

    if number.is_empty() {
        Some(seconds)
    } else {
        None
    }
}
