//! Core data model for structured video summaries

use serde::{Deserialize, Serialize};

/// Video metadata produced by the metadata collaborator.
///
/// Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoDetails {
    /// The 11-character video id the details were fetched for
    pub video_id: String,

    /// Video title
    pub title: String,

    /// Video description (empty when the source omits it)
    pub description: String,

    /// Thumbnail URL
    pub thumbnail: String,

    /// Channel name
    pub channel: String,

    /// Duration in seconds
    pub duration_seconds: f64,

    /// Whether a caption track is known to exist
    pub captions_available: bool,

    /// Caption language hint, when known
    pub language: Option<String>,
}

/// Classification of a timestamped content item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Code,
    KeyPoint,
}

/// A typed, timestamped piece of transcript content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeStampedContent {
    /// Offset from the start of the video, in milliseconds
    pub timestamp_ms: u64,

    /// Content text
    pub text: String,

    /// Content classification
    pub kind: ContentKind,

    /// Language guess for code items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TimeStampedContent {
    pub fn new(timestamp_ms: u64, text: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            timestamp_ms,
            text: text.into(),
            kind,
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// The assembled summary document consumed by renderers and the PDF exporter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SummaryContent {
    /// Prose summary text, never empty after assembly
    pub text: String,

    /// Code snippets with markdown fencing stripped
    pub code: Vec<String>,

    /// Related links, duplicates allowed, order preserved
    pub links: Vec<String>,

    /// Image reference tokens: URLs, video ids, or bucket/path tokens
    pub image_references: Vec<String>,

    /// All timestamped items, sorted ascending by timestamp
    pub timestamps: Vec<TimeStampedContent>,

    /// The subset of `timestamps` classified as key points
    pub key_points: Vec<TimeStampedContent>,

    /// Raw transcript summary, when segmentation produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_summary: Option<String>,
}

/// View-model aggregate for a single analysis request.
///
/// `is_loading` is true only while no terminal success or error has been
/// recorded; `error` and `summary` are mutually exclusive at terminal state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryData {
    pub video_details: Option<VideoDetails>,
    pub summary: Option<SummaryContent>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl SummaryData {
    /// Fresh request, nothing resolved yet
    pub fn loading() -> Self {
        Self {
            video_details: None,
            summary: None,
            is_loading: true,
            error: None,
        }
    }

    /// Record the metadata arrival; the request stays in-flight
    pub fn with_details(mut self, details: VideoDetails) -> Self {
        self.video_details = Some(details);
        self
    }

    /// Terminal success
    pub fn complete(mut self, summary: SummaryContent) -> Self {
        self.summary = Some(summary);
        self.error = None;
        self.is_loading = false;
        self
    }

    /// Terminal failure
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self.summary = None;
        self.is_loading = false;
        self
    }

    /// Whether the request reached a terminal state
    pub fn is_terminal(&self) -> bool {
        !self.is_loading
    }
}

impl Default for SummaryData {
    fn default() -> Self {
        Self::loading()
    }
}
