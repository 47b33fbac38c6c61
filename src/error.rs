//! Error types for the summarizer pipeline

/// Result type for summarizer operations
pub type Result<T> = std::result::Result<T, SummarizerError>;

/// Error types for summarizer operations
#[derive(thiserror::Error, Debug)]
pub enum SummarizerError {
    /// No video id could be extracted from the input. Fatal to the request.
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    /// Metadata source unavailable or returned malformed data. Fatal to the request.
    #[error("Metadata fetch failed for video {video_id}: {reason}")]
    MetadataFetch { video_id: String, reason: String },

    /// Caption fetch or segmentation failed. Recovered by the pipeline
    /// (degraded summary), never fatal.
    #[error("Caption processing failed: {0}")]
    CaptionProcessing(String),

    /// Storage read/write failure. Recovered locally (empty list / false).
    #[error("Image reference error: {0}")]
    ImageReference(String),

    /// PDF rendering failed. Fatal to the export action only.
    #[error("PDF generation failed: {0}")]
    PdfGeneration(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SummarizerError {
    /// Whether the pipeline recovers from this error with a degraded result
    /// instead of surfacing it to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SummarizerError::CaptionProcessing(_) | SummarizerError::ImageReference(_)
        )
    }
}
