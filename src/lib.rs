/// YouTube video summarizer
///
/// Turns a video URL into a structured, exportable summary: prose text,
/// extracted code snippets, links, timestamped key points, and user-supplied
/// image references, with deterministic PDF export.

pub mod assembler;
pub mod captions;
pub mod config;
pub mod error;
pub mod metadata;
pub mod pdf;
pub mod pipeline;
pub mod segmenter;
pub mod storage;
pub mod summary;
pub mod youtube;

// Re-export main types for easy access
pub use crate::captions::{CaptionSource, Cue, TimedTextClient};
pub use crate::config::Config;
pub use crate::error::{Result, SummarizerError};
pub use crate::metadata::{MetadataSource, YouTubeMetadataClient};
pub use crate::pdf::{export_filename, PdfConfig, PdfRenderer};
pub use crate::pipeline::{AnalysisSession, PipelineConfig, SummaryPipeline};
pub use crate::segmenter::{CaptionSegmenter, SegmenterConfig, SegmenterOutput};
pub use crate::storage::{BucketImageStore, ImageStore, MemoryImageStore, StorageConfig};
pub use crate::summary::{
    ContentKind, SummaryContent, SummaryData, TimeStampedContent, VideoDetails,
};
