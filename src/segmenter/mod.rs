//! Transcript segmentation: typed, timestamped content out of raw cues
//!
//! The classifiers behind segmentation are capability traits so a
//! model-backed implementation can replace the rule-based defaults without
//! changing the assembler contract.

pub mod code;
pub mod salience;
pub mod summarize;

pub use code::HeuristicCodeDetector;
pub use salience::HeuristicSalienceScorer;
pub use summarize::FrequencySummarizer;

use crate::captions::Cue;
use crate::error::Result;
use crate::summary::{ContentKind, TimeStampedContent};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Scores a cue for code-likeness and guesses the language of code blocks
pub trait CodeDetector: Send + Sync {
    /// Score in `[0.0, 1.0]`; deterministic for a given input
    fn score(&self, text: &str) -> f32;

    /// Best-effort language guess for a detected code block
    fn guess_language(&self, text: &str) -> Option<String>;
}

/// Scores a cue for salience
pub trait SalienceScorer: Send + Sync {
    /// Score in `[0.0, 1.0]`; deterministic for a given input
    fn score(&self, text: &str) -> f32;
}

/// Condenses a cue sequence into a prose summary
pub trait Summarizer: Send + Sync {
    /// Must return a non-empty string for non-empty input and an empty
    /// string for empty input.
    fn summarize(&self, cues: &[Cue]) -> String;
}

/// Segmentation thresholds and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Minimum code score for a cue to join a code run
    pub code_threshold: f32,

    /// Minimum salience score for a key point
    pub salience_threshold: f32,

    /// Number of sentences to keep in the extractive summary
    pub summary_sentences: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            code_threshold: 0.5,
            salience_threshold: 0.5,
            summary_sentences: 3,
        }
    }
}

/// Segmentation result: classified content plus a prose condensation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmenterOutput {
    /// Cues flagged as especially salient, in source order
    pub key_points: Vec<TimeStampedContent>,

    /// Contiguous code runs merged into blocks, in source order
    pub code_blocks: Vec<TimeStampedContent>,

    /// Prose summary of the transcript
    pub summary: String,
}

/// Converts a normalized cue list into typed, timestamped content
pub struct CaptionSegmenter {
    config: SegmenterConfig,
    code_detector: Box<dyn CodeDetector>,
    salience_scorer: Box<dyn SalienceScorer>,
    summarizer: Box<dyn Summarizer>,
}

impl CaptionSegmenter {
    /// Segmenter with the deterministic rule-based classifiers
    pub fn new(config: SegmenterConfig) -> Self {
        let summary_sentences = config.summary_sentences;
        Self {
            config,
            code_detector: Box::new(HeuristicCodeDetector::new()),
            salience_scorer: Box::new(HeuristicSalienceScorer::new()),
            summarizer: Box::new(FrequencySummarizer::new(summary_sentences)),
        }
    }

    /// Segmenter with custom classifier implementations
    pub fn with_classifiers(
        config: SegmenterConfig,
        code_detector: Box<dyn CodeDetector>,
        salience_scorer: Box<dyn SalienceScorer>,
        summarizer: Box<dyn Summarizer>,
    ) -> Self {
        Self {
            config,
            code_detector,
            salience_scorer,
            summarizer,
        }
    }

    /// Segment a cue list into key points, code blocks, and a summary.
    ///
    /// Source timestamps pass through unchanged. Key points and code blocks
    /// come from disjoint classifier passes: a cue absorbed into a code run
    /// is not considered for salience.
    pub fn segment(&self, cues: &[Cue], language: Option<&str>) -> Result<SegmenterOutput> {
        if cues.is_empty() {
            return Ok(SegmenterOutput::default());
        }

        let mut key_points = Vec::new();
        let mut code_blocks = Vec::new();
        let mut prose_cues = Vec::new();

        let mut run: Vec<&Cue> = Vec::new();
        for cue in cues {
            if self.code_detector.score(&cue.text) >= self.config.code_threshold {
                run.push(cue);
                continue;
            }

            if !run.is_empty() {
                code_blocks.push(self.close_code_run(&run));
                run.clear();
            }

            if self.is_key_point(&cue.text) {
                key_points.push(TimeStampedContent::new(
                    cue.start_ms,
                    cue.text.clone(),
                    ContentKind::KeyPoint,
                ));
            }
            prose_cues.push(cue.clone());
        }
        if !run.is_empty() {
            code_blocks.push(self.close_code_run(&run));
        }

        let summary_input = if prose_cues.is_empty() {
            cues.to_vec()
        } else {
            prose_cues
        };
        let summary = self.summarizer.summarize(&summary_input);

        debug!(
            key_points = key_points.len(),
            code_blocks = code_blocks.len(),
            language = language.unwrap_or("unknown"),
            "Segmented {} cues",
            cues.len()
        );

        Ok(SegmenterOutput {
            key_points,
            code_blocks,
            summary,
        })
    }

    /// A key point is a sentence-boundary cue whose salience crosses the
    /// threshold.
    fn is_key_point(&self, text: &str) -> bool {
        ends_at_sentence_boundary(text)
            && self.salience_scorer.score(text) >= self.config.salience_threshold
    }

    /// Merge a contiguous code-like run into one block, keeping the first
    /// cue's timestamp.
    fn close_code_run(&self, run: &[&Cue]) -> TimeStampedContent {
        let text = run
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let language = self.code_detector.guess_language(&text);

        let mut block = TimeStampedContent::new(run[0].start_ms, text, ContentKind::Code);
        block.language = language;
        block
    }
}

pub(crate) fn ends_at_sentence_boundary(text: &str) -> bool {
    matches!(
        text.trim_end().chars().last(),
        Some('.') | Some('!') | Some('?')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start_ms: u64, text: &str) -> Cue {
        Cue::new(start_ms, text)
    }

    fn segmenter() -> CaptionSegmenter {
        CaptionSegmenter::new(SegmenterConfig::default())
    }

    #[test]
    fn test_empty_input_degrades_to_empty_output() {
        let out = segmenter().segment(&[], None).unwrap();
        assert!(out.key_points.is_empty());
        assert!(out.code_blocks.is_empty());
        assert!(out.summary.is_empty());
    }

    #[test]
    fn test_summary_non_empty_for_non_empty_input() {
        let cues = vec![cue(0, "A short remark about nothing in particular")];
        let out = segmenter().segment(&cues, None).unwrap();
        assert!(!out.summary.is_empty());
    }

    #[test]
    fn test_contiguous_code_run_merges_into_one_block() {
        let cues = vec![
            cue(1000, "Now let's write some code."),
            cue(2000, "fn main() {"),
            cue(3000, "    println!(\"hello\");"),
            cue(4000, "}"),
            cue(5000, "And that is the whole program."),
        ];
        let out = segmenter().segment(&cues, None).unwrap();
        assert_eq!(out.code_blocks.len(), 1);
        let block = &out.code_blocks[0];
        assert_eq!(block.timestamp_ms, 2000);
        assert!(block.text.contains("fn main()"));
        assert!(block.text.contains("println!"));
        assert_eq!(block.kind, ContentKind::Code);
    }

    #[test]
    fn test_key_point_requires_sentence_boundary() {
        let cues = vec![
            cue(1000, "The key takeaway here is to always handle errors."),
            cue(2000, "the key takeaway here is to always handle"),
        ];
        let out = segmenter().segment(&cues, None).unwrap();
        assert_eq!(out.key_points.len(), 1);
        assert_eq!(out.key_points[0].timestamp_ms, 1000);
        assert_eq!(out.key_points[0].kind, ContentKind::KeyPoint);
    }

    #[test]
    fn test_timestamps_pass_through_unchanged() {
        let cues = vec![
            cue(123_456, "Remember this one important thing about lifetimes."),
            cue(234_567, "let x: u32 = compute(y);"),
        ];
        let out = segmenter().segment(&cues, Some("en")).unwrap();
        assert!(out
            .key_points
            .iter()
            .all(|k| k.timestamp_ms == 123_456));
        assert!(out
            .code_blocks
            .iter()
            .all(|c| c.timestamp_ms == 234_567));
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let cues = vec![
            cue(0, "Welcome to the video, this is important to remember."),
            cue(5000, "def greet(name):"),
            cue(6000, "    return f\"hi {name}\""),
            cue(9000, "In summary, functions keep code tidy."),
        ];
        let a = segmenter().segment(&cues, None).unwrap();
        let b = segmenter().segment(&cues, None).unwrap();
        assert_eq!(a, b);
    }
}
