//! Rule-based salience scoring for key point detection

use super::SalienceScorer;

/// Phrases that signal an instructor is flagging something important
const SIGNAL_PHRASES: &[&str] = &[
    "important",
    "key point",
    "key takeaway",
    "takeaway",
    "remember",
    "note that",
    "keep in mind",
    "crucial",
    "essential",
    "the main thing",
    "in summary",
    "to summarize",
    "most common mistake",
    "pay attention",
    "don't forget",
];

/// Comfortable length band for a standalone key point, in characters
const LENGTH_BAND: (usize, usize) = (30, 240);

/// Deterministic rule-based salience scorer
#[derive(Debug, Clone, Default)]
pub struct HeuristicSalienceScorer;

impl HeuristicSalienceScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SalienceScorer for HeuristicSalienceScorer {
    fn score(&self, text: &str) -> f32 {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return 0.0;
        }

        let lowered = trimmed.to_lowercase();
        let mut score: f32 = 0.0;

        let phrase_hits = SIGNAL_PHRASES
            .iter()
            .filter(|p| lowered.contains(*p))
            .count();
        score += (phrase_hits as f32 * 0.4).min(0.6);

        let len = trimmed.chars().count();
        if (LENGTH_BAND.0..=LENGTH_BAND.1).contains(&len) {
            score += 0.15;
        }

        // Enumerations ("first", "second", "finally") often carry structure
        let first_word = lowered.split_whitespace().next().unwrap_or("");
        if matches!(first_word, "first" | "second" | "third" | "finally" | "lastly") {
            score += 0.25;
        }

        if trimmed.chars().any(|c| c.is_ascii_digit()) {
            score += 0.1;
        }

        score.min(1.0)
    }
}
