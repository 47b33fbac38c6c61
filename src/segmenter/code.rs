//! Rule-based code detection
//!
//! Scores cue text for code-likeness from fence markers, symbol density,
//! keyword density, and indentation. Deterministic for a given input.

use super::CodeDetector;
use regex::Regex;
use std::sync::OnceLock;

/// Keywords that flag code in any supported language
const GENERIC_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "return", "true", "false", "null",
];

/// Language-specific keyword sets used for both detection and language
/// guessing. Order matters: ties in the language guess resolve to the
/// earliest entry.
const LANGUAGE_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "rust",
        &[
            "fn ", "let ", "let mut", "impl ", "pub fn", "struct ", "enum ", "match ", "use ",
            "println!", "-> ", "::",
        ],
    ),
    (
        "python",
        &[
            "def ", "import ", "from ", "class ", "self.", "elif ", "lambda ", "print(", "None",
        ],
    ),
    (
        "javascript",
        &[
            "function ", "const ", "var ", "=> ", "console.log", "async ", "await ", "export ",
            "require(",
        ],
    ),
];

const CODE_SYMBOLS: &[char] = &['{', '}', '(', ')', ';', '=', '<', '>', '[', ']', '&', '|'];

fn call_pattern_regex() -> &'static Regex {
    static CALL_PATTERN_REGEX: OnceLock<Regex> = OnceLock::new();
    CALL_PATTERN_REGEX.get_or_init(|| {
        Regex::new(r"[A-Za-z_][A-Za-z0-9_]*\s*\(").expect("Failed to compile call pattern regex")
    })
}

/// Deterministic rule-based code detector
#[derive(Debug, Clone, Default)]
pub struct HeuristicCodeDetector;

impl HeuristicCodeDetector {
    pub fn new() -> Self {
        Self
    }

    fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
        keywords.iter().filter(|kw| text.contains(*kw)).count()
    }

    fn symbol_density(text: &str) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let symbols = text.chars().filter(|c| CODE_SYMBOLS.contains(c)).count();
        symbols as f32 / text.chars().count() as f32
    }
}

impl CodeDetector for HeuristicCodeDetector {
    fn score(&self, text: &str) -> f32 {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return 0.0;
        }

        // Explicit fencing is conclusive
        if trimmed.starts_with("```") || trimmed.ends_with("```") {
            return 1.0;
        }

        // A pure-symbol line is a block delimiter, not prose
        if trimmed.chars().all(|c| !c.is_alphanumeric()) {
            return 0.6;
        }

        let mut score: f32 = 0.0;

        if text.starts_with("    ") || text.starts_with('\t') {
            score += 0.3;
        }

        score += (Self::symbol_density(text) * 3.0).min(0.4);

        let language_hits: usize = LANGUAGE_KEYWORDS
            .iter()
            .map(|(_, kws)| Self::keyword_hits(trimmed, kws))
            .sum();
        score += (language_hits as f32 * 0.25).min(0.5);

        let word_count = trimmed.split_whitespace().count().max(1);
        let generic_hits = GENERIC_KEYWORDS
            .iter()
            .filter(|kw| trimmed.split_whitespace().any(|w| w == **kw))
            .count();
        if generic_hits > 0 && Self::symbol_density(text) > 0.02 {
            score += 0.15;
        }

        if call_pattern_regex().is_match(trimmed) && word_count <= 8 {
            score += 0.2;
        }

        score.min(1.0)
    }

    fn guess_language(&self, text: &str) -> Option<String> {
        // A fence tag wins outright: ```rust, ```py, ...
        if let Some(rest) = text.trim_start().strip_prefix("```") {
            let tag = rest.lines().next().unwrap_or("").trim();
            if !tag.is_empty() {
                return Some(tag.to_lowercase());
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (language, keywords) in LANGUAGE_KEYWORDS {
            let hits = Self::keyword_hits(text, keywords);
            let beats_best = match best {
                Some((_, best_hits)) => hits > best_hits,
                None => true,
            };
            if beats_best {
                best = Some((language, hits));
            }
        }

        match best {
            // Two independent keyword hits before committing to a guess
            Some((language, hits)) if hits >= 2 => Some(language.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prose_scores_low() {
        let detector = HeuristicCodeDetector::new();
        assert!(detector.score("Today we talk about how compilers work.") < 0.5);
        assert!(detector.score("") < 0.5);
    }

    #[test]
    fn test_fenced_text_scores_max() {
        let detector = HeuristicCodeDetector::new();
        assert_eq!(detector.score("```rust"), 1.0);
        assert_eq!(detector.score("let x = 5; ```"), 1.0);
    }

    #[test]
    fn test_rust_snippet_scores_high() {
        let detector = HeuristicCodeDetector::new();
        assert!(detector.score("fn add(a: u32, b: u32) -> u32 { a + b }") >= 0.5);
        assert!(detector.score("    println!(\"{}\", total);") >= 0.5);
    }

    #[test]
    fn test_block_delimiters_count_as_code() {
        let detector = HeuristicCodeDetector::new();
        assert!(detector.score("}") >= 0.5);
        assert!(detector.score("});") >= 0.5);
    }

    #[test]
    fn test_language_guess() {
        let detector = HeuristicCodeDetector::new();
        assert_eq!(
            detector.guess_language("fn main() {\n    let mut total = 0;\n}"),
            Some("rust".to_string())
        );
        assert_eq!(
            detector.guess_language("def add(a, b):\n    return a + b\nimport os"),
            Some("python".to_string())
        );
        assert_eq!(
            detector.guess_language("const add = (a, b) => a + b;\nconsole.log(add(1, 2));"),
            Some("javascript".to_string())
        );
        assert_eq!(detector.guess_language("just a sentence."), None);
    }

    #[test]
    fn test_fence_tag_wins_language_guess() {
        let detector = HeuristicCodeDetector::new();
        assert_eq!(
            detector.guess_language("```Go\nfunc main() {}"),
            Some("go".to_string())
        );
    }
}
