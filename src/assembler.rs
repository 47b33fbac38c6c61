//! Summary assembly: segmenter output + metadata + image references into one
//! normalized `SummaryContent`
//!
//! Pure given its inputs. Renderers and the PDF exporter consume the result
//! deterministically.

use crate::segmenter::SegmenterOutput;
use crate::summary::{ContentKind, SummaryContent, VideoDetails};
use crate::youtube;
use regex::Regex;
use std::sync::OnceLock;

fn link_regex() -> &'static Regex {
    static LINK_REGEX: OnceLock<Regex> = OnceLock::new();
    LINK_REGEX
        .get_or_init(|| Regex::new(r#"https?://[^\s<>"]+"#).expect("Failed to compile link regex"))
}

/// Merge segmenter output, video metadata, and auxiliary image references
/// into one `SummaryContent`.
pub fn assemble(
    details: &VideoDetails,
    segmented: &SegmenterOutput,
    extra_image_refs: &[String],
) -> SummaryContent {
    // Union of key points and code blocks, stably sorted by timestamp.
    // Disjointness is the classifiers' contract, not enforced here.
    let mut timestamps = Vec::with_capacity(segmented.key_points.len() + segmented.code_blocks.len());
    timestamps.extend(segmented.key_points.iter().cloned());
    for block in &segmented.code_blocks {
        let mut block = block.clone();
        if block.language.is_none() {
            let (_, fence_language) = strip_code_fences(&block.text);
            block.language = fence_language;
        }
        timestamps.push(block);
    }
    timestamps.sort_by_key(|item| item.timestamp_ms);

    let key_points = timestamps
        .iter()
        .filter(|item| item.kind == ContentKind::KeyPoint)
        .cloned()
        .collect();

    // Fencing is stripped in `code` only; the timestamped entries keep the
    // source text verbatim.
    let code = segmented
        .code_blocks
        .iter()
        .map(|block| strip_code_fences(&block.text).0)
        .collect();

    let mut links = vec![youtube::watch_url(&details.video_id)];
    if !details.channel.is_empty() {
        links.push(youtube::channel_url(&details.channel));
    }
    links.extend(extract_links(&details.description));

    let mut image_references = Vec::with_capacity(extra_image_refs.len() + 1);
    if !details.thumbnail.is_empty() {
        image_references.push(details.thumbnail.clone());
    }
    image_references.extend(extra_image_refs.iter().cloned());

    let transcript_summary = if segmented.summary.trim().is_empty() {
        None
    } else {
        Some(segmented.summary.clone())
    };
    let text = transcript_summary
        .clone()
        .unwrap_or_else(|| fallback_text(details));

    SummaryContent {
        text,
        code,
        links,
        image_references,
        timestamps,
        key_points,
        transcript_summary,
    }
}

/// Templated fallback used when no transcript summary exists. Never empty.
pub fn fallback_text(details: &VideoDetails) -> String {
    format!(
        "No transcript summary is available for \"{}\" by {}.",
        details.title, details.channel
    )
}

/// Strip markdown fencing from a code block, returning the body and the
/// language tag of the first fence line when present.
pub fn strip_code_fences(text: &str) -> (String, Option<String>) {
    let mut language = None;
    let mut kept = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("```") {
            let tag = rest.trim();
            if language.is_none() && !tag.is_empty() {
                language = Some(tag.to_lowercase());
            }
            continue;
        }
        kept.push(line);
    }

    let mut body = kept.join("\n").trim().to_string();
    if let Some(stripped) = body.strip_suffix("```") {
        body = stripped.trim_end().to_string();
    }

    (body, language)
}

/// Extract http(s) URLs from free text, in order, duplicates allowed
pub fn extract_links(text: &str) -> Vec<String> {
    link_regex()
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ')']).to_string())
        .filter(|candidate| url::Url::parse(candidate).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::TimeStampedContent;

    fn details() -> VideoDetails {
        VideoDetails {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: "Iterators in Depth".to_string(),
            description: "Slides: https://example.com/slides. More at https://example.com/notes,"
                .to_string(),
            thumbnail: "thumb.jpg".to_string(),
            channel: "RustCasts".to_string(),
            duration_seconds: 1234.0,
            captions_available: true,
            language: Some("en".to_string()),
        }
    }

    fn segmented() -> SegmenterOutput {
        SegmenterOutput {
            key_points: vec![
                TimeStampedContent::new(30_000, "Iterators are lazy.", ContentKind::KeyPoint),
                TimeStampedContent::new(90_000, "Collect drives them.", ContentKind::KeyPoint),
            ],
            code_blocks: vec![TimeStampedContent::new(
                60_000,
                "```rust\nlet total: u32 = items.iter().sum();\n```",
                ContentKind::Code,
            )],
            summary: "Iterators are lazy and collect drives them.".to_string(),
        }
    }

    #[test]
    fn test_timestamps_sorted_and_key_points_subset() {
        let content = assemble(&details(), &segmented(), &[]);

        assert!(content
            .timestamps
            .windows(2)
            .all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
        assert!(content
            .key_points
            .iter()
            .all(|k| content.timestamps.contains(k)));
        assert_eq!(content.timestamps.len(), 3);
        assert_eq!(content.key_points.len(), 2);
    }

    #[test]
    fn test_code_stripped_but_timestamp_entry_keeps_fencing() {
        let content = assemble(&details(), &segmented(), &[]);

        assert_eq!(content.code.len(), 1);
        assert_eq!(content.code[0], "let total: u32 = items.iter().sum();");

        let code_entry = content
            .timestamps
            .iter()
            .find(|t| t.kind == ContentKind::Code)
            .unwrap();
        assert!(code_entry.text.contains("```"));
        assert_eq!(code_entry.language.as_deref(), Some("rust"));
    }

    #[test]
    fn test_links_start_with_watch_and_channel() {
        let content = assemble(&details(), &segmented(), &[]);
        assert_eq!(content.links[0], "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert!(content.links[1].contains("search_query=RustCasts"));
        assert_eq!(content.links[2], "https://example.com/slides");
        assert_eq!(content.links[3], "https://example.com/notes");
    }

    #[test]
    fn test_image_references_thumbnail_first() {
        let extra = vec![
            "video-images/a.png".to_string(),
            "https://youtu.be/xyz".to_string(),
        ];
        let content = assemble(&details(), &segmented(), &extra);
        assert_eq!(
            content.image_references,
            vec![
                "thumb.jpg".to_string(),
                "video-images/a.png".to_string(),
                "https://youtu.be/xyz".to_string(),
            ]
        );

        let mut no_thumb = details();
        no_thumb.thumbnail = String::new();
        let content = assemble(&no_thumb, &segmented(), &extra);
        assert_eq!(content.image_references[0], "video-images/a.png");
    }

    #[test]
    fn test_text_never_empty() {
        let empty = SegmenterOutput {
            summary: "   ".to_string(),
            ..Default::default()
        };
        let content = assemble(&details(), &empty, &[]);
        assert!(!content.text.is_empty());
        assert!(content.text.contains("Iterators in Depth"));
        assert!(content.text.contains("RustCasts"));
        assert!(content.transcript_summary.is_none());
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let a = assemble(&details(), &segmented(), &["x.png".to_string()]);
        let b = assemble(&details(), &segmented(), &["x.png".to_string()]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_strip_code_fences() {
        let (body, lang) = strip_code_fences("```python\nprint(1)\n```");
        assert_eq!(body, "print(1)");
        assert_eq!(lang.as_deref(), Some("python"));

        let (body, lang) = strip_code_fences("plain snippet```");
        assert_eq!(body, "plain snippet");
        assert_eq!(lang, None);
    }
}
