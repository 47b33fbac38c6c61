//! Caption cue model and raw caption parsing
//!
//! Raw caption data arrives in whichever format the timed-text endpoint
//! serves: SRT, WebVTT, or the `json3` payload. All of them normalize to a
//! flat cue list with start times in milliseconds. Milliseconds are the
//! canonical unit at rest; conversion to seconds happens only at render time.

use crate::error::{Result, SummarizerError};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// A single time-coded caption line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cue {
    /// Start offset from the beginning of the video, in milliseconds
    pub start_ms: u64,
    /// Cue text with markup stripped
    pub text: String,
}

impl Cue {
    pub fn new(start_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            text: text.into(),
        }
    }
}

/// Source of raw caption cues for a video
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch cues for a video, optionally constrained to a language.
    ///
    /// Failures map to `SummarizerError::CaptionProcessing`; the pipeline
    /// recovers from them with a degraded summary.
    async fn fetch(&self, video_id: &str, language: Option<&str>) -> Result<Vec<Cue>>;
}

fn html_tag_regex() -> &'static Regex {
    static HTML_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    HTML_TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("Failed to compile HTML tag regex"))
}

/// Parse raw caption data in any supported format into a normalized cue list.
///
/// Empty and whitespace-only cues are discarded. The format is sniffed from
/// the payload itself.
pub fn parse_captions(raw: &str) -> Result<Vec<Cue>> {
    let trimmed = raw.trim_start_matches('\u{FEFF}').trim_start();

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with("WEBVTT") {
        parse_webvtt(trimmed)
    } else if trimmed.starts_with('{') {
        parse_json3(trimmed)
    } else if trimmed.contains("-->") {
        parse_srt(trimmed)
    } else {
        Err(SummarizerError::CaptionProcessing(
            "unrecognized caption format".to_string(),
        ))
    }
}

/// Parse SRT caption blocks: index line, timing line, text lines.
pub fn parse_srt(raw: &str) -> Result<Vec<Cue>> {
    let raw = raw.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for block in raw.split("\n\n") {
        let mut lines = block.lines().map(str::trim_end).peekable();

        // Skip the sequential index line when present
        if let Some(first) = lines.peek() {
            if first.trim().parse::<u32>().is_ok() {
                lines.next();
            }
        }

        let timing = match lines.next() {
            Some(line) if line.contains("-->") => line,
            Some(_) | None => continue,
        };

        let start = timing
            .split("-->")
            .next()
            .map(str::trim)
            .ok_or_else(|| {
                SummarizerError::CaptionProcessing(format!("invalid timing line: {}", timing))
            })?;
        let start_ms = parse_timestamp_ms(start)?;

        let text = clean_cue_text(&lines.collect::<Vec<_>>().join("\n"));
        if !text.is_empty() {
            cues.push(Cue::new(start_ms, text));
        }
    }

    debug!("Parsed {} SRT cues", cues.len());
    Ok(cues)
}

/// Parse WebVTT captions, skipping NOTE/STYLE/REGION blocks and cue
/// identifiers, stripping markup tags from cue text.
pub fn parse_webvtt(raw: &str) -> Result<Vec<Cue>> {
    let lines: Vec<&str> = raw.lines().collect();
    let mut cues = Vec::new();
    let mut i = 0;

    let first_line = lines
        .first()
        .map(|l| l.trim().trim_start_matches('\u{FEFF}'))
        .unwrap_or("");
    if !first_line.starts_with("WEBVTT") {
        return Err(SummarizerError::CaptionProcessing(
            "no WEBVTT header found".to_string(),
        ));
    }
    i += 1;

    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() {
            i += 1;
            continue;
        }

        if line.starts_with("NOTE") || line.starts_with("STYLE") || line.starts_with("REGION") {
            i = skip_block(&lines, i);
            continue;
        }

        // A non-timing line here is a cue identifier; the timing line follows
        let timing = if line.contains("-->") {
            line
        } else {
            i += 1;
            match lines.get(i).map(|l| l.trim()) {
                Some(next) if next.contains("-->") => next,
                _ => continue,
            }
        };

        let start = timing
            .split("-->")
            .next()
            .map(str::trim)
            .unwrap_or_default();
        let start_ms = parse_timestamp_ms(start)?;
        i += 1;

        let mut text_lines = Vec::new();
        while i < lines.len() && !lines[i].trim().is_empty() {
            text_lines.push(lines[i].trim_end());
            i += 1;
        }

        let text = clean_cue_text(&text_lines.join("\n"));
        if !text.is_empty() {
            cues.push(Cue::new(start_ms, text));
        }
    }

    debug!("Parsed {} WebVTT cues", cues.len());
    Ok(cues)
}

#[derive(Debug, Deserialize)]
struct Json3Payload {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    start_ms: Option<u64>,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Parse the `json3` timed-text payload.
pub fn parse_json3(raw: &str) -> Result<Vec<Cue>> {
    let payload: Json3Payload = serde_json::from_str(raw)
        .map_err(|e| SummarizerError::CaptionProcessing(format!("invalid json3 payload: {}", e)))?;

    let mut cues = Vec::new();
    for event in payload.events {
        let Some(start_ms) = event.start_ms else {
            continue;
        };
        let text = clean_cue_text(
            &event
                .segs
                .iter()
                .map(|s| s.utf8.as_str())
                .collect::<String>(),
        );
        if !text.is_empty() {
            cues.push(Cue::new(start_ms, text));
        }
    }

    debug!("Parsed {} json3 cues", cues.len());
    Ok(cues)
}

fn skip_block(lines: &[&str], mut index: usize) -> usize {
    index += 1;
    while index < lines.len() && !lines[index].trim().is_empty() {
        index += 1;
    }
    index
}

/// Strip markup tags and trim, preserving line structure inside the cue
fn clean_cue_text(text: &str) -> String {
    html_tag_regex().replace_all(text, "").trim().to_string()
}

/// Parse an SRT/WebVTT timestamp (`HH:MM:SS,mmm`, `HH:MM:SS.mmm`, or
/// `MM:SS.mmm`) into milliseconds.
fn parse_timestamp_ms(timestamp: &str) -> Result<u64> {
    let normalized = timestamp.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, rest) = match parts.as_slice() {
        [h, m, s] => (parse_component(h)?, parse_component(m)?, *s),
        [m, s] => (0, parse_component(m)?, *s),
        _ => {
            return Err(SummarizerError::CaptionProcessing(format!(
                "invalid timestamp: {}",
                timestamp
            )))
        }
    };

    let (seconds, millis) = match rest.split_once('.') {
        Some((s, frac)) => {
            let mut frac = frac.to_string();
            frac.truncate(3);
            while frac.len() < 3 {
                frac.push('0');
            }
            (parse_component(s)?, parse_component(&frac)?)
        }
        None => (parse_component(rest)?, 0),
    };

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

fn parse_component(value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        SummarizerError::CaptionProcessing(format!("invalid timestamp component: {}", value))
    })
}

/// Format a millisecond offset as `MM:SS` (or `H:MM:SS` past the hour) for
/// display and PDF rendering.
pub fn format_timestamp(start_ms: u64) -> String {
    let total_seconds = Duration::from_millis(start_ms).as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// HTTP caption source hitting a timed-text endpoint
pub struct TimedTextClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TimedTextClient {
    /// Create a client for the public timed-text endpoint
    pub fn new(timeout_seconds: u64, api_key: Option<String>) -> Self {
        Self::with_base_url("https://video.google.com", timeout_seconds, api_key)
    }

    /// Create a client against a custom endpoint (used by tests and mirrors)
    pub fn with_base_url(base_url: &str, timeout_seconds: u64, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("yt-summarizer/0.1")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request_url(&self, video_id: &str, language: Option<&str>) -> String {
        let mut url = format!(
            "{}/timedtext?v={}&lang={}&fmt=json3",
            self.base_url,
            urlencoding::encode(video_id),
            urlencoding::encode(language.unwrap_or("en")),
        );
        if let Some(key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }
}

#[async_trait]
impl CaptionSource for TimedTextClient {
    async fn fetch(&self, video_id: &str, language: Option<&str>) -> Result<Vec<Cue>> {
        let url = self.request_url(video_id, language);
        debug!("Fetching captions from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SummarizerError::CaptionProcessing(format!("caption fetch: {}", e)))?;

        if !response.status().is_success() {
            return Err(SummarizerError::CaptionProcessing(format!(
                "caption endpoint returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SummarizerError::CaptionProcessing(format!("caption body: {}", e)))?;

        parse_captions(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT_SAMPLE: &str = "1\n00:00:01,000 --> 00:00:04,000\nWelcome to the stream\n\n2\n00:00:05,500 --> 00:00:08,000\nToday we cover iterators\n";

    const VTT_SAMPLE: &str = "WEBVTT\n\nNOTE this is ignored\n\n00:01.000 --> 00:04.000\nWelcome <b>back</b>\n\nintro-2\n00:05.250 --> 00:08.000 align:start\n<v Speaker>Let's begin</v>\n";

    #[test]
    fn test_parse_srt_sample() {
        let cues = parse_srt(SRT_SAMPLE).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_ms, 1000);
        assert_eq!(cues[0].text, "Welcome to the stream");
        assert_eq!(cues[1].start_ms, 5500);
    }

    #[test]
    fn test_parse_webvtt_sample() {
        let cues = parse_webvtt(VTT_SAMPLE).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_ms, 1000);
        assert_eq!(cues[0].text, "Welcome back");
        assert_eq!(cues[1].start_ms, 5250);
        assert_eq!(cues[1].text, "Let's begin");
    }

    #[test]
    fn test_parse_json3_sample() {
        let raw = r#"{"events":[{"tStartMs":0,"segs":[{"utf8":"Hello "},{"utf8":"world"}]},{"tStartMs":2000,"segs":[{"utf8":"   "}]},{"segs":[{"utf8":"no start"}]}]}"#;
        let cues = parse_json3(raw).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_ms, 0);
        assert_eq!(cues[0].text, "Hello world");
    }

    #[test]
    fn test_format_sniffing() {
        assert_eq!(parse_captions(SRT_SAMPLE).unwrap().len(), 2);
        assert_eq!(parse_captions(VTT_SAMPLE).unwrap().len(), 2);
        assert!(parse_captions("plain text with no cues").is_err());
        assert!(parse_captions("").unwrap().is_empty());
    }

    #[test]
    fn test_empty_cues_discarded() {
        let raw = "1\n00:00:01,000 --> 00:00:02,000\n   \n\n2\n00:00:03,000 --> 00:00:04,000\nkept\n";
        let cues = parse_srt(raw).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "kept");
    }

    #[test]
    fn test_timestamp_parsing() {
        assert_eq!(parse_timestamp_ms("01:01:01,000").unwrap(), 3_661_000);
        assert_eq!(parse_timestamp_ms("00:00:01.500").unwrap(), 1500);
        assert_eq!(parse_timestamp_ms("02:30.250").unwrap(), 150_250);
        assert!(parse_timestamp_ms("garbage").is_err());
    }

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(format_timestamp(0), "00:00");
        assert_eq!(format_timestamp(75_000), "01:15");
        assert_eq!(format_timestamp(3_661_000), "1:01:01");
    }

    #[test]
    fn test_request_url_includes_key() {
        let client = TimedTextClient::with_base_url(
            "http://localhost:9999",
            5,
            Some("secret key".to_string()),
        );
        let url = client.request_url("dQw4w9WgXcQ", Some("en"));
        assert!(url.contains("v=dQw4w9WgXcQ"));
        assert!(url.contains("lang=en"));
        assert!(url.contains("key=secret%20key"));
    }
}
