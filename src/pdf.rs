//! PDF export of an assembled summary
//!
//! Rendering is a state machine over a single linear cursor: header, then
//! summary, then code, links, and images, each section skipped when empty.
//! Before any logical block the cursor is checked against the bottom margin
//! and a new page is started when the block would not fit; an atomic line is
//! never split mid-write. All failures surface as one `PdfGeneration` error
//! and partial output is discarded.

use crate::captions::format_timestamp;
use crate::error::{Result, SummarizerError};
use crate::summary::{ContentKind, SummaryContent, VideoDetails};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Page geometry and type sizes, in millimeters / points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub line_height_mm: f32,
    pub block_spacing_mm: f32,
    /// Character budget per wrapped body line
    pub chars_per_line: usize,
    /// Character budget per code line (monospace runs wider)
    pub code_chars_per_line: usize,
    pub heading_font_size: f32,
    pub body_font_size: f32,
    pub code_font_size: f32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        // A4 portrait
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 15.0,
            line_height_mm: 6.0,
            block_spacing_mm: 4.0,
            chars_per_line: 92,
            code_chars_per_line: 84,
            heading_font_size: 16.0,
            body_font_size: 11.0,
            code_font_size: 9.5,
        }
    }
}

/// Rendering stages, advanced in order with empty sections skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderStage {
    Header,
    Summary,
    Code,
    Links,
    Images,
    Done,
}

/// Serializes a `SummaryContent` + `VideoDetails` into a paginated PDF
pub struct PdfRenderer {
    config: PdfConfig,
}

impl PdfRenderer {
    pub fn new(config: PdfConfig) -> Self {
        Self { config }
    }

    /// Render the summary into a single binary document.
    ///
    /// All-or-nothing: any internal failure returns `PdfGeneration` and no
    /// bytes.
    pub fn render(&self, details: &VideoDetails, summary: &SummaryContent) -> Result<Vec<u8>> {
        let (doc, page, layer) = PdfDocument::new(
            details.title.clone(),
            Mm(self.config.page_width_mm),
            Mm(self.config.page_height_mm),
            "Layer 1",
        );

        let body_font = builtin_font(&doc, BuiltinFont::Helvetica)?;
        let bold_font = builtin_font(&doc, BuiltinFont::HelveticaBold)?;
        let code_font = builtin_font(&doc, BuiltinFont::Courier)?;

        let mut cursor = RenderCursor {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y_from_top: self.config.margin_mm,
            config: &self.config,
        };

        let mut stage = RenderStage::Header;
        while stage != RenderStage::Done {
            match stage {
                RenderStage::Header => {
                    self.write_header(&mut cursor, details, &bold_font, &body_font)
                }
                RenderStage::Summary => {
                    self.write_summary(&mut cursor, summary, &bold_font, &body_font)
                }
                RenderStage::Code => {
                    self.write_code(&mut cursor, summary, &bold_font, &body_font, &code_font)
                }
                RenderStage::Links => {
                    self.write_links(&mut cursor, summary, &bold_font, &body_font)
                }
                RenderStage::Images => {
                    self.write_images(&mut cursor, summary, &bold_font, &body_font)
                }
                RenderStage::Done => unreachable!(),
            }
            stage = next_stage(stage, summary);
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| SummarizerError::PdfGeneration(e.to_string()))?;
        debug!("Rendered summary PDF: {} bytes", bytes.len());
        Ok(bytes)
    }

    fn write_header(
        &self,
        cursor: &mut RenderCursor<'_>,
        details: &VideoDetails,
        bold_font: &IndirectFontRef,
        body_font: &IndirectFontRef,
    ) {
        let title_lines = wrap_text(&details.title, self.config.chars_per_line / 2);
        cursor.write_block(&title_lines, bold_font, self.config.heading_font_size);

        let byline = format!(
            "{} - {}",
            details.channel,
            format_timestamp((details.duration_seconds * 1000.0) as u64)
        );
        cursor.write_block(&[byline], body_font, self.config.body_font_size);
    }

    fn write_summary(
        &self,
        cursor: &mut RenderCursor<'_>,
        summary: &SummaryContent,
        bold_font: &IndirectFontRef,
        body_font: &IndirectFontRef,
    ) {
        cursor.write_block(
            &["Summary".to_string()],
            bold_font,
            self.config.heading_font_size,
        );

        for paragraph in summary.text.split("\n\n").filter(|p| !p.trim().is_empty()) {
            let lines = wrap_text(paragraph.trim(), self.config.chars_per_line);
            cursor.write_block(&lines, body_font, self.config.body_font_size);
        }

        if !summary.key_points.is_empty() {
            cursor.write_block(
                &["Key Moments".to_string()],
                bold_font,
                self.config.heading_font_size,
            );
            for point in &summary.key_points {
                let entry = format!("[{}] {}", format_timestamp(point.timestamp_ms), point.text);
                let lines = wrap_text(&entry, self.config.chars_per_line);
                cursor.write_block(&lines, body_font, self.config.body_font_size);
            }
        }
    }

    fn write_code(
        &self,
        cursor: &mut RenderCursor<'_>,
        summary: &SummaryContent,
        bold_font: &IndirectFontRef,
        body_font: &IndirectFontRef,
        code_font: &IndirectFontRef,
    ) {
        cursor.write_block(
            &["Code Snippets".to_string()],
            bold_font,
            self.config.heading_font_size,
        );

        // code[i] pairs with the i-th code-typed timestamp entry
        let labels: Vec<Option<&str>> = summary
            .timestamps
            .iter()
            .filter(|t| t.kind == ContentKind::Code)
            .map(|t| t.language.as_deref())
            .collect();

        for (i, snippet) in summary.code.iter().enumerate() {
            let label = labels
                .get(i)
                .copied()
                .flatten()
                .unwrap_or("code")
                .to_string();
            cursor.write_block(&[label], body_font, self.config.body_font_size);

            let lines: Vec<String> = snippet
                .lines()
                .flat_map(|line| wrap_code_line(line, self.config.code_chars_per_line))
                .collect();
            cursor.write_block(&lines, code_font, self.config.code_font_size);
        }
    }

    fn write_links(
        &self,
        cursor: &mut RenderCursor<'_>,
        summary: &SummaryContent,
        bold_font: &IndirectFontRef,
        body_font: &IndirectFontRef,
    ) {
        cursor.write_block(
            &["Links".to_string()],
            bold_font,
            self.config.heading_font_size,
        );
        for link in &summary.links {
            let lines = wrap_code_line(link, self.config.chars_per_line);
            cursor.write_block(&lines, body_font, self.config.body_font_size);
        }
    }

    fn write_images(
        &self,
        cursor: &mut RenderCursor<'_>,
        summary: &SummaryContent,
        bold_font: &IndirectFontRef,
        body_font: &IndirectFontRef,
    ) {
        cursor.write_block(
            &["Images".to_string()],
            bold_font,
            self.config.heading_font_size,
        );
        for (i, reference) in summary.image_references.iter().enumerate() {
            let entry = format!("{}. {}", i + 1, reference);
            let lines = wrap_code_line(&entry, self.config.chars_per_line);
            cursor.write_block(&lines, body_font, self.config.body_font_size);
        }
    }
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new(PdfConfig::default())
    }
}

fn builtin_font(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font)
        .map_err(|e| SummarizerError::PdfGeneration(e.to_string()))
}

fn next_stage(stage: RenderStage, summary: &SummaryContent) -> RenderStage {
    let after = match stage {
        RenderStage::Header => RenderStage::Summary,
        RenderStage::Summary => RenderStage::Code,
        RenderStage::Code => RenderStage::Links,
        RenderStage::Links => RenderStage::Images,
        RenderStage::Images | RenderStage::Done => return RenderStage::Done,
    };

    match after {
        RenderStage::Code if summary.code.is_empty() => next_stage(after, summary),
        RenderStage::Links if summary.links.is_empty() => next_stage(after, summary),
        RenderStage::Images if summary.image_references.is_empty() => next_stage(after, summary),
        other => other,
    }
}

/// Linear cursor over the document: tracks vertical offset from the top of
/// the current page and starts new pages when blocks would overrun.
struct RenderCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y_from_top: f32,
    config: &'a PdfConfig,
}

impl RenderCursor<'_> {
    /// Write a logical block of already-wrapped lines, then block spacing.
    ///
    /// The page-break check runs once for the whole block; blocks taller
    /// than a page fall back to per-line breaks so no line is ever split.
    fn write_block(&mut self, lines: &[impl AsRef<str>], font: &IndirectFontRef, size: f32) {
        if lines.is_empty() {
            return;
        }

        let block_height = lines.len() as f32 * self.config.line_height_mm;
        self.ensure_room(block_height);

        for line in lines {
            self.ensure_room(self.config.line_height_mm);
            let y = self.config.page_height_mm - self.y_from_top - self.config.line_height_mm;
            self.layer
                .use_text(line.as_ref(), size, Mm(self.config.margin_mm), Mm(y), font);
            self.y_from_top += self.config.line_height_mm;
        }

        self.y_from_top += self.config.block_spacing_mm;
    }

    /// Start a new page when `height_mm` does not fit above the bottom
    /// margin. Blocks taller than a whole page are left to per-line breaks.
    fn ensure_room(&mut self, height_mm: f32) {
        let limit = self.config.page_height_mm - self.config.margin_mm;
        let page_capacity = limit - self.config.margin_mm;
        if self.y_from_top + height_mm > limit && height_mm <= page_capacity {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm(self.config.page_width_mm),
            Mm(self.config.page_height_mm),
            "Layer 1",
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y_from_top = self.config.margin_mm;
    }
}

/// Word-wrap text to a character budget per line
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(current);
            current = word.to_string();
        }
        // A single overlong word still has to land somewhere; hard-split it
        while current.chars().count() > max_chars {
            let head: String = current.chars().take(max_chars).collect();
            current = current.chars().skip(max_chars).collect();
            lines.push(head);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Hard-split a preformatted line at the character budget, preserving
/// leading whitespace on the first fragment
fn wrap_code_line(line: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if line.chars().count() <= max_chars {
        return vec![line.to_string()];
    }

    let mut fragments = Vec::new();
    let mut rest: Vec<char> = line.chars().collect();
    while rest.len() > max_chars {
        let head: String = rest[..max_chars].iter().collect();
        fragments.push(head);
        rest = rest[max_chars..].to_vec();
    }
    if !rest.is_empty() {
        fragments.push(rest.into_iter().collect());
    }
    fragments
}

/// Deterministic export filename: non-alphanumeric characters replaced,
/// lower-cased, suffixed `_summary.pdf`.
pub fn export_filename(title: &str) -> String {
    let slug: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_summary.pdf", slug)
}
