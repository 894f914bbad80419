//! Report layout: place title, headings and wrapped body lines on A4 pages.
//!
//! Layout is computed before any PDF object exists, so pagination and
//! ordering can be tested without decoding PDF content streams. Coordinates
//! are millimetres measured from the top-left corner of the page; the PDF
//! writer flips them to PDF's bottom-left origin.
//!
//! Text is measured with the [`FontMetrics`] of the fonts that will draw it,
//! so a wrapped line never runs past the right margin.

use crate::pipeline::metrics::FontMetrics;

/// A4 width.
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// A4 height.
pub const PAGE_HEIGHT_MM: f32 = 297.0;
/// Left, right and top margin.
pub const MARGIN_MM: f32 = 10.0;
/// A line whose box would end below `PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM`
/// starts a new page.
pub const BOTTOM_MARGIN_MM: f32 = 20.0;

const TITLE_LINE_MM: f32 = 10.0;
const AFTER_TITLE_MM: f32 = 10.0;
const HEADING_LINE_MM: f32 = 10.0;
const AFTER_HEADING_MM: f32 = 2.0;
const BODY_LINE_MM: f32 = 8.0;
const AFTER_SECTION_MM: f32 = 10.0;

const PT_TO_MM: f32 = 25.4 / 72.0;

/// Typographic role of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Centred bold 16 pt.
    Title,
    /// Bold 14 pt.
    Heading,
    /// Regular 12 pt.
    Body,
}

impl TextStyle {
    pub fn size_pt(self) -> f32 {
        match self {
            TextStyle::Title => 16.0,
            TextStyle::Heading => 14.0,
            TextStyle::Body => 12.0,
        }
    }

    pub fn is_bold(self) -> bool {
        !matches!(self, TextStyle::Body)
    }
}

/// One positioned line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    pub style: TextStyle,
    /// Left edge, from the left side of the page.
    pub x_mm: f32,
    /// Baseline, from the top of the page.
    pub baseline_mm: f32,
}

/// Lines placed on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPage {
    pub lines: Vec<LayoutLine>,
}

/// The full paginated layout of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub pages: Vec<LayoutPage>,
}

impl ReportLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All lines in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &LayoutLine> {
        self.pages.iter().flat_map(|p| p.lines.iter())
    }
}

/// Lay out a report: the title, then each `(heading, body)` pair in order.
///
/// Bodies are used as given; clean them first.
pub fn layout_report<H, B>(title: &str, sections: &[(H, B)], metrics: &FontMetrics) -> ReportLayout
where
    H: AsRef<str>,
    B: AsRef<str>,
{
    let mut cursor = Cursor::new();

    let title_width = metrics.text_width_mm(title, TextStyle::Title);
    let title_x = ((PAGE_WIDTH_MM - title_width) / 2.0).max(MARGIN_MM);
    cursor.place(title, TextStyle::Title, title_x, TITLE_LINE_MM);
    cursor.advance(AFTER_TITLE_MM);

    let body_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    for (heading, body) in sections {
        cursor.place(heading.as_ref(), TextStyle::Heading, MARGIN_MM, HEADING_LINE_MM);
        cursor.advance(AFTER_HEADING_MM);

        for line in wrap_text(body.as_ref(), body_width, TextStyle::Body, metrics) {
            cursor.place(&line, TextStyle::Body, MARGIN_MM, BODY_LINE_MM);
        }
        cursor.advance(AFTER_SECTION_MM);
    }

    cursor.finish()
}

/// Tracks the current page and vertical position while placing lines.
struct Cursor {
    pages: Vec<LayoutPage>,
    y_mm: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![LayoutPage::default()],
            y_mm: MARGIN_MM,
        }
    }

    /// Place a line in a box of `height_mm`, breaking the page first if the
    /// box would cross the bottom margin. Empty text only consumes space.
    fn place(&mut self, text: &str, style: TextStyle, x_mm: f32, height_mm: f32) {
        if self.y_mm + height_mm > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM {
            self.pages.push(LayoutPage::default());
            self.y_mm = MARGIN_MM;
        }
        if !text.is_empty() {
            let baseline_mm = self.y_mm + height_mm / 2.0 + style.size_pt() * PT_TO_MM * 0.3;
            if let Some(page) = self.pages.last_mut() {
                page.lines.push(LayoutLine {
                    text: text.to_string(),
                    style,
                    x_mm,
                    baseline_mm,
                });
            }
        }
        self.y_mm += height_mm;
    }

    fn advance(&mut self, mm: f32) {
        self.y_mm += mm;
    }

    fn finish(self) -> ReportLayout {
        ReportLayout { pages: self.pages }
    }
}

/// Greedy word wrap to `max_width_mm`, measured with `metrics`.
///
/// Explicit newlines are kept (an empty line stays an empty line). Leading
/// spaces indent the first line of their paragraph, runs of spaces between
/// words are kept, tabs become four spaces and trailing whitespace is
/// dropped. A word wider than the line is split across lines. Always returns
/// at least one line.
pub fn wrap_text(
    text: &str,
    max_width_mm: f32,
    style: TextStyle,
    metrics: &FontMetrics,
) -> Vec<String> {
    let fits = |s: &str| metrics.text_width_mm(s, style) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.replace('\t', "    ");
        let paragraph = paragraph.trim_end();
        let words = paragraph.trim_start_matches(' ');
        let indent = &paragraph[..paragraph.len() - words.len()];

        // `current` holds a word once `has_word` is set; before that it is
        // empty or the paragraph's indent.
        let mut current = indent.to_string();
        let mut has_word = false;
        for word in words.split(' ') {
            if has_word {
                let candidate = format!("{current} {word}");
                if fits(&candidate) {
                    current = candidate;
                    continue;
                }
                let done = std::mem::take(&mut current);
                lines.push(done.trim_end_matches(' ').to_string());
                has_word = false;
            }
            // Spaces at a break are not carried to the next line.
            if word.is_empty() {
                continue;
            }
            let candidate = format!("{current}{word}");
            if fits(&candidate) {
                current = candidate;
            } else {
                current.clear();
                for piece in split_word(word, max_width_mm, style, metrics) {
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    current = piece;
                }
            }
            has_word = true;
        }
        if !has_word {
            current.clear();
        }
        lines.push(current);
    }

    lines
}

fn split_word(word: &str, max_width_mm: f32, style: TextStyle, metrics: &FontMetrics) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if current.chars().count() > 1 && metrics.text_width_mm(&current, style) > max_width_mm {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    pieces.push(current);
    pieces
}
