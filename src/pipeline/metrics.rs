//! Font metrics for report layout.
//!
//! Line wrapping must measure text with the font that will draw it. For
//! embedded TrueType fonts the advance widths come from the font's own
//! `hmtx` table, which is what the PDF viewer uses. For the built-in
//! Helvetica pair they come from the Adobe AFM tables.
//!
//! The built-in fonts are written with WinAnsi (Windows-1252) encoding and
//! cannot draw anything outside it, and a TrueType font cannot draw a
//! character its `cmap` does not map. [`FontMetrics::first_unsupported`]
//! finds such characters so the compiler can refuse them instead of letting
//! them vanish from the page.

use crate::pipeline::layout::TextStyle;
use owned_ttf_parser::{AsFaceRef, GlyphId, OwnedFace};
use std::fmt;
use std::sync::Arc;

const PT_TO_MM: f32 = 25.4 / 72.0;

/// Helvetica advance widths (1/1000 em) for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

/// Helvetica-Bold advance widths (1/1000 em) for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Widest glyph in WinAnsi Helvetica outside ASCII (Æ, Œ, ‰, ™, …, —).
const HELVETICA_WIDEST: u16 = 1000;

/// The Windows-1252 characters in 0x80..=0x9F.
const WINANSI_EXTRAS: &[char] = &[
    '€', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', 'Ž', '‘', '’', '“', '”', '•', '–',
    '—', '˜', '™', 'š', '›', 'œ', 'ž', 'Ÿ',
];

/// Whether the built-in fonts can draw `c`.
pub fn is_winansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}') || WINANSI_EXTRAS.contains(&c)
}

#[derive(Clone)]
enum FaceMetrics {
    Helvetica { bold: bool },
    TrueType { name: String, face: Arc<OwnedFace> },
}

impl FaceMetrics {
    fn name(&self) -> &str {
        match self {
            FaceMetrics::Helvetica { bold: false } => "Helvetica",
            FaceMetrics::Helvetica { bold: true } => "Helvetica-Bold",
            FaceMetrics::TrueType { name, .. } => name,
        }
    }

    fn supports(&self, c: char) -> bool {
        match self {
            FaceMetrics::Helvetica { .. } => is_winansi(c),
            FaceMetrics::TrueType { face, .. } => face.as_face_ref().glyph_index(c).is_some(),
        }
    }

    /// Advance width of `c` in ems.
    fn advance_em(&self, c: char) -> f32 {
        match self {
            FaceMetrics::Helvetica { bold } => {
                let table = if *bold {
                    &HELVETICA_BOLD_ASCII
                } else {
                    &HELVETICA_ASCII
                };
                let units = match c {
                    ' '..='~' => table[c as usize - 0x20],
                    '\u{a0}' => table[0],
                    _ => HELVETICA_WIDEST,
                };
                f32::from(units) / 1000.0
            }
            FaceMetrics::TrueType { face, .. } => {
                let face = face.as_face_ref();
                let upem = f32::from(face.units_per_em().max(1));
                let glyph = face.glyph_index(c).unwrap_or(GlyphId(0));
                let advance = face
                    .glyph_hor_advance(glyph)
                    .map(f32::from)
                    .unwrap_or(upem);
                advance / upem
            }
        }
    }
}

/// Advance widths and glyph coverage for the regular and bold report fonts.
#[derive(Clone)]
pub struct FontMetrics {
    regular: FaceMetrics,
    bold: FaceMetrics,
}

impl fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontMetrics")
            .field("regular", &self.regular.name())
            .field("bold", &self.bold.name())
            .finish()
    }
}

impl FontMetrics {
    /// Metrics of the built-in Helvetica / Helvetica-Bold pair.
    pub fn helvetica() -> Self {
        Self {
            regular: FaceMetrics::Helvetica { bold: false },
            bold: FaceMetrics::Helvetica { bold: true },
        }
    }

    /// Metrics of two parsed TrueType faces. Names are used in error messages.
    pub fn truetype(
        regular_name: impl Into<String>,
        regular: OwnedFace,
        bold_name: impl Into<String>,
        bold: OwnedFace,
    ) -> Self {
        Self {
            regular: FaceMetrics::TrueType {
                name: regular_name.into(),
                face: Arc::new(regular),
            },
            bold: FaceMetrics::TrueType {
                name: bold_name.into(),
                face: Arc::new(bold),
            },
        }
    }

    fn face(&self, style: TextStyle) -> &FaceMetrics {
        if style.is_bold() {
            &self.bold
        } else {
            &self.regular
        }
    }

    /// Name of the font that draws `style`.
    pub fn font_name(&self, style: TextStyle) -> &str {
        self.face(style).name()
    }

    /// First character of `text` the `style` font cannot draw.
    ///
    /// Line breaks and tabs are not drawn and never reported.
    pub fn first_unsupported(&self, text: &str, style: TextStyle) -> Option<char> {
        let face = self.face(style);
        text.chars()
            .filter(|c| !matches!(c, '\n' | '\t'))
            .find(|c| !face.supports(*c))
    }

    /// Advance width of `text` in millimetres.
    pub fn text_width_mm(&self, text: &str, style: TextStyle) -> f32 {
        let face = self.face(style);
        let ems: f32 = text.chars().map(|c| face.advance_em(c)).sum();
        ems * style.size_pt() * PT_TO_MM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winansi_coverage() {
        for c in ['A', ' ', '~', 'é', 'ÿ', '€', '—', '“', '™'] {
            assert!(is_winansi(c), "{c:?} should be encodable");
        }
        for c in ['₹', '→', '★', 'Ł', '中', '\u{7f}', '\u{2028}'] {
            assert!(!is_winansi(c), "{c:?} should not be encodable");
        }
    }

    #[test]
    fn helvetica_widths_follow_afm() {
        let m = FontMetrics::helvetica();
        // "Hi" = H 722 + i 222 = 0.944 em at 12 pt.
        let expected = 0.944 * 12.0 * PT_TO_MM;
        assert!((m.text_width_mm("Hi", TextStyle::Body) - expected).abs() < 1e-4);
        // Bold is wider.
        let body_at_14pt = m.text_width_mm("Hi", TextStyle::Body) * 14.0 / 12.0;
        assert!(m.text_width_mm("Hi", TextStyle::Heading) > body_at_14pt);
    }

    #[test]
    fn helvetica_rejects_non_winansi() {
        let m = FontMetrics::helvetica();
        assert_eq!(
            m.first_unsupported("Opening day: ₹25 crore → strong", TextStyle::Body),
            Some('₹')
        );
        assert_eq!(m.first_unsupported("Café\n\tNoël — “ok”", TextStyle::Body), None);
        assert_eq!(m.font_name(TextStyle::Title), "Helvetica-Bold");
    }
}
