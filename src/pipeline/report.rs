//! PDF report compilation via `printpdf`.
//!
//! The compiler validates its input, resolves fonts, computes the layout
//! (see [`crate::pipeline::layout`]) and writes each placed line onto A4
//! pages. The finished document is returned in memory; the only file access
//! is reading TrueType fonts when [`ReportFonts::Files`] is configured.
//!
//! Text is never dropped silently: every character must be drawable by the
//! configured fonts, otherwise compilation fails before any PDF object is
//! created.

use crate::config::ReportFonts;
use crate::error::RaincheckError;
use crate::output::{validate_sections, AnalysisResult, SectionResult};
use crate::pipeline::layout::{layout_report, ReportLayout, TextStyle, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::pipeline::metrics::FontMetrics;
use owned_ttf_parser::OwnedFace;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

/// Title printed at the top of every report.
pub const REPORT_TITLE: &str = "Screenplay Analysis Report";

/// Content type declared for report downloads.
pub const REPORT_CONTENT_TYPE: &str = "application/pdf";

/// A compiled report, ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    /// Download name, e.g. `"Alpha-report.pdf"`.
    pub file_name: String,
    /// PDF bytes.
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl ReportDocument {
    pub fn content_type(&self) -> &'static str {
        REPORT_CONTENT_TYPE
    }

    /// Write the report to `path`, creating parent directories.
    ///
    /// Writes a temp file first and renames it so a failed write never
    /// leaves a truncated PDF behind.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), RaincheckError> {
        let path = path.as_ref();
        let write_err = |e| RaincheckError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("pdf.tmp");
        tokio::fs::write(&tmp_path, &self.bytes)
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

        info!("Report written to {}", path.display());
        Ok(())
    }
}

/// Compile a complete analysis into a PDF report.
pub fn compile_report(
    result: &AnalysisResult,
    file_name: impl Into<String>,
    fonts: &ReportFonts,
) -> Result<ReportDocument, RaincheckError> {
    compile_sections(result.sections(), file_name, fonts)
}

/// Compile a section list into a PDF report.
///
/// Rejects lists that do not hold exactly the nine categories in order.
/// Before anything is built it fails with [`RaincheckError::ResourceMissing`]
/// if a configured font file is absent, and with
/// [`RaincheckError::UnsupportedCharacter`] if the report text needs a
/// character the fonts cannot draw.
pub fn compile_sections(
    sections: &[SectionResult],
    file_name: impl Into<String>,
    fonts: &ReportFonts,
) -> Result<ReportDocument, RaincheckError> {
    validate_sections(sections)?;
    let fonts = load_fonts(fonts)?;

    let bodies: Vec<(&str, String)> = sections
        .iter()
        .map(|s| (s.category.label(), s.cleaned()))
        .collect();
    check_text(&bodies, &fonts.metrics)?;

    let layout = layout_report(REPORT_TITLE, &bodies, &fonts.metrics);
    debug!("Report layout: {} pages", layout.page_count());

    let bytes = render_pdf(&layout, &fonts.source)?;
    info!(
        "Compiled report: {} pages, {} bytes",
        layout.page_count(),
        bytes.len()
    );

    Ok(ReportDocument {
        file_name: file_name.into(),
        bytes,
        page_count: layout.page_count(),
    })
}

/// Font data handed to printpdf.
enum FontSource {
    Builtin,
    Embedded { regular: Vec<u8>, bold: Vec<u8> },
}

/// Fonts resolved for one compilation.
struct LoadedFonts {
    source: FontSource,
    metrics: FontMetrics,
}

/// Read and parse the configured fonts.
///
/// Both files are checked for existence before either is read, so a missing
/// file is always reported as [`RaincheckError::ResourceMissing`].
fn load_fonts(fonts: &ReportFonts) -> Result<LoadedFonts, RaincheckError> {
    match fonts {
        ReportFonts::Builtin => Ok(LoadedFonts {
            source: FontSource::Builtin,
            metrics: FontMetrics::helvetica(),
        }),
        ReportFonts::Files { regular, bold } => {
            for path in [regular, bold] {
                if !path.is_file() {
                    return Err(RaincheckError::ResourceMissing { path: path.clone() });
                }
            }
            let regular_bytes = read_font_file(regular)?;
            let bold_bytes = read_font_file(bold)?;
            let metrics = FontMetrics::truetype(
                font_name(regular),
                parse_face(regular, &regular_bytes)?,
                font_name(bold),
                parse_face(bold, &bold_bytes)?,
            );
            debug!("Loaded report fonts {:?}", metrics);
            Ok(LoadedFonts {
                source: FontSource::Embedded {
                    regular: regular_bytes,
                    bold: bold_bytes,
                },
                metrics,
            })
        }
    }
}

fn read_font_file(path: &Path) -> Result<Vec<u8>, RaincheckError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RaincheckError::ResourceMissing {
            path: path.to_path_buf(),
        },
        _ => RaincheckError::FontLoadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })
}

fn parse_face(path: &Path, bytes: &[u8]) -> Result<OwnedFace, RaincheckError> {
    OwnedFace::from_vec(bytes.to_vec(), 0).map_err(|e| RaincheckError::FontLoadFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn font_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Fail on the first character of the title, a heading or a body that the
/// fonts cannot draw.
fn check_text(bodies: &[(&str, String)], metrics: &FontMetrics) -> Result<(), RaincheckError> {
    let unsupported = |text: &str, section: &str, style: TextStyle| match metrics
        .first_unsupported(text, style)
    {
        Some(character) => Err(RaincheckError::UnsupportedCharacter {
            character,
            section: section.to_string(),
            font: metrics.font_name(style).to_string(),
        }),
        None => Ok(()),
    };

    unsupported(REPORT_TITLE, REPORT_TITLE, TextStyle::Title)?;
    for &(label, ref body) in bodies {
        unsupported(label, label, TextStyle::Heading)?;
        unsupported(body.as_str(), label, TextStyle::Body)?;
    }
    Ok(())
}

/// Register the regular and bold fonts with the document.
fn register_fonts(
    doc: &PdfDocumentReference,
    source: &FontSource,
) -> Result<(IndirectFontRef, IndirectFontRef), RaincheckError> {
    match source {
        FontSource::Builtin => Ok((
            doc.add_builtin_font(BuiltinFont::Helvetica).map_err(font_err)?,
            doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(font_err)?,
        )),
        FontSource::Embedded { regular, bold } => Ok((
            doc.add_external_font(&regular[..]).map_err(font_err)?,
            doc.add_external_font(&bold[..]).map_err(font_err)?,
        )),
    }
}

fn font_err(e: impl std::fmt::Display) -> RaincheckError {
    RaincheckError::ReportBuildFailed(format!("font error: {e}"))
}

/// Write a layout to PDF bytes.
fn render_pdf(layout: &ReportLayout, fonts: &FontSource) -> Result<Vec<u8>, RaincheckError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        REPORT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let (regular, bold) = register_fonts(&doc, fonts)?;

    for (i, page) in layout.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);

        for line in &page.lines {
            let font = if line.style.is_bold() { &bold } else { &regular };
            layer.use_text(
                line.text.as_str(),
                line.style.size_pt(),
                Mm(line.x_mm),
                Mm(PAGE_HEIGHT_MM - line.baseline_mm),
                font,
            );
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| RaincheckError::ReportBuildFailed(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| RaincheckError::ReportBuildFailed(format!("PDF buffer error: {e}")))
}
