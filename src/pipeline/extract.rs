//! Text extraction: PDF bytes → screenplay text via pdfium.
//!
//! Screenplays are digital documents with a text layer, so the text is read
//! directly rather than rasterised. Pages are concatenated in document order
//! with nothing inserted between them; pdfium already ends each page's text
//! with the page's final line break when there is one.
//!
//! pdfium is a C++ library with thread-local state. [`PdfiumExtractor`] is
//! blocking and creates a fresh binding per call; async callers should run it
//! inside `spawn_blocking` or `block_in_place`.

use crate::error::RaincheckError;
use crate::pipeline::input::UploadedDocument;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Full plain text of a screenplay, pages concatenated in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenplayText(String);

impl ScreenplayText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ScreenplayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Concatenate per-page text in page order.
pub fn concat_pages<I, S>(pages: I) -> ScreenplayText
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for page in pages {
        text.push_str(page.as_ref());
    }
    ScreenplayText(text)
}

/// Converts an uploaded document into screenplay text.
pub trait TextExtractor: Send + Sync {
    /// Extract the text of every page, in order.
    fn extract(&self, document: &UploadedDocument) -> Result<ScreenplayText, RaincheckError>;
}

/// [`TextExtractor`] backed by PDFium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a user password for encrypted screenplays.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
        }
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract(&self, document: &UploadedDocument) -> Result<ScreenplayText, RaincheckError> {
        document.ensure_pdf()?;

        let pdfium = bind_pdfium()?;
        let pdf = pdfium
            .load_pdf_from_byte_slice(&document.bytes, self.password.as_deref())
            .map_err(|e| map_load_error(&document.name, self.password.is_some(), e))?;

        let pages = pdf.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| RaincheckError::PageTextFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?
                .all();
            debug!("Page {}: {} chars", idx + 1, text.len());
            texts.push(text);
        }

        let screenplay = concat_pages(texts);
        info!(
            "Extracted {} chars from '{}'",
            screenplay.len(),
            document.name
        );
        Ok(screenplay)
    }
}

/// Bind to a PDFium shared library.
///
/// Discovery order:
/// 1. `PDFIUM_LIB_PATH` env var (explicit path to the library file)
/// 2. Alongside the running executable
/// 3. The current working directory
/// 4. System library search paths
pub fn bind_pdfium() -> Result<Pdfium, RaincheckError> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        debug!(path = %path, "Loading PDFium from env var");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            RaincheckError::PdfiumBindingFailed(format!("{path}: {e:?}"))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let mut candidates = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
    {
        candidates.push(exe_dir);
    }
    candidates.push(std::path::PathBuf::from("./"));

    for dir in &candidates {
        let lib_path =
            Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!(dir = %dir.display(), "Loaded PDFium from candidate directory");
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| RaincheckError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Map pdfium load errors, singling out encrypted documents.
fn map_load_error(name: &str, had_password: bool, e: PdfiumError) -> RaincheckError {
    let detail = format!("{:?}", e);
    if detail.to_lowercase().contains("password") {
        if had_password {
            RaincheckError::WrongPassword {
                name: name.to_string(),
            }
        } else {
            RaincheckError::PasswordRequired {
                name: name.to_string(),
            }
        }
    } else {
        RaincheckError::CorruptPdf {
            name: name.to_string(),
            detail,
        }
    }
}
