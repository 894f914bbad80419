//! Error types for the raincheck library.
//!
//! Two error types reflect two levels of failure:
//!
//! * [`RaincheckError`] — **Fatal**: the request cannot complete (bad input
//!   document, provider not configured, a generation call failed, report
//!   fonts missing). Returned as `Err(RaincheckError)` from every entry point.
//!
//! * [`GenerationError`] — the failure of a single remote generation call.
//!   The orchestrator wraps it in [`RaincheckError::GenerationFailed`] together
//!   with the category that was being analysed, then aborts the batch.
//!
//! Every fatal variant maps onto one of three [`ErrorKind`]s so a UI can show
//! the right status without matching on individual variants.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`RaincheckError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The uploaded document could not be read or parsed.
    Extraction,
    /// A remote generation call failed or could not be made.
    Generation,
    /// Rendering resources (fonts) needed for the report are absent.
    ResourceMissing,
    /// Configuration, output, or internal failures.
    Other,
}

/// All fatal errors returned by the raincheck library.
#[derive(Debug, Error)]
pub enum RaincheckError {
    // ── Input / extraction errors ─────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Screenplay file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// pdfium returned an error while reading the text of a page.
    #[error("Text extraction failed on page {page}: {detail}")]
    PageTextFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs a PDFium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the raincheck executable.\n\
  • Install PDFium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Generation errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The remote call for one category failed; the batch was aborted.
    #[error("Analysis of '{category}' failed: {source}")]
    GenerationFailed {
        category: String,
        #[source]
        source: GenerationError,
    },

    /// Generation was requested before any screenplay text was available.
    #[error("No screenplay loaded; upload a document before generating a report")]
    NoScreenplay,

    // ── Report errors ─────────────────────────────────────────────────────
    /// A font file required by the report is absent.
    #[error("Report font not found: '{path}'\nPlace DejaVuSans.ttf and DejaVuSans-Bold.ttf there or pass --font-dir.")]
    ResourceMissing { path: PathBuf },

    /// A font file exists but could not be loaded.
    #[error("Failed to load report font '{path}': {detail}")]
    FontLoadFailed { path: PathBuf, detail: String },

    /// The report text needs a character the selected font cannot draw.
    #[error("Font '{font}' cannot draw {character:?} (U+{:04X}) in '{section}'\nUse a Unicode TrueType font such as DejaVuSans.", code_point(.character))]
    UnsupportedCharacter {
        character: char,
        section: String,
        font: String,
    },

    /// The analysis handed to the compiler does not hold exactly the nine
    /// categories in their fixed order.
    #[error("Incomplete analysis: {detail}")]
    IncompleteAnalysis { detail: String },

    /// printpdf failed while assembling or serialising the report.
    #[error("Failed to build PDF report: {0}")]
    ReportBuildFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn code_point(c: &char) -> u32 {
    u32::from(*c)
}

impl RaincheckError {
    /// Classify this error into one of the three pipeline failure kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RaincheckError::FileNotFound { .. }
            | RaincheckError::PermissionDenied { .. }
            | RaincheckError::DownloadFailed { .. }
            | RaincheckError::DownloadTimeout { .. }
            | RaincheckError::NotAPdf { .. }
            | RaincheckError::CorruptPdf { .. }
            | RaincheckError::PasswordRequired { .. }
            | RaincheckError::WrongPassword { .. }
            | RaincheckError::PageTextFailed { .. }
            | RaincheckError::PdfiumBindingFailed(_) => ErrorKind::Extraction,

            RaincheckError::ProviderNotConfigured { .. }
            | RaincheckError::GenerationFailed { .. }
            | RaincheckError::NoScreenplay => ErrorKind::Generation,

            RaincheckError::ResourceMissing { .. }
            | RaincheckError::FontLoadFailed { .. }
            | RaincheckError::UnsupportedCharacter { .. } => {
                ErrorKind::ResourceMissing
            }

            RaincheckError::IncompleteAnalysis { .. }
            | RaincheckError::ReportBuildFailed(_)
            | RaincheckError::OutputWriteFailed { .. }
            | RaincheckError::InvalidConfig(_)
            | RaincheckError::Internal(_) => ErrorKind::Other,
        }
    }
}

/// Failure of a single remote generation call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GenerationError {
    /// The provider answered HTTP 429 or reported a quota problem.
    #[error("rate limit exceeded: {detail}")]
    RateLimited { detail: String },

    /// The provider rejected the credential (401/403).
    #[error("authentication rejected: {detail}")]
    Unauthorized { detail: String },

    /// The call returned but carried no completion text.
    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },

    /// Transport or API failure.
    #[error("{detail}")]
    Api { detail: String },
}

impl GenerationError {
    /// Classify a provider error message.
    ///
    /// `edgequake-llm` surfaces HTTP status codes and provider messages as
    /// text, so the classification is done on the rendered message.
    pub fn from_provider_message(message: impl Into<String>) -> Self {
        let detail = message.into();
        let lower = detail.to_lowercase();
        if lower.contains("429") || lower.contains("rate limit") || lower.contains("quota") {
            GenerationError::RateLimited { detail }
        } else if lower.contains("401")
            || lower.contains("403")
            || lower.contains("unauthorized")
            || lower.contains("invalid api key")
            || lower.contains("incorrect api key")
        {
            GenerationError::Unauthorized { detail }
        } else {
            GenerationError::Api { detail }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failed_display_names_category() {
        let e = RaincheckError::GenerationFailed {
            category: "Genre".into(),
            source: GenerationError::Api {
                detail: "connection reset".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("Genre"), "got: {msg}");
        assert!(msg.contains("connection reset"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Generation);
    }

    #[test]
    fn extraction_errors_are_classified() {
        let e = RaincheckError::NotAPdf {
            name: "notes.txt".into(),
            magic: b"hell".to_vec(),
        };
        assert_eq!(e.kind(), ErrorKind::Extraction);
        assert_eq!(
            RaincheckError::PdfiumBindingFailed("nope".into()).kind(),
            ErrorKind::Extraction
        );
    }

    #[test]
    fn missing_font_is_resource_missing() {
        let e = RaincheckError::ResourceMissing {
            path: PathBuf::from("DejaVuSans.ttf"),
        };
        assert_eq!(e.kind(), ErrorKind::ResourceMissing);
        assert!(e.to_string().contains("DejaVuSans.ttf"));
    }

    #[test]
    fn unsupported_character_names_code_point_and_section() {
        let e = RaincheckError::UnsupportedCharacter {
            character: '₹',
            section: "Box Office Collection".into(),
            font: "Helvetica".into(),
        };
        assert_eq!(e.kind(), ErrorKind::ResourceMissing);
        let msg = e.to_string();
        assert!(msg.contains("U+20B9"), "{msg}");
        assert!(msg.contains("Box Office Collection"), "{msg}");
    }

    #[test]
    fn provider_messages_are_classified() {
        assert!(matches!(
            GenerationError::from_provider_message("HTTP 429 Too Many Requests"),
            GenerationError::RateLimited { .. }
        ));
        assert!(matches!(
            GenerationError::from_provider_message("401: Incorrect API key provided"),
            GenerationError::Unauthorized { .. }
        ));
        assert!(matches!(
            GenerationError::from_provider_message("connection refused"),
            GenerationError::Api { .. }
        ));
    }
}
