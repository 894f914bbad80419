//! Input resolution: turn a user-supplied path or URL into an uploaded document.
//!
//! The library works on in-memory uploads: a file name plus the raw bytes.
//! A web front end hands those over directly; the CLI builds them here from a
//! local file or an HTTP(S) download. The PDF magic bytes (`%PDF`) are checked
//! up front so callers get a meaningful error rather than a pdfium failure.

use crate::error::RaincheckError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix appended to the document identifier to name the report.
pub const REPORT_SUFFIX: &str = "-report.pdf";

/// A screenplay document as received from an upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// File name as supplied by the uploader, e.g. `"Alpha.pdf"`.
    pub name: String,
    /// Raw document bytes.
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Identifier derived from the upload name: the file name without its
    /// final extension (`"Alpha.pdf"` → `"Alpha"`).
    pub fn identifier(&self) -> String {
        document_identifier(&self.name)
    }

    /// Download name of the report built from this document.
    pub fn report_file_name(&self) -> String {
        report_file_name(&self.identifier())
    }

    /// Fail unless the bytes start with the PDF magic number.
    pub fn ensure_pdf(&self) -> Result<(), RaincheckError> {
        if self.bytes.starts_with(b"%PDF") {
            Ok(())
        } else {
            Err(RaincheckError::NotAPdf {
                name: self.name.clone(),
                magic: self.bytes.iter().take(4).copied().collect(),
            })
        }
    }
}

/// File name without directory and final extension.
pub fn document_identifier(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// `"{identifier}-report.pdf"`.
pub fn report_file_name(identifier: &str) -> String {
    format!("{identifier}{REPORT_SUFFIX}")
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an uploaded document.
///
/// URLs are downloaded; anything else is read as a local file.
pub async fn resolve_input(
    input: &str,
    timeout_secs: u64,
) -> Result<UploadedDocument, RaincheckError> {
    let doc = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    doc.ensure_pdf()?;
    Ok(doc)
}

/// Read a local file into memory.
async fn read_local(path_str: &str) -> Result<UploadedDocument, RaincheckError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => RaincheckError::PermissionDenied { path: path.clone() },
        _ => RaincheckError::FileNotFound { path: path.clone() },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());

    debug!("Read local screenplay: {} ({} bytes)", path.display(), bytes.len());
    Ok(UploadedDocument { name, bytes })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedDocument, RaincheckError> {
    info!("Downloading screenplay from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RaincheckError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            RaincheckError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            RaincheckError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(RaincheckError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| RaincheckError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());

    Ok(UploadedDocument {
        name: filename_from_url(url),
        bytes: bytes.to_vec(),
    })
}

/// Take the last path segment of the URL as the upload name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "screenplay.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/script.pdf"));
        assert!(is_url("http://example.com/script.pdf"));
        assert!(!is_url("/tmp/script.pdf"));
        assert!(!is_url("script.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_identifier_strips_final_extension() {
        assert_eq!(document_identifier("Alpha.pdf"), "Alpha");
        assert_eq!(document_identifier("The.Big.Sleep.pdf"), "The.Big.Sleep");
        assert_eq!(document_identifier("scripts/Beta.pdf"), "Beta");
        assert_eq!(document_identifier("NoExtension"), "NoExtension");
    }

    #[test]
    fn test_report_file_name() {
        let doc = UploadedDocument::new("Alpha.pdf", b"%PDF-1.7".to_vec());
        assert_eq!(doc.report_file_name(), "Alpha-report.pdf");
    }

    #[test]
    fn test_ensure_pdf() {
        assert!(UploadedDocument::new("a.pdf", b"%PDF-1.4\n".to_vec()).ensure_pdf().is_ok());
        let err = UploadedDocument::new("a.pdf", b"hello".to_vec())
            .ensure_pdf()
            .unwrap_err();
        match err {
            RaincheckError::NotAPdf { magic, .. } => assert_eq!(magic, b"hell".to_vec()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://scripts.example.org/drafts/Alpha.pdf"),
            "Alpha.pdf"
        );
        assert_eq!(filename_from_url("https://scripts.example.org/"), "screenplay.pdf");
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, RaincheckError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_local_non_pdf_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"just text").unwrap();
        let err = resolve_input(path.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, RaincheckError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn test_local_pdf_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Gamma.pdf");
        std::fs::write(&path, b"%PDF-1.7 body").unwrap();
        let doc = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(doc.name, "Gamma.pdf");
        assert_eq!(doc.identifier(), "Gamma");
        assert_eq!(doc.bytes, b"%PDF-1.7 body".to_vec());
    }
}
