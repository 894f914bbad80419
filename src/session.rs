//! Per-user session state.
//!
//! A [`Session`] remembers the current document's identifier, its extracted
//! text and, once requested, its report. Uploading a document with the same
//! identifier as the current one reuses the cached text; a different
//! identifier replaces the text and discards any previous report.
//!
//! ```text
//! NoDocument ──upload──▶ TextReady ──generate_report──▶ ReportReady
//!                          ▲   │                            │
//!                          └───┴──── upload (new id) ───────┘
//! ```
//!
//! A failed extraction or analysis leaves the session exactly as it was.

use crate::analyze::{analyze, AnalysisReport};
use crate::config::AnalysisConfig;
use crate::error::RaincheckError;
use crate::output::AnalysisOutput;
use crate::pipeline::extract::{ScreenplayText, TextExtractor};
use crate::pipeline::input::{report_file_name, UploadedDocument};
use crate::pipeline::llm::Generator;
use crate::pipeline::report::{compile_report, ReportDocument};
use tracing::{debug, info};

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing uploaded yet.
    NoDocument,
    /// Text extracted, no report requested.
    TextReady,
    /// Analysis and report available for download.
    ReportReady,
}

/// What an upload did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The document was new; its text was extracted.
    Extracted,
    /// Same identifier as the current document; cached text kept.
    Unchanged,
}

/// State for one user working through one screenplay at a time.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<CurrentDocument>,
}

#[derive(Debug)]
struct CurrentDocument {
    identifier: String,
    text: ScreenplayText,
    report: Option<AnalysisReport>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        match self.current {
            None => SessionState::NoDocument,
            Some(CurrentDocument { report: None, .. }) => SessionState::TextReady,
            Some(CurrentDocument { report: Some(_), .. }) => SessionState::ReportReady,
        }
    }

    /// Identifier of the current document (upload name without extension).
    pub fn document_id(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.identifier.as_str())
    }

    pub fn screenplay(&self) -> Option<&ScreenplayText> {
        self.current.as_ref().map(|c| &c.text)
    }

    pub fn analysis(&self) -> Option<&AnalysisOutput> {
        self.last_report().map(|r| &r.analysis)
    }

    pub fn report(&self) -> Option<&ReportDocument> {
        self.last_report().map(|r| &r.report)
    }

    pub fn last_report(&self) -> Option<&AnalysisReport> {
        self.current.as_ref().and_then(|c| c.report.as_ref())
    }

    /// Register an uploaded document.
    ///
    /// Extraction runs only when the identifier differs from the current
    /// one. Blocking: extraction may take a while for long screenplays.
    pub fn upload(
        &mut self,
        document: &UploadedDocument,
        extractor: &dyn TextExtractor,
    ) -> Result<UploadOutcome, RaincheckError> {
        let identifier = document.identifier();
        if self.document_id() == Some(identifier.as_str()) {
            debug!("'{}' already loaded, keeping cached text", identifier);
            return Ok(UploadOutcome::Unchanged);
        }

        let text = extractor.extract(document)?;
        info!("Loaded '{}' ({} chars)", identifier, text.len());
        self.current = Some(CurrentDocument {
            identifier,
            text,
            report: None,
        });
        Ok(UploadOutcome::Extracted)
    }

    /// Analyse the current screenplay and compile its report.
    ///
    /// Regenerating from `ReportReady` replaces the previous report. On any
    /// failure the previous state, including an older report, is kept.
    ///
    /// # Errors
    /// [`RaincheckError::NoScreenplay`] when nothing has been uploaded.
    pub async fn generate_report(
        &mut self,
        generator: &dyn Generator,
        config: &AnalysisConfig,
    ) -> Result<&AnalysisReport, RaincheckError> {
        let current = self.current.as_mut().ok_or(RaincheckError::NoScreenplay)?;

        let analysis = analyze(&current.text, generator, config).await?;
        let report = compile_report(
            &analysis.result,
            report_file_name(&current.identifier),
            &config.fonts,
        )?;

        let ready: &AnalysisReport = current.report.insert(AnalysisReport {
            document: current.identifier.clone(),
            analysis,
            report,
        });
        Ok(ready)
    }

    /// Forget the current document and report.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
