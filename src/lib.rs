//! # raincheck
//!
//! Turn a screenplay PDF into a producer-facing analysis report.
//!
//! ## Why this crate?
//!
//! Producers read dozens of scripts before committing to one. This crate
//! extracts a screenplay's text, asks an LLM nine fixed questions about it
//! (logline, genre, keywords, location, synopsis, script score, plot
//! assessment, character profiles, box office) and typesets the answers into
//! a downloadable PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Extract  page text via pdfium (blocking, spawn_blocking)
//!  ├─ 3. Analyse  nine independent calls to gpt-4o-mini / claude / ollama / …
//!  ├─ 4. Clean    strip emphasis, heading and code markup
//!  └─ 5. Report   A4 PDF: title, then one heading + body per category
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use raincheck::{analyze_document, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = AnalysisConfig::default();
//!     let out = analyze_document("Alpha.pdf", &config).await?;
//!     println!("{}", out.analysis.result.display_markdown());
//!     out.report.write_to(&out.report.file_name).await?;
//!     Ok(())
//! }
//! ```
//!
//! Reports are typeset in DejaVuSans, read from the working directory unless
//! [`ReportFonts`] says otherwise.
//!
//! Interactive front-ends keep a [`Session`] per user so repeated uploads of
//! the same file skip extraction.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `raincheck` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! raincheck = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_document, analyze_upload, ask, resolve_provider, AnalysisReport};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ReportFonts, DEFAULT_MODEL};
pub use error::{ErrorKind, GenerationError, RaincheckError};
pub use output::{AnalysisOutput, AnalysisResult, AnalysisStats, SectionResult};
pub use pipeline::extract::{PdfiumExtractor, ScreenplayText, TextExtractor};
pub use pipeline::input::{resolve_input, UploadedDocument};
pub use pipeline::llm::{Generation, GenerationRequest, Generator, LlmGenerator};
pub use pipeline::markup::clean_markup;
pub use pipeline::metrics::FontMetrics;
pub use pipeline::report::{compile_report, ReportDocument, REPORT_TITLE};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::{Category, DEFAULT_SYSTEM_PROMPT};
pub use session::{Session, SessionState, UploadOutcome};
