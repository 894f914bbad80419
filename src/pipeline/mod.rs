//! Pipeline stages for screenplay analysis.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and swapped behind its trait seam.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm (×9) ──▶ markup ──▶ layout ──▶ report
//! (path/URL) (pdfium)   (provider)   (cleanup)  (A4 lines)  (printpdf)
//! ```
//!
//! 1. [`input`]   — read a local file or download a URL into an upload
//! 2. [`extract`] — concatenate page text; blocking, since pdfium is not
//!    async-safe
//! 3. [`llm`]     — one completion per prompt; the only stage with network I/O
//! 4. [`markup`]  — strip emphasis, heading and code markers from responses
//! 5. [`layout`]  — wrap and paginate the cleaned sections, measured with
//!    [`metrics`]
//! 6. [`report`]  — write the layout as a PDF document

pub mod extract;
pub mod input;
pub mod layout;
pub mod llm;
pub mod markup;
pub mod metrics;
pub mod report;
