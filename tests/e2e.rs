//! End-to-end integration tests for raincheck.
//!
//! These tests use real screenplay PDFs in `./test_cases/`, a local PDFium
//! library and live LLM API calls. They are gated behind the `E2E_ENABLED`
//! environment variable so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture

use raincheck::{
    analyze_document, ask, resolve_provider, AnalysisConfig, Category, LlmGenerator,
    PdfiumExtractor, RaincheckError, ReportFonts, Session, SessionState, TextExtractor,
    UploadedDocument, UploadOutcome,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// DejaVu fonts under `test_cases/fonts`, if present.
fn test_fonts() -> Option<ReportFonts> {
    let dir = test_cases_dir().join("fonts");
    dir.join("DejaVuSans.ttf")
        .is_file()
        .then(|| ReportFonts::dejavu_in(dir))
}

fn load(path: &PathBuf) -> UploadedDocument {
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    UploadedDocument::new(name, std::fs::read(path).unwrap())
}

// ── Extraction (no LLM) ──────────────────────────────────────────────────────

#[test]
fn test_extract_sample_screenplay() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample_screenplay.pdf"));

    let text = PdfiumExtractor::new()
        .extract(&load(&path))
        .expect("extraction should succeed");

    assert!(!text.is_empty(), "sample screenplay has a text layer");
    println!("Extracted {} chars", text.len());
}

#[test]
fn test_extract_rejects_non_pdf() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let doc = UploadedDocument::new("notes.pdf", b"just some notes".to_vec());
    let err = PdfiumExtractor::new().extract(&doc).unwrap_err();
    assert!(matches!(err, RaincheckError::NotAPdf { .. }), "got {err:?}");
}

#[test]
fn test_session_skips_reextraction() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample_screenplay.pdf"));
    let doc = load(&path);
    let extractor = PdfiumExtractor::new();

    let mut session = Session::new();
    assert_eq!(session.upload(&doc, &extractor).unwrap(), UploadOutcome::Extracted);
    assert_eq!(session.upload(&doc, &extractor).unwrap(), UploadOutcome::Unchanged);
    assert_eq!(session.state(), SessionState::TextReady);
    assert_eq!(session.document_id(), Some("sample_screenplay"));
}

// ── Full pipeline (live LLM) ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_full_report() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample_screenplay.pdf"));
    let Some(fonts) = test_fonts() else {
        println!("SKIP — DejaVu fonts not found under test_cases/fonts");
        return;
    };

    let config = AnalysisConfig::builder().fonts(fonts).build().unwrap();
    let out = analyze_document(path.to_str().unwrap(), &config)
        .await
        .expect("analysis should succeed");

    assert_eq!(out.document, "sample_screenplay");
    assert_eq!(out.report.file_name, "sample_screenplay-report.pdf");
    assert_eq!(&out.report.bytes[..4], b"%PDF");
    for (category, body) in out.analysis.result.iter() {
        assert!(!body.trim().is_empty(), "{category} is empty");
    }

    let dest = output_dir().join(&out.report.file_name);
    out.report.write_to(&dest).await.unwrap();
    println!(
        "{} calls, {} tokens in / {} out, {}ms → {}",
        out.analysis.stats.calls,
        out.analysis.stats.total_input_tokens,
        out.analysis.stats.total_output_tokens,
        out.analysis.stats.duration_ms,
        dest.display()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_report_with_dejavu() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample_screenplay.pdf"));
    let Some(fonts) = test_fonts() else {
        println!("SKIP — DejaVu fonts not found under test_cases/fonts");
        return;
    };

    let config = AnalysisConfig::builder()
        .concurrency(3)
        .fonts(fonts)
        .build()
        .unwrap();
    let out = analyze_document(path.to_str().unwrap(), &config)
        .await
        .expect("analysis should succeed");

    let order: Vec<Category> = out.analysis.result.iter().map(|(c, _)| c).collect();
    assert_eq!(order, Category::ALL.to_vec());
    assert!(out.report.page_count >= 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_question() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("sample_screenplay.pdf"));

    let config = AnalysisConfig::default();
    let text = PdfiumExtractor::new().extract(&load(&path)).unwrap();
    let generator = LlmGenerator::new(resolve_provider(&config).expect("provider configured"));

    let answer = ask(&text, "Name the protagonist in one word.", &generator, &config)
        .await
        .expect("question should succeed");
    assert!(!answer.trim().is_empty());
    println!("Answer: {answer}");
}
