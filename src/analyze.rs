//! Analysis entry points.
//!
//! [`analyze`] is the orchestrator: one generation call per category, results
//! collected in fixed category order, the first failure aborting the batch.
//! [`analyze_document`] runs the whole pipeline (input → extraction →
//! analysis → report) for callers that do not need a [`crate::Session`].

use crate::config::AnalysisConfig;
use crate::error::RaincheckError;
use crate::output::{AnalysisOutput, AnalysisResult, AnalysisStats, SectionResult};
use crate::pipeline::extract::{PdfiumExtractor, ScreenplayText, TextExtractor};
use crate::pipeline::input::{self, UploadedDocument};
use crate::pipeline::llm::{GenerationRequest, Generator, LlmGenerator};
use crate::pipeline::report::{compile_report, ReportDocument};
use crate::prompts::{build_prompt, category_prompt, Category};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Label used in errors from [`ask`].
const ASK_LABEL: &str = "Custom question";

/// Everything produced for one screenplay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    /// Identifier of the analysed document (upload name without extension).
    pub document: String,
    pub analysis: AnalysisOutput,
    pub report: ReportDocument,
}

/// Run the nine category analyses against `screenplay`.
///
/// Calls are independent: each prompt carries the full screenplay text. With
/// the default `concurrency` of 1 they are made one after another; higher
/// values keep up to that many in flight. Either way the result is in fixed
/// category order.
///
/// # Errors
/// [`RaincheckError::GenerationFailed`] for the first category whose call
/// fails. No partial result is returned and categories not yet started are
/// never called.
pub async fn analyze(
    screenplay: &ScreenplayText,
    generator: &dyn Generator,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, RaincheckError> {
    let start = Instant::now();
    let total = Category::ALL.len();
    info!(
        "Starting analysis: {} categories, {} chars of screenplay, concurrency {}",
        total,
        screenplay.len(),
        config.concurrency
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start(total);
    }

    let succeeded = AtomicUsize::new(0);
    let outcome = if config.concurrency <= 1 {
        run_sequential(screenplay, generator, config, &succeeded).await
    } else {
        run_concurrent(screenplay, generator, config, &succeeded).await
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_complete(total, succeeded.load(Ordering::SeqCst));
    }

    let sections = outcome?;
    let stats = AnalysisStats {
        calls: sections.len(),
        total_input_tokens: sections.iter().map(|s| s.input_tokens as u64).sum(),
        total_output_tokens: sections.iter().map(|s| s.output_tokens as u64).sum(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    let result = AnalysisResult::try_from_sections(sections)?;

    info!(
        "Analysis complete: {} calls, {} tokens in / {} out, {}ms",
        stats.calls, stats.total_input_tokens, stats.total_output_tokens, stats.duration_ms
    );

    Ok(AnalysisOutput { result, stats })
}

async fn run_sequential(
    screenplay: &ScreenplayText,
    generator: &dyn Generator,
    config: &AnalysisConfig,
    succeeded: &AtomicUsize,
) -> Result<Vec<SectionResult>, RaincheckError> {
    let mut sections = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        sections.push(analyze_category(screenplay, category, generator, config, succeeded).await?);
    }
    Ok(sections)
}

/// `buffered` yields in input order regardless of completion order, and
/// `try_collect` stops pulling new categories after the first error.
async fn run_concurrent(
    screenplay: &ScreenplayText,
    generator: &dyn Generator,
    config: &AnalysisConfig,
    succeeded: &AtomicUsize,
) -> Result<Vec<SectionResult>, RaincheckError> {
    stream::iter(
        Category::ALL
            .into_iter()
            .map(|category| analyze_category(screenplay, category, generator, config, succeeded)),
    )
    .buffered(config.concurrency)
    .try_collect()
    .await
}

/// One remote call for one category.
async fn analyze_category(
    screenplay: &ScreenplayText,
    category: Category,
    generator: &dyn Generator,
    config: &AnalysisConfig,
    succeeded: &AtomicUsize,
) -> Result<SectionResult, RaincheckError> {
    let total = Category::ALL.len();
    let index = category.position() + 1;
    if let Some(ref cb) = config.progress_callback {
        cb.on_category_start(category, index, total);
    }

    let start = Instant::now();
    let request = GenerationRequest::batch(config, category_prompt(category, screenplay.as_str()));

    match generator.generate(&request).await {
        Ok(generation) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            debug!(
                "{}: {} input tokens, {} output tokens, {}ms",
                category, generation.input_tokens, generation.output_tokens, duration_ms
            );
            succeeded.fetch_add(1, Ordering::SeqCst);
            if let Some(ref cb) = config.progress_callback {
                cb.on_category_complete(category, index, total, generation.content.len());
            }
            Ok(SectionResult {
                category,
                content: generation.content,
                input_tokens: generation.input_tokens,
                output_tokens: generation.output_tokens,
                duration_ms,
            })
        }
        Err(e) => {
            warn!("{}: generation failed — {}", category, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_category_error(category, index, total, &e.to_string());
            }
            Err(RaincheckError::GenerationFailed {
                category: category.label().to_string(),
                source: e,
            })
        }
    }
}

/// Send one free-form instruction about the screenplay.
///
/// Uses the same prompt framing and system prompt as the category analyses,
/// with the larger single-call output limit.
pub async fn ask(
    screenplay: &ScreenplayText,
    instruction: &str,
    generator: &dyn Generator,
    config: &AnalysisConfig,
) -> Result<String, RaincheckError> {
    let request = GenerationRequest::single(config, build_prompt(instruction, screenplay.as_str()));
    generator
        .generate(&request)
        .await
        .map(|g| g.content)
        .map_err(|e| RaincheckError::GenerationFailed {
            category: ASK_LABEL.to_string(),
            source: e,
        })
}

/// Run the full pipeline on a local path or URL.
pub async fn analyze_document(
    input_str: impl AsRef<str>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, RaincheckError> {
    let document = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let generator = LlmGenerator::new(resolve_provider(config)?);
    analyze_upload(document, &generator, config).await
}

/// Run extraction, analysis and compilation on an uploaded document.
pub async fn analyze_upload(
    document: UploadedDocument,
    generator: &dyn Generator,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, RaincheckError> {
    let identifier = document.identifier();
    let file_name = document.report_file_name();

    let extractor = match config.password {
        Some(ref pwd) => PdfiumExtractor::with_password(pwd),
        None => PdfiumExtractor::new(),
    };
    let screenplay = tokio::task::spawn_blocking(move || extractor.extract(&document))
        .await
        .map_err(|e| RaincheckError::Internal(format!("Extraction task panicked: {}", e)))??;

    let analysis = analyze(&screenplay, generator, config).await?;
    let report = compile_report(&analysis.result, file_name, &config.fonts)?;

    Ok(AnalysisReport {
        document: identifier,
        analysis,
        report,
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key (`OPENAI_API_KEY`, …) from the environment.
/// 3. **Environment pair** `RAINCHECK_LLM_PROVIDER` + `RAINCHECK_MODEL`.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, RaincheckError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("RAINCHECK_LLM_PROVIDER"),
        std::env::var("RAINCHECK_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| RaincheckError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, RaincheckError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        RaincheckError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::pipeline::llm::Generation;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every request and answers call N with `"answer #N"`.
    struct EchoGenerator {
        requests: Mutex<Vec<GenerationRequest>>,
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(Generation {
                content: format!("answer #{}", self.requests.lock().unwrap().len()),
                input_tokens: 10,
                output_tokens: 5,
            })
        }
    }

    #[tokio::test]
    async fn sequential_analysis_fills_every_category() {
        let generator = EchoGenerator {
            requests: Mutex::new(Vec::new()),
        };
        let text = ScreenplayText::new("FADE IN:");
        let out = analyze(&text, &generator, &AnalysisConfig::default())
            .await
            .unwrap();

        assert_eq!(out.result.sections().len(), 9);
        assert_eq!(out.result.get(Category::Logline), "answer #1");
        assert_eq!(out.result.get(Category::BoxOfficeCollection), "answer #9");
        assert_eq!(out.stats.calls, 9);
        assert_eq!(out.stats.total_input_tokens, 90);
        assert_eq!(out.stats.total_output_tokens, 45);

        let requests = generator.requests.lock().unwrap();
        assert!(requests.iter().all(|r| r.max_tokens == 1200 && r.temperature == 0.7));
        assert!(requests[0].prompt.starts_with("Write a Hollywood-style logline"));
        // Answers are numbered by call order, which follows category order.
        for (i, (category, body)) in out.result.iter().enumerate() {
            assert_eq!(body, format!("answer #{}", i + 1), "{category}");
        }
    }

    #[tokio::test]
    async fn ask_uses_single_call_limit() {
        let generator = EchoGenerator {
            requests: Mutex::new(Vec::new()),
        };
        let text = ScreenplayText::new("FADE IN:");
        let answer = ask(&text, "Who is the antagonist?", &generator, &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(answer, "answer #1");

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests[0].max_tokens, 1500);
        assert!(requests[0].prompt.starts_with("Who is the antagonist?\n\nScreenplay:"));
    }
}
