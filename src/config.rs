//! Configuration types for screenplay analysis.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. The defaults reproduce the reference report:
//! `gpt-4o-mini`, temperature 0.7, 1 200 output tokens per category, one call
//! at a time, DejaVuSans from the working directory.

use crate::error::RaincheckError;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for a screenplay analysis and its report.
///
/// # Example
/// ```rust
/// use raincheck::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gpt-4o-mini")
///     .concurrency(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 1200);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// LLM model identifier. If None, [`DEFAULT_MODEL`] is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Analyses are creative writing tasks; the same screenplay submitted
    /// twice yields different wording.
    pub temperature: f32,

    /// Maximum output tokens per category call. Default: 1200.
    pub max_tokens: usize,

    /// Maximum output tokens for a one-off [`crate::ask`] call. Default: 1500.
    pub single_call_max_tokens: usize,

    /// Custom system prompt. If None, uses [`DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Number of category calls in flight at once. Default: 1.
    ///
    /// The nine calls share no state, so they may be fanned out. Results are
    /// always reassembled in fixed category order and the first failure still
    /// aborts the batch.
    pub concurrency: usize,

    /// PDF user password for encrypted screenplays.
    pub password: Option<String>,

    /// Fonts used to typeset the report. Default: the DejaVu pair in the
    /// working directory.
    pub fonts: ReportFonts,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-category progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.7,
            max_tokens: 1200,
            single_call_max_tokens: 1500,
            system_prompt: None,
            concurrency: 1,
            password: None,
            fonts: ReportFonts::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("single_call_max_tokens", &self.single_call_max_tokens)
            .field("concurrency", &self.concurrency)
            .field("fonts", &self.fonts)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model id that will be requested.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// The system prompt that will be sent with every call.
    pub fn system_prompt_or_default(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn single_call_max_tokens(mut self, n: usize) -> Self {
        self.config.single_call_max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn fonts(mut self, fonts: ReportFonts) -> Self {
        self.config.fonts = fonts;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, RaincheckError> {
        let c = &self.config;
        if c.max_tokens == 0 || c.single_call_max_tokens == 0 {
            return Err(RaincheckError::InvalidConfig(
                "max tokens must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(RaincheckError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// File name of the regular DejaVu face.
pub const DEJAVU_REGULAR: &str = "DejaVuSans.ttf";
/// File name of the bold DejaVu face.
pub const DEJAVU_BOLD: &str = "DejaVuSans-Bold.ttf";

/// Fonts used to typeset the PDF report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFonts {
    /// Helvetica and Helvetica-Bold from the PDF base-14 set.
    ///
    /// Nothing to embed, but limited to WinAnsi: a report whose text needs
    /// any other character fails with `UnsupportedCharacter`.
    Builtin,
    /// TrueType files embedded into the report. Both files must exist when
    /// the report is built.
    Files { regular: PathBuf, bold: PathBuf },
}

/// `DejaVuSans.ttf` and `DejaVuSans-Bold.ttf` in the working directory.
impl Default for ReportFonts {
    fn default() -> Self {
        ReportFonts::Files {
            regular: PathBuf::from(DEJAVU_REGULAR),
            bold: PathBuf::from(DEJAVU_BOLD),
        }
    }
}

impl ReportFonts {
    /// The DejaVu pair looked up in `dir`.
    pub fn dejavu_in(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        ReportFonts::Files {
            regular: dir.join(DEJAVU_REGULAR),
            bold: dir.join(DEJAVU_BOLD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_report() {
        let c = AnalysisConfig::default();
        assert_eq!(c.temperature, 0.7);
        assert_eq!(c.max_tokens, 1200);
        assert_eq!(c.single_call_max_tokens, 1500);
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.model_or_default(), "gpt-4o-mini");
        assert_eq!(c.system_prompt_or_default(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(
            c.fonts,
            ReportFonts::Files {
                regular: PathBuf::from("DejaVuSans.ttf"),
                bold: PathBuf::from("DejaVuSans-Bold.ttf"),
            }
        );
    }

    #[test]
    fn builder_clamps_values() {
        let c = AnalysisConfig::builder()
            .temperature(5.0)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let err = AnalysisConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, RaincheckError::InvalidConfig(_)));
    }

    #[test]
    fn dejavu_pair_paths() {
        let fonts = ReportFonts::dejavu_in("/fonts");
        assert_eq!(
            fonts,
            ReportFonts::Files {
                regular: PathBuf::from("/fonts/DejaVuSans.ttf"),
                bold: PathBuf::from("/fonts/DejaVuSans-Bold.ttf"),
            }
        );
    }
}
