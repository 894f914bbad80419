//! CLI binary for raincheck.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, drives a `Session` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use raincheck::pipeline::input::{document_identifier, report_file_name};
use raincheck::{
    ask, compile_report, resolve_input, resolve_provider, AnalysisConfig, AnalysisProgressCallback,
    AnalysisResult, Category, LlmGenerator, PdfiumExtractor, ProgressCallback, ReportFonts,
    Session,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: one bar for the batch, one log line per
/// category. Works when categories finish out of order (`--concurrency`).
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading screenplay…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>2}/{len} sections  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Analysing");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        let ms = self
            .start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        ms as f64 / 1000.0
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, total: usize) {
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Analysing screenplay: {total} sections…"))
        ));
    }

    fn on_category_start(&self, category: Category, index: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(category.label());
    }

    fn on_category_complete(&self, category: Category, index: usize, total: usize, response_len: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>1}/{:<1}  {:<22}  {:<8}  {}",
            green("✓"),
            index,
            total,
            category.label(),
            dim(&format!("{response_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_category_error(&self, category: Category, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(index);
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>1}/{:<1}  {:<22}  {}  {}",
            red("✗"),
            index,
            total,
            category.label(),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_analysis_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        if success_count == total {
            eprintln!("{} {} sections analysed", green("✔"), bold(&total.to_string()));
        } else {
            eprintln!(
                "{} analysis aborted after {}/{} sections",
                red("✘"),
                bold(&success_count.to_string()),
                total,
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a screenplay; writes Alpha-report.pdf next to the current dir
  raincheck Alpha.pdf

  # Choose the report path
  raincheck Alpha.pdf -o reports/alpha.pdf

  # Up to three analyses in flight at once
  raincheck --concurrency 3 Alpha.pdf

  # Ask one free-form question instead of producing a report
  raincheck --ask "Who is the antagonist and what do they want?" Alpha.pdf

  # Print the extracted text only (no API key needed)
  raincheck --text-only Alpha.pdf

  # Save the analysis as JSON, then rebuild the PDF later without API calls
  raincheck --json Alpha.pdf > alpha.json
  raincheck --from-json alpha.json -o Alpha-report.pdf

  # Reports need DejaVuSans.ttf and DejaVuSans-Bold.ttf, by default in the
  # current directory; point elsewhere with --font-dir
  raincheck --font-dir /usr/share/fonts/truetype/dejavu Alpha.pdf

  # Base-14 Helvetica instead (WinAnsi text only; other characters are errors)
  raincheck --builtin-fonts Alpha.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  RAINCHECK_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  RAINCHECK_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to the libpdfium shared library
"#;

/// Analyse screenplay PDFs and produce a producer's report.
#[derive(Parser, Debug)]
#[command(
    name = "raincheck",
    version,
    about = "Analyse screenplay PDFs and produce a producer's report",
    long_about = "Extract the text of a screenplay PDF (local file or URL), ask an LLM nine \
fixed questions about it (logline, genre, keywords, location, synopsis, script score, plot \
assessment, character profiles, box office) and typeset the answers into a PDF report.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL (a JSON analysis with --from-json).
    input: String,

    /// Report path. Default: `<name>-report.pdf` in the current directory.
    #[arg(short, long, env = "RAINCHECK_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID. Default: gpt-4o-mini.
    #[arg(long, env = "RAINCHECK_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "RAINCHECK_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Number of analyses in flight at once.
    #[arg(short, long, env = "RAINCHECK_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// PDF user password for encrypted screenplays.
    #[arg(long, env = "RAINCHECK_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "RAINCHECK_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens per section.
    #[arg(long, env = "RAINCHECK_MAX_TOKENS", default_value_t = 1200)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RAINCHECK_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Directory holding DejaVuSans.ttf and DejaVuSans-Bold.ttf. Default: current directory.
    #[arg(long, env = "RAINCHECK_FONT_DIR")]
    font_dir: Option<PathBuf>,

    /// Typeset with built-in Helvetica; fails on characters outside WinAnsi.
    #[arg(long, conflicts_with = "font_dir")]
    builtin_fonts: bool,

    /// Ask a single free-form question about the screenplay.
    #[arg(long, conflicts_with_all = ["text_only", "from_json"])]
    ask: Option<String>,

    /// Print the extracted screenplay text and exit.
    #[arg(long, conflicts_with = "from_json")]
    text_only: bool,

    /// Treat INPUT as a saved JSON analysis and only compile the report.
    #[arg(long)]
    from_json: bool,

    /// Print the analysis as JSON instead of the readable summary.
    #[arg(long, env = "RAINCHECK_JSON")]
    json: bool,

    /// Skip writing the PDF report.
    #[arg(long)]
    no_report: bool,

    /// Disable progress bar.
    #[arg(long, env = "RAINCHECK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RAINCHECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "RAINCHECK_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RAINCHECK_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && cli.ask.is_none() && !cli.text_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Report-only mode ─────────────────────────────────────────────────
    if cli.from_json {
        let raw = tokio::fs::read_to_string(&cli.input)
            .await
            .with_context(|| format!("Failed to read {}", cli.input))?;
        let result: AnalysisResult =
            serde_json::from_str(&raw).context("Not a complete analysis")?;
        let identifier = document_identifier(&cli.input);
        let fonts = report_fonts(&cli);
        let report = compile_report(&result, report_file_name(&identifier), &fonts)
            .context("Report compilation failed")?;
        let path = output_path(&cli, &report.file_name);
        report.write_to(&path).await.context("Failed to write report")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} pages  →  {}",
                green("✔"),
                report.page_count,
                bold(&path.display().to_string())
            );
        }
        return Ok(());
    }

    // ── Extraction ───────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    let document = resolve_input(&cli.input, config.download_timeout_secs)
        .await
        .context("Failed to load screenplay")?;
    let extractor = match config.password {
        Some(ref pwd) => PdfiumExtractor::with_password(pwd),
        None => PdfiumExtractor::new(),
    };

    let mut session = Session::new();
    // pdfium is blocking; keep the executor responsive.
    tokio::task::block_in_place(|| session.upload(&document, &extractor))
        .context("Text extraction failed")?;
    let screenplay = session
        .screenplay()
        .cloned()
        .context("No screenplay text after upload")?;

    if cli.text_only {
        let mut out = io::stdout().lock();
        out.write_all(screenplay.as_str().as_bytes())
            .context("Failed to write to stdout")?;
        if !screenplay.as_str().ends_with('\n') {
            out.write_all(b"\n").ok();
        }
        return Ok(());
    }

    let generator = LlmGenerator::new(resolve_provider(&config).context("No LLM provider")?);

    // ── Single question ──────────────────────────────────────────────────
    if let Some(ref question) = cli.ask {
        let answer = ask(&screenplay, question, &generator, &config)
            .await
            .context("Question failed")?;
        println!("{}", answer.trim_end());
        return Ok(());
    }

    // ── Full analysis ────────────────────────────────────────────────────
    let ready = session
        .generate_report(&generator, &config)
        .await
        .context("Analysis failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&ready.analysis.result)
            .context("Failed to serialise analysis")?;
        println!("{json}");
    } else {
        print_results(&ready.analysis.result);
    }

    if !cli.no_report {
        let path = output_path(&cli, &ready.report.file_name);
        ready
            .report
            .write_to(&path)
            .await
            .context("Failed to write report")?;
        if !cli.quiet {
            let stats = &ready.analysis.stats;
            eprintln!(
                "{}  {} pages  {}ms  →  {}",
                green("✔"),
                ready.report.page_count,
                stats.duration_ms,
                bold(&path.display().to_string()),
            );
            eprintln!(
                "   {} tokens in  /  {} tokens out",
                dim(&stats.total_input_tokens.to_string()),
                dim(&stats.total_output_tokens.to_string()),
            );
        }
    }

    Ok(())
}

/// Print the readable summary: a bold header, then one bold label per section.
fn print_results(result: &AnalysisResult) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = writeln!(out, "{}\n", bold("Analysis Results"));
    for section in result.sections() {
        let _ = writeln!(out, "{}", bold(&format!("{}:", section.category.label())));
        let _ = writeln!(out, "{}\n", section.cleaned());
    }
}

fn output_path(cli: &Cli, default_name: &str) -> PathBuf {
    cli.output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_name))
}

fn report_fonts(cli: &Cli) -> ReportFonts {
    if cli.builtin_fonts {
        return ReportFonts::Builtin;
    }
    match cli.font_dir {
        Some(ref dir) => ReportFonts::dejavu_in(dir),
        None => ReportFonts::default(),
    }
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = AnalysisConfig::builder()
        .concurrency(cli.concurrency)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .fonts(report_fonts(cli))
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("raincheck").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn fonts_default_to_dejavu_in_working_dir() {
        if std::env::var_os("RAINCHECK_FONT_DIR").is_some() {
            return;
        }
        assert_eq!(report_fonts(&parse(&["Alpha.pdf"])), ReportFonts::default());
    }

    #[test]
    fn builtin_fonts_flag_and_font_dir() {
        assert_eq!(
            report_fonts(&parse(&["--builtin-fonts", "Alpha.pdf"])),
            ReportFonts::Builtin
        );
        assert_eq!(
            report_fonts(&parse(&["--font-dir", "/fonts", "Alpha.pdf"])),
            ReportFonts::dejavu_in("/fonts")
        );
        assert!(Cli::try_parse_from(["raincheck", "--builtin-fonts", "--font-dir", "/f", "A.pdf"]).is_err());
    }

    #[test]
    fn progress_callback_survives_a_failed_category() {
        let cb = CliProgressCallback::new();
        cb.bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        cb.on_analysis_start(9);
        cb.on_category_start(Category::Logline, 1, 9);
        cb.on_category_error(Category::Logline, 1, 9, &"x".repeat(200));
        assert_eq!(cb.bar.position(), 1);
        assert!(cb.start_times.lock().unwrap().is_empty());
        cb.on_analysis_complete(9, 0);
    }
}
