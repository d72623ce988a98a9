//! CLI binary for edgequake-doc2text.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `IngestConfig`, prints the extracted text and optionally runs the
//! resume ⇄ job-description analysis.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_doc2text::{
    extract, pipeline::input::resolve_input, refine, AnalysisReport, Event,
    ExtractionProgressCallback, IngestConfig, LlmAnalyzer, PipelineStep, ProgressCallback,
    RefinementOptions, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner for the pipeline steps that turns into a page bar once a page
/// document reports its page count.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(SPINNER_TICKS),
        );
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn activate_page_bar(&self, total: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(SPINNER_TICKS),
        );
        self.bar.set_length(total as u64);
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_step(&self, step: &PipelineStep) {
        match *step {
            PipelineStep::ParsingPage { current, total } => {
                if current == 1 {
                    self.activate_page_bar(total);
                }
                self.bar.set_position(current as u64);
                self.bar.set_message(String::new());
            }
            PipelineStep::Success => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", green("✔"), step);
            }
            _ => self.bar.set_message(step.to_string()),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a resume to stdout
  doc2text resume.pdf

  # Extract, then apply every refinement stage
  doc2text --refine --remove-special-chars resume.docx

  # Plain text served without a useful Content-Type
  doc2text --media-type text/plain https://example.com/cv

  # Score the resume against a job description
  doc2text resume.pdf --analyze --job job.txt

  # JSON output (text + stats, and the report with --analyze)
  doc2text --json resume.pdf > out.json

SUPPORTED FORMATS:
  Plain text   text/plain                                                   .txt
  Word         application/vnd.openxmlformats-officedocument.wordprocessingml.document  .docx
  PDF          application/pdf                                              .pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (analysis only)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (PDF inputs only)
"#;

/// Extract clean text from resumes and score them against job descriptions.
#[derive(Parser, Debug)]
#[command(
    name = "doc2text",
    version,
    about = "Extract clean text from PDF, DOCX and plain-text resumes",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL.
    input: String,

    /// Declared media type; overrides what the file name or server says.
    #[arg(long, env = "DOC2TEXT_MEDIA_TYPE")]
    media_type: Option<String>,

    /// Apply refinement after extraction.
    #[arg(long, env = "DOC2TEXT_REFINE")]
    refine: bool,

    /// Refinement: do not normalise blank lines and spacing.
    #[arg(long)]
    no_normalize_spacing: bool,

    /// Refinement: delete characters outside letters, digits and common punctuation.
    #[arg(long)]
    remove_special_chars: bool,

    /// Refinement: keep control characters and bullet glyphs.
    #[arg(long)]
    no_strip_formatting: bool,

    /// Output structured JSON instead of plain text.
    #[arg(long, env = "DOC2TEXT_JSON")]
    json: bool,

    /// Score the extracted text against the job description in --job.
    #[arg(long, requires = "job")]
    analyze: bool,

    /// File holding the job description.
    #[arg(long, env = "DOC2TEXT_JOB")]
    job: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOC2TEXT_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// LLM model ID for --analyze.
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider for --analyze: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Largest accepted document in bytes.
    #[arg(long, env = "DOC2TEXT_MAX_BYTES", default_value_t = 25 * 1024 * 1024)]
    max_bytes: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOC2TEXT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Analysis call timeout in seconds.
    #[arg(long, env = "DOC2TEXT_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Disable progress display.
    #[arg(long, env = "DOC2TEXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2TEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2TEXT_QUIET")]
    quiet: bool,
}

impl Cli {
    fn refinement(&self) -> RefinementOptions {
        RefinementOptions {
            normalize_spacing: !self.no_normalize_spacing,
            remove_special_chars: self.remove_special_chars,
            strip_unwanted_formatting: !self.no_strip_formatting,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Extract ──────────────────────────────────────────────────────────
    let mut document = resolve_input(&cli.input, &config)
        .await
        .with_context(|| format!("Failed to open {}", cli.input))?;
    if let Some(ref media_type) = cli.media_type {
        document = document.with_media_type(media_type.clone());
    }

    let mut output = match extract(document, &config).await {
        Ok(output) => output,
        Err(e) => {
            let failure = edgequake_doc2text::Failure::from(&e);
            eprintln!("{} {}", red("✘"), bold(failure.title()));
            return Err(e).context("Extraction failed");
        }
    };

    if cli.refine {
        output.text = refine(&output.text, &config.refinement);
    }

    // ── Analyse ──────────────────────────────────────────────────────────
    let report = if cli.analyze {
        let job_path = match cli.job {
            Some(ref p) => p,
            None => bail!("--analyze requires --job <FILE>"),
        };
        let job = tokio::fs::read_to_string(job_path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", job_path))?;
        Some(run_analysis(&config, &output.text, job, show_progress).await?)
    } else {
        None
    };

    // ── Print ────────────────────────────────────────────────────────────
    if cli.json {
        let value = match report {
            Some(ref report) => serde_json::json!({ "extraction": output, "analysis": report }),
            None => serde_json::to_value(&output).context("Failed to serialise output")?,
        };
        let json = serde_json::to_string_pretty(&value).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    match report {
        Some(ref report) => print_report(report),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(output.text.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet {
        eprintln!(
            "{}  {}  {}  {}",
            dim(&output.file_name),
            dim(&output.format.to_string()),
            dim(&format!("{} chars", output.stats.sanitized_chars)),
            dim(&format!("{}ms", output.stats.total_duration_ms)),
        );
    }

    Ok(())
}

/// Map CLI args to `IngestConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<IngestConfig> {
    let mut builder = IngestConfig::builder()
        .max_file_bytes(cli.max_bytes)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout)
        .refinement(cli.refinement());

    if let Some(ref pwd) = cli.password {
        builder = builder.pdf_password(pwd.clone());
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(path.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Run one analysis through a [`Session`], showing the phase ticker.
async fn run_analysis(
    config: &IngestConfig,
    resume_text: &str,
    job_description: String,
    show_progress: bool,
) -> Result<AnalysisReport> {
    let analyzer = LlmAnalyzer::from_config(config).context("Analysis provider unavailable")?;
    let mut session = Session::new(config.clone(), analyzer);

    session.dispatch(Event::ResumeTextEdited(resume_text.to_string()));
    session.dispatch(Event::JobDescriptionEdited(job_description));
    session.dispatch(Event::AnalysisRequested);

    let spinner = show_progress.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.magenta} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(SPINNER_TICKS),
        );
        bar.set_prefix("Analysing");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    loop {
        let state = session.state();
        if let Some(ref bar) = spinner {
            bar.set_message(state.ticker.label().to_string());
        }
        if !state.is_analyzing() {
            break;
        }
        session.next_event().await;
    }
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let state = session.state();
    if let Some(report) = state.report() {
        return Ok(report.clone());
    }
    match state.error {
        Some(ref failure) => {
            eprintln!("{} {}", red("✘"), bold(failure.title()));
            bail!("{}", failure.message)
        }
        None => bail!("Analysis ended without a result"),
    }
}

fn print_report(report: &AnalysisReport) {
    println!("{} {:.0}/100", bold("ATS score:"), report.ats_score);
    let b = &report.breakdown;
    println!(
        "  skills {:.0}  keywords {:.0}  experience {:.0}  format {:.0}  grammar {:.0}",
        b.skills, b.keywords, b.experience, b.format, b.grammar
    );
    println!();
    println!("{}", report.summary);

    let section = |title: &str, items: &[String]| {
        if items.is_empty() {
            return;
        }
        println!();
        println!("{}", bold(title));
        for item in items {
            println!("  - {item}");
        }
    };
    section("Matching skills", &report.matching_skills);
    section("Missing skills", &report.missing_skills);
    section("Recommendations", &report.recommendations);
    section("Suggested roles", &report.suggested_job_roles);

    if !report.radar_metrics.is_empty() {
        println!();
        println!("{}", bold("Profile"));
        for m in &report.radar_metrics {
            println!("  {:<22} {:>3.0}/{:.0}", m.subject, m.a, m.full_mark);
        }
    }
}
