//! CLI binary for pdf2notes.
//!
//! A thin shim over the library crate: maps CLI flags to `ConversionConfig`,
//! runs the interactive phase on the terminal, then the conversion.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2notes::{
    execute, prepare, CancelToken, CleanupPolicy, Console, ConversionConfig,
    ConversionProgressCallback, ConversionReport, DisplayWidth, MarkupFormat, OutputDocument,
    OutputFormat, Pdf2NotesError, Preparation, ProgressCallback, SlideFormat, Stage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

/// Terminal progress callback: a spinner naming the current stage and tool,
/// plus one log line per slide batch and per finished document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.set_message("starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: Stage) {
        if stage == Stage::Done {
            self.bar.finish_and_clear();
        } else {
            self.bar.set_prefix(stage.to_string());
        }
    }

    fn on_tool_start(&self, tool: &str) {
        self.bar.set_message(format!("running {tool}"));
    }

    fn on_slides_ready(&self, count: usize) {
        self.bar.println(format!(
            "  {} {} slides rasterized",
            green("✓"),
            bold(&count.to_string())
        ));
    }

    fn on_document_built(&self, output: &OutputDocument) {
        self.bar.println(format!(
            "  {} {} {}",
            green("✓"),
            dim(&format!("{:<4}", output.format)),
            output.path.display()
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Interactive: pick a PDF in the current directory, write <name>.odt next to it
  pdf2notes

  # Decks in another directory, Word and ODT output into ./notes
  pdf2notes --dir ~/talks --format odt --format docx --output-dir notes

  # Smaller images: rasterize at 110 DPI, resize to 800 px, show at 60%
  pdf2notes --density 110 --resize-width 800 --display-width 60%

  # Keep the intermediate markup and images for inspection
  pdf2notes --keep-workdir --verbose

  # Machine-readable summary
  pdf2notes --json > report.json

REQUIRED TOOLS:
  convert    ImageMagick (with Ghostscript for PDF input)
  mogrify    ImageMagick, only with --resize-width
  pandoc     document converter

ENVIRONMENT VARIABLES:
  PDF2NOTES_DIR, PDF2NOTES_OUTPUT_DIR, PDF2NOTES_FORMAT, PDF2NOTES_MARKUP,
  PDF2NOTES_DISPLAY_WIDTH, PDF2NOTES_RESIZE_WIDTH, PDF2NOTES_DENSITY,
  PDF2NOTES_IMAGE_FORMAT, PDF2NOTES_TIMEOUT, PDF2NOTES_VERBOSE, PDF2NOTES_QUIET
  RUST_LOG overrides the log filter.
"#;

/// Convert a slide-deck PDF into an editable notes document.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2notes",
    version,
    about = "Convert a slide-deck PDF into an editable notes document",
    long_about = "Lists the PDF files in a directory, asks which one to convert, and writes a \
document with one table row per slide: the slide image on the left, an empty notes cell on the \
right. Rasterizing is done by ImageMagick, document building by pandoc.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory to list PDF files from.
    #[arg(short, long, env = "PDF2NOTES_DIR", default_value = ".")]
    dir: PathBuf,

    /// Write documents here instead of next to the PDF.
    #[arg(short, long, env = "PDF2NOTES_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Output format; repeat for several (odt, docx, rtf).
    #[arg(
        short,
        long = "format",
        env = "PDF2NOTES_FORMAT",
        value_enum,
        value_delimiter = ',',
        default_value = "odt"
    )]
    formats: Vec<FormatArg>,

    /// Intermediate markup handed to pandoc.
    #[arg(long, env = "PDF2NOTES_MARKUP", value_enum, default_value = "markdown")]
    markup: MarkupArg,

    /// Slide display width in the document: `80%` or `640px`.
    #[arg(long, env = "PDF2NOTES_DISPLAY_WIDTH", default_value = "100%",
          value_parser = parse_display_width)]
    display_width: DisplayWidth,

    /// Resize every slide image to this width in pixels.
    #[arg(long, env = "PDF2NOTES_RESIZE_WIDTH",
          value_parser = clap::value_parser!(u32).range(1..))]
    resize_width: Option<u32>,

    /// Rasterization density in DPI (72–600).
    #[arg(long, env = "PDF2NOTES_DENSITY",
          value_parser = clap::value_parser!(u32).range(72..=600))]
    density: Option<u32>,

    /// Slide image format.
    #[arg(long, env = "PDF2NOTES_IMAGE_FORMAT", value_enum, default_value = "jpg")]
    image_format: ImageArg,

    /// Per-tool timeout in seconds (0 disables).
    #[arg(long, env = "PDF2NOTES_TIMEOUT", default_value_t = 600)]
    timeout: u64,

    /// Keep the working directory even after success.
    #[arg(long, conflicts_with = "remove_workdir")]
    keep_workdir: bool,

    /// Remove the working directory even after failure.
    #[arg(long)]
    remove_workdir: bool,

    /// Print the conversion report as JSON on stdout.
    #[arg(long, env = "PDF2NOTES_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2NOTES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2NOTES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except prompts and errors.
    #[arg(short, long, env = "PDF2NOTES_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Odt,
    Docx,
    Rtf,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Odt => OutputFormat::Odt,
            FormatArg::Docx => OutputFormat::Docx,
            FormatArg::Rtf => OutputFormat::Rtf,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MarkupArg {
    Markdown,
    Html,
}

impl From<MarkupArg> for MarkupFormat {
    fn from(v: MarkupArg) -> Self {
        match v {
            MarkupArg::Markdown => MarkupFormat::Markdown,
            MarkupArg::Html => MarkupFormat::Html,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ImageArg {
    Jpg,
    Png,
}

impl From<ImageArg> for SlideFormat {
    fn from(v: ImageArg) -> Self {
        match v {
            ImageArg::Jpg => SlideFormat::Jpeg,
            ImageArg::Png => SlideFormat::Png,
        }
    }
}

fn parse_display_width(s: &str) -> Result<DisplayWidth, String> {
    s.parse::<DisplayWidth>().map_err(|e| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; library INFO logs
    // would only interleave with it.
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

    let mut config = build_config(&cli)?;

    // ── Interactive phase ────────────────────────────────────────────────
    // Runs before the Ctrl-C handler exists, so an unanswered prompt is
    // interrupted the usual way.
    let mut console = Console::stdio();
    let plan = match prepare(&config, &mut console)? {
        Preparation::Ready(plan) => plan,
        // The guard already logged it; declining is a clean exit.
        Preparation::Declined { .. } => return Ok(()),
    };

    // ── Conversion ───────────────────────────────────────────────────────
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let progress = show_progress.then(CliProgressCallback::new);
    if let Some(ref cb) = progress {
        config.progress_callback = Some(cb.clone() as ProgressCallback);
    }

    let result = execute(&plan, &config, &cancel).await;
    if let Some(ref cb) = progress {
        cb.bar.finish_and_clear();
    }
    let report = result.map_err(|e| {
        let context = failure_context(&e, plan.source.path());
        anyhow::Error::new(e).context(context)
    })?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Top-level error line, with a hint for errors the user can fix by a flag.
fn failure_context(err: &Pdf2NotesError, source: &Path) -> String {
    let mut context = format!("Conversion of {} failed", source.display());
    if let Pdf2NotesError::ToolTimeout { .. } = err {
        context.push_str(" (increase --timeout, or set it to 0 to disable)");
    }
    context
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let cleanup = if cli.keep_workdir {
        CleanupPolicy::RetainAlways
    } else if cli.remove_workdir {
        CleanupPolicy::RemoveAlways
    } else {
        CleanupPolicy::RetainOnFailure
    };

    let mut builder = ConversionConfig::builder()
        .input_dir(&cli.dir)
        .formats(cli.formats.iter().map(|&f| f.into()).collect())
        .markup(cli.markup.into())
        .display_width(cli.display_width)
        .slide_format(cli.image_format.into())
        .tool_timeout_secs(cli.timeout)
        .cleanup(cleanup);

    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(px) = cli.resize_width {
        builder = builder.resize_width(px);
    }
    if let Some(dpi) = cli.density {
        builder = builder.density(dpi);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &ConversionReport) {
    for output in &report.outputs {
        eprintln!(
            "{}  {} slides  {}ms  →  {}",
            green("✔"),
            report.stats.slide_count,
            report.stats.total_duration_ms,
            bold(&output.path.display().to_string()),
        );
    }
    if report.working_dir_retained {
        eprintln!(
            "   {} {}",
            cyan("working files kept in"),
            dim(&report.working_dir.display().to_string())
        );
    }
}
