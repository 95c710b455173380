//! Orchestration: sequence the stages of a conversion run.
//!
//! A run has two phases:
//!
//! 1. [`prepare`]: synchronous and interactive. It will check the external tools,
//!    let the user pick a PDF and clear every planned output with the
//!    overwrite guard. Nothing is written in this phase, so declining an
//!    overwrite leaves the filesystem untouched.
//! 2. [`execute`]: create the working set, rasterize, write the markup and
//!    build each output document, then apply the cleanup policy.
//!
//! [`run_interactive`] chains both; [`convert`] skips the prompts for library
//! callers that already know their source file. Every stage returns a
//! `Result`; nothing here exits the process.

use crate::config::ConversionConfig;
use crate::console::Console;
use crate::error::Pdf2NotesError;
use crate::output::{ConversionReport, ConversionStats, OutputDocument, SlideImage};
use crate::pipeline::binaries::check_binaries;
use crate::pipeline::build::build_document;
use crate::pipeline::guard::{confirm_overwrite, GuardDecision};
use crate::pipeline::input::{select_source, SourceDocument};
use crate::pipeline::markup::write_markup;
use crate::pipeline::process::CancelToken;
use crate::pipeline::rasterize::rasterize;
use crate::progress::{Stage, StageTracker};
use crate::workspace::WorkingSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// A validated source plus the outputs it will produce.
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    pub source: SourceDocument,
    pub outputs: Vec<OutputDocument>,
}

/// Result of the interactive phase.
#[derive(Debug, Clone)]
pub enum Preparation {
    /// All guards passed; ready to execute.
    Ready(ConversionPlan),
    /// The user declined to overwrite `path`. Not an error.
    Declined { path: PathBuf },
}

/// Result of a full interactive run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(ConversionReport),
    /// The user declined to overwrite `path`; nothing was written.
    Declined { path: PathBuf },
}

/// One output per configured format: the source's base name with the
/// format's extension, in the output directory (default: next to the source).
pub fn plan_outputs(source: &Path, config: &ConversionConfig) -> Vec<OutputDocument> {
    let dir = config
        .output_dir
        .clone()
        .unwrap_or_else(|| source.parent().map(Path::to_path_buf).unwrap_or_default());
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "slides".to_string());

    config
        .formats
        .iter()
        .map(|&format| OutputDocument {
            format,
            path: dir.join(format!("{stem}.{}", format.extension())),
        })
        .collect()
}

/// Interactive phase: tools → selection → overwrite guards.
pub fn prepare<R: BufRead, W: Write>(
    config: &ConversionConfig,
    console: &mut Console<R, W>,
) -> Result<Preparation, Pdf2NotesError> {
    let mut stages = StageTracker::new(config.progress_callback.as_ref());

    check_binaries(&config.required_binaries())?;
    stages.advance(Stage::BinariesChecked);

    let source = select_source(&config.input_dir, &config.source_extension, console)?;
    info!("Selected {}", source.path().display());
    stages.advance(Stage::FileSelected);

    // Every guard runs before any expensive work starts.
    let outputs = plan_outputs(source.path(), config);
    for output in &outputs {
        if confirm_overwrite(&output.path, console)? == GuardDecision::Declined {
            return Ok(Preparation::Declined {
                path: output.path.clone(),
            });
        }
    }
    stages.advance(Stage::OutputsGuarded);

    Ok(Preparation::Ready(ConversionPlan { source, outputs }))
}

/// Work phase: rasterize, write markup, build every output.
///
/// The working directory is created here and handled by
/// `config.cleanup` whether the run succeeds or fails.
pub async fn execute(
    plan: &ConversionPlan,
    config: &ConversionConfig,
    cancel: &CancelToken,
) -> Result<ConversionReport, Pdf2NotesError> {
    let total_start = Instant::now();
    let mut stages = StageTracker::resume(Stage::OutputsGuarded, config.progress_callback.as_ref());

    if let Some(ref dir) = config.output_dir {
        std::fs::create_dir_all(dir).map_err(|source| Pdf2NotesError::CreateDirFailed {
            path: dir.clone(),
            source,
        })?;
    }

    let working = WorkingSet::create(&config.temp_root, plan.source.path(), config.markup)?;
    let result = run_stages(plan, &working, config, cancel, &mut stages).await;

    let retained = match working.finish(config.cleanup, result.is_ok()) {
        Ok(retained) => retained,
        Err(e) => {
            warn!("{e}");
            true
        }
    };

    let (slides, mut stats) = result?;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} slides, {} document(s), {}ms total",
        stats.slide_count,
        plan.outputs.len(),
        stats.total_duration_ms
    );

    Ok(ConversionReport {
        source: plan.source.path().to_path_buf(),
        working_dir: working.root().to_path_buf(),
        working_dir_retained: retained,
        markup_path: working.markup_path().to_path_buf(),
        slides,
        outputs: plan.outputs.clone(),
        stats,
    })
}

async fn run_stages(
    plan: &ConversionPlan,
    working: &WorkingSet,
    config: &ConversionConfig,
    cancel: &CancelToken,
    stages: &mut StageTracker<'_>,
) -> Result<(Vec<SlideImage>, ConversionStats), Pdf2NotesError> {
    let mut stats = ConversionStats::default();

    // ── Rasterize ────────────────────────────────────────────────────────
    stages.tool_start(&config.rasterizer.program);
    let raster_start = Instant::now();
    let slides = rasterize(plan.source.path(), working.images_dir(), config, cancel).await?;
    stats.rasterize_duration_ms = raster_start.elapsed().as_millis() as u64;
    stats.slide_count = slides.len();
    stages.advance(Stage::Rasterized);
    stages.slides_ready(slides.len());

    // ── Markup ───────────────────────────────────────────────────────────
    write_markup(working.markup_path(), &slides, config)?;
    stages.advance(Stage::MarkupBuilt);

    // ── Documents ────────────────────────────────────────────────────────
    let build_start = Instant::now();
    for output in &plan.outputs {
        stages.tool_start(&config.converter.program);
        build_document(working.markup_path(), output, config, cancel).await?;
        stages.advance(Stage::DocumentBuilt);
        stages.document_built(output);
    }
    stats.build_duration_ms = build_start.elapsed().as_millis() as u64;

    stages.advance(Stage::Done);
    Ok((slides, stats))
}

/// Interactive run: [`prepare`] followed by [`execute`].
pub async fn run_interactive<R: BufRead, W: Write>(
    config: &ConversionConfig,
    console: &mut Console<R, W>,
    cancel: &CancelToken,
) -> Result<RunOutcome, Pdf2NotesError> {
    match prepare(config, console)? {
        Preparation::Declined { path } => Ok(RunOutcome::Declined { path }),
        Preparation::Ready(plan) => Ok(RunOutcome::Completed(execute(&plan, config, cancel).await?)),
    }
}

/// Convert `source` without prompting.
///
/// Existing output files are replaced; callers that need the overwrite
/// guard should use [`run_interactive`] or call
/// [`confirm_overwrite`](crate::pipeline::guard::confirm_overwrite) themselves.
pub async fn convert(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
    cancel: &CancelToken,
) -> Result<ConversionReport, Pdf2NotesError> {
    let mut stages = StageTracker::new(config.progress_callback.as_ref());

    check_binaries(&config.required_binaries())?;
    stages.advance(Stage::BinariesChecked);

    let source = SourceDocument::open(source.as_ref())?;
    stages.advance(Stage::FileSelected);

    let outputs = plan_outputs(source.path(), config);
    stages.advance(Stage::OutputsGuarded);
    debug_assert_eq!(stages.current(), Stage::OutputsGuarded);

    execute(&ConversionPlan { source, outputs }, config, cancel).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a single-threaded tokio runtime internally.
pub fn convert_sync(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, Pdf2NotesError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Pdf2NotesError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, config, &CancelToken::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputFormat, ToolCommand};

    #[test]
    fn outputs_replace_only_trailing_extension() {
        let config = ConversionConfig::builder()
            .formats(vec![OutputFormat::Odt, OutputFormat::Docx])
            .build()
            .unwrap();
        let outputs = plan_outputs(Path::new("talks/my.pdf.deck.pdf"), &config);
        let paths: Vec<_> = outputs.iter().map(|o| o.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("talks/my.pdf.deck.odt"),
                PathBuf::from("talks/my.pdf.deck.docx"),
            ]
        );
    }

    #[test]
    fn outputs_honour_output_dir() {
        let config = ConversionConfig::builder().output_dir("/out").build().unwrap();
        let outputs = plan_outputs(Path::new("./deck.pdf"), &config);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].path, PathBuf::from("/out/deck.odt"));
        assert_eq!(outputs[0].format, OutputFormat::Odt);
    }

    #[test]
    fn missing_tool_fails_before_prompting() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("deck.pdf"), b"%PDF-1.4").unwrap();
        let config = ConversionConfig::builder()
            .input_dir(tmp.path())
            .rasterizer(ToolCommand::new("pdf2notes-absent-rasterizer"))
            .build()
            .unwrap();
        let mut console = Console::new(&b"0\n"[..], Vec::new());
        let err = prepare(&config, &mut console).unwrap_err();
        assert!(matches!(err, Pdf2NotesError::MissingBinary { .. }));
        assert!(console.into_output().is_empty(), "no menu may be shown");
    }

    #[cfg(unix)]
    #[test]
    fn declined_overwrite_stops_before_work() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("deck.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(tmp.path().join("deck.odt"), b"old").unwrap();
        let config = ConversionConfig::builder()
            .input_dir(tmp.path())
            .rasterizer(ToolCommand::new("sh"))
            .converter(ToolCommand::new("sh"))
            .build()
            .unwrap();
        let mut console = Console::new(&b"0\nno\n"[..], Vec::new());
        match prepare(&config, &mut console).unwrap() {
            Preparation::Declined { path } => assert!(path.ends_with("deck.odt")),
            other => panic!("expected Declined, got {other:?}"),
        }
        assert_eq!(std::fs::read(tmp.path().join("deck.odt")).unwrap(), b"old");
    }

    #[cfg(unix)]
    #[test]
    fn all_guards_run_before_work() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("deck.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(tmp.path().join("deck.odt"), b"old").unwrap();
        std::fs::write(tmp.path().join("deck.docx"), b"old").unwrap();
        let config = ConversionConfig::builder()
            .input_dir(tmp.path())
            .formats(vec![OutputFormat::Odt, OutputFormat::Docx])
            .rasterizer(ToolCommand::new("sh"))
            .converter(ToolCommand::new("sh"))
            .build()
            .unwrap();
        let mut console = Console::new(&b"0\nyes\nyes\n"[..], Vec::new());
        match prepare(&config, &mut console).unwrap() {
            Preparation::Ready(plan) => assert_eq!(plan.outputs.len(), 2),
            other => panic!("expected Ready, got {other:?}"),
        }
        let printed = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(printed.matches("already exists").count(), 2);
    }
}
